//! Consumes [`crate::matcher::Matcher`] output and ties the trie into the
//! rest of the outliner's round-one/round-two bookkeeping (spec §4.4).

use tracing::trace;

use crate::hash::{HashOracle, HashSequence, StableHash};
use crate::matcher::Matcher;
use crate::mode::HashTreeMode;
use crate::trie::HashTrie;

/// One outlining candidate: a matched slice plus the two flags this crate
/// is responsible for setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub start_index: usize,
    pub length: usize,
    /// This sequence is known to be outlined elsewhere, so the marginal
    /// cost of outlining here excludes the residual stub cost.
    pub no_residual_code_cost: bool,
    /// This candidate exists exactly once in the current module but
    /// matches the global trie.
    pub singleton: bool,
}

/// The target's verdict on a set of candidates sharing one instruction
/// sequence. An empty `candidates` list means "rejected" — callers must
/// check `is_empty()`, not assume the callback always accepts (spec §6).
#[derive(Debug, Clone, Default)]
pub struct OutlinedFunction {
    pub candidates: Vec<Candidate>,
    pub sequence: HashSequence,
}

/// The target-specific outlining cost model, consulted once per matched
/// slice. External collaborator (spec §1/§6): this crate never second-
/// guesses its verdict.
pub trait CostModel {
    fn outlining_candidate_info(&self, candidates: &[Candidate]) -> OutlinedFunction;
}

impl<F> CostModel for F
where
    F: Fn(&[Candidate]) -> OutlinedFunction,
{
    fn outlining_candidate_info(&self, candidates: &[Candidate]) -> OutlinedFunction {
        self(candidates)
    }
}

/// Records a round-one locally-profitable sequence into `trie`.
pub fn record_local_outlining(trie: &mut HashTrie, sequence: &[StableHash]) {
    trie.insert(sequence);
}

/// Round-two augmentation: scans `instr_list` against `trie` for singleton
/// matches, consults `cost_model` for each, and appends accepted records
/// to `function_list`.
pub fn augment_round_two<I, O, C>(
    instr_list: &[I],
    invalid_mask: &[usize],
    oracle: &O,
    trie: &HashTrie,
    cost_model: &C,
    function_list: &mut Vec<OutlinedFunction>,
) where
    O: HashOracle<I>,
    C: CostModel,
{
    let matcher = Matcher::new(trie);
    let matches = matcher.find_matches(instr_list, invalid_mask, oracle);
    trace!(matches = matches.len(), "round two matcher pass complete");

    for matched in matches {
        let candidate = Candidate {
            start_index: matched.start_index,
            length: matched.length,
            no_residual_code_cost: false,
            singleton: false,
        };
        let mut outlined = cost_model.outlining_candidate_info(std::slice::from_ref(&candidate));
        if outlined.candidates.is_empty() {
            continue;
        }
        for c in &mut outlined.candidates {
            c.no_residual_code_cost = true;
            c.singleton = true;
        }
        outlined.sequence = (matched.start_index..matched.start_index + matched.length)
            .map(|i| oracle.stable_hash(&instr_list[i]))
            .collect();
        function_list.push(outlined);
    }
}

/// For an already-detected repeated sequence within a module, consults
/// `trie` to decide whether its residual code cost can be zeroed. Mirrors
/// the original `getResidualCodeCosts`: it only computes anything when
/// `mode` is `Writing` or `Reading` and `candidates_for_repeated_seq` is
/// non-empty; otherwise returns `(false, false, vec![])` unconditionally.
///
/// Returns `(no_residual_code_cost, override_threshold, sequence)`: when
/// `no_residual_code_cost` is set and the candidate group has exactly one
/// member, `override_threshold` permits outlining despite the standard
/// local-frequency threshold.
pub fn residual_cost<I, O>(
    mode: HashTreeMode,
    candidates_for_repeated_seq: &[Candidate],
    instr_list: &[I],
    oracle: &O,
    trie: &HashTrie,
) -> (bool, bool, HashSequence)
where
    O: HashOracle<I>,
{
    let mut no_residual_code_cost = false;
    let mut sequence = HashSequence::new();

    if matches!(mode, HashTreeMode::Writing | HashTreeMode::Reading)
        && !candidates_for_repeated_seq.is_empty()
    {
        let first = &candidates_for_repeated_seq[0];
        sequence = (first.start_index..first.start_index + first.length)
            .map(|i| oracle.stable_hash(&instr_list[i]))
            .collect();
        if mode == HashTreeMode::Reading && trie.find(&sequence) {
            no_residual_code_cost = true;
        }
    }

    let override_threshold = no_residual_code_cost && candidates_for_repeated_seq.len() == 1;
    (no_residual_code_cost, override_threshold, sequence)
}
