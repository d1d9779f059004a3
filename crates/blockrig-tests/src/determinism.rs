//! Determinism checks for normalization and planning.
//!
//! Reconciliation must be a pure function of its inputs: the same spec and
//! the same live state always produce the same operations in the same
//! order. These helpers run a pipeline several times and compare the
//! serialized output byte by byte.

use std::fmt;

use blockrig_spec::{normalize, plan_state, ExistingState, ModelSpec, PlanMode};

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    /// Number of runs performed.
    pub runs: usize,
    /// BLAKE3 hash of the first run's output.
    pub hash: String,
    /// First difference found, if any.
    pub diff: Option<Divergence>,
}

/// Where a run first diverged from the reference run.
#[derive(Debug, Clone)]
pub struct Divergence {
    /// Which run (0-indexed) differed.
    pub run_index: usize,
    /// Byte offset of the first difference.
    pub offset: usize,
    /// Up to 32 bytes of the reference output around the offset.
    pub expected: String,
    /// The same window of the differing output.
    pub actual: String,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} differs at byte {}:\n  expected: {}\n  actual:   {}",
            self.run_index, self.offset, self.expected, self.actual
        )
    }
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if let Some(diff) = &self.diff {
            panic!(
                "Non-deterministic output detected!\nRuns: {}\nHash: {}\n{}",
                self.runs, self.hash, diff
            );
        }
    }
}

/// BLAKE3 hex digest of a byte slice.
pub fn compute_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Runs `produce` `runs` times and compares every output to the first.
pub fn verify_determinism<F, O>(produce: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> O,
    O: AsRef<[u8]>,
{
    assert!(runs >= 2, "Must run at least 2 times to verify determinism");

    let reference = produce();
    let reference = reference.as_ref();
    let hash = compute_hash(reference);

    for run_index in 1..runs {
        let output = produce();
        let output = output.as_ref();
        if let Some(offset) = first_difference(reference, output) {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                hash,
                diff: Some(Divergence {
                    run_index,
                    offset,
                    expected: window(reference, offset),
                    actual: window(output, offset),
                }),
            };
        }
    }

    DeterminismResult {
        is_deterministic: true,
        runs,
        hash,
        diff: None,
    }
}

/// Normalizes and plans `runs` times, comparing the serialized plans.
pub fn verify_plan_determinism(
    spec: &ModelSpec,
    existing: &ExistingState,
    mode: PlanMode,
    runs: usize,
) -> DeterminismResult {
    verify_determinism(
        || {
            let outcome = normalize(spec, 4096)
                .and_then(|model| plan_state(&model, existing, mode, true));
            match outcome {
                Ok(plan) => serde_json::to_vec(&plan).unwrap_or_default(),
                Err(error) => error.to_string().into_bytes(),
            }
        },
        runs,
    )
}

fn first_difference(expected: &[u8], actual: &[u8]) -> Option<usize> {
    expected
        .iter()
        .zip(actual.iter())
        .position(|(e, a)| e != a)
        .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))
}

fn window(data: &[u8], offset: usize) -> String {
    let start = offset.saturating_sub(16);
    let end = (offset + 16).min(data.len());
    String::from_utf8_lossy(&data[start.min(end)..end]).into_owned()
}
