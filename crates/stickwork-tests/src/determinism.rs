//! Determinism harness.
//!
//! Runs a generation closure several times and compares the BLAKE3 hash of
//! each run's JSON rendering.

use std::fmt;

use serde_json::Value;

/// Result of a determinism verification.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    pub runs: usize,
    /// Hash of the first run.
    pub hash: String,
    /// First run whose hash differed, with its hash.
    pub mismatch: Option<(usize, String)>,
}

impl fmt::Display for DeterminismResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mismatch {
            None => write!(f, "{} runs, hash {}", self.runs, self.hash),
            Some((run, hash)) => write!(
                f,
                "run {} hashed {} but run 0 hashed {}",
                run, hash, self.hash
            ),
        }
    }
}

impl DeterminismResult {
    /// Panic with a detailed message if not deterministic.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!("Non-deterministic output detected: {}", self);
        }
    }
}

/// BLAKE3 hex digest of a JSON value's compact rendering.
pub fn hash_json(value: &Value) -> String {
    blake3::hash(value.to_string().as_bytes()).to_hex().to_string()
}

/// Run `generate` `runs` times and verify every output hashes the same.
pub fn verify_determinism<F>(generate: F, runs: usize) -> DeterminismResult
where
    F: Fn() -> Value,
{
    assert!(runs >= 2, "Need at least 2 runs to verify determinism");

    let hash = hash_json(&generate());
    for run in 1..runs {
        let other = hash_json(&generate());
        if other != hash {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                hash,
                mismatch: Some((run, other)),
            };
        }
    }

    DeterminismResult {
        is_deterministic: true,
        runs,
        hash,
        mismatch: None,
    }
}

/// Generates a `#[test]` asserting that `$body` renders identically across runs.
#[macro_export]
macro_rules! test_determinism {
    ($name:ident, $body:expr) => {
        #[test]
        fn $name() {
            let result = $crate::determinism::verify_determinism(|| $body, 3);
            result.assert_deterministic();
        }
    };
}
