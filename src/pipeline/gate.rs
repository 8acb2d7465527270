//! Size gate: decide from the upload's byte length whether to resize at all.
//!
//! The check is on encoded size, not pixel count. A small but poorly
//! compressed image can pass the gate, and a huge but well compressed one
//! can be skipped.

use tracing::debug;

/// Outcome of the size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Below the threshold: the invocation ends with no side effects.
    Skip,
    /// At or above the threshold: continue to decode and resize.
    Proceed,
}

/// Compare `len` against `threshold`. Equal lengths proceed.
pub fn check(len: u64, threshold: u64) -> GateDecision {
    let decision = if len < threshold {
        GateDecision::Skip
    } else {
        GateDecision::Proceed
    };
    debug!("Size gate: {} bytes vs threshold {} → {:?}", len, threshold, decision);
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_skips() {
        assert_eq!(check(1_999_999, 2_000_000), GateDecision::Skip);
        assert_eq!(check(0, 2_000_000), GateDecision::Skip);
    }

    #[test]
    fn exactly_threshold_proceeds() {
        assert_eq!(check(2_000_000, 2_000_000), GateDecision::Proceed);
    }

    #[test]
    fn above_threshold_proceeds() {
        assert_eq!(check(5_000_000, 2_000_000), GateDecision::Proceed);
    }

    #[test]
    fn zero_threshold_always_proceeds() {
        assert_eq!(check(0, 0), GateDecision::Proceed);
    }
}
