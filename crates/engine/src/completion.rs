//! Completion sinks for the operation surface
//!
//! Every operation completes through a sink with two terminals:
//! `set_success(value)` or `set_failure(reason)`. Exactly one terminal is
//! invoked per call. The apply layer batches operations behind sinks to
//! amortize notifications; tests and simple callers use [`OpCapture`].

/// Two-terminal completion sink
///
/// Lock conflicts arrive through `set_success` with an unsuccessful owner
/// record; `set_failure` is reserved for engine failures.
pub trait Completion<T> {
    /// Complete the operation with a value.
    fn set_success(&mut self, value: T);

    /// Complete the operation with a short failure reason.
    fn set_failure(&mut self, reason: String);
}

/// Sink that captures the single terminal for later inspection
#[derive(Clone, Debug, Default)]
pub struct OpCapture<T> {
    outcome: Option<Result<T, String>>,
}

impl<T> OpCapture<T> {
    /// Create an empty capture.
    pub fn new() -> Self {
        OpCapture { outcome: None }
    }

    /// Whether a terminal has been invoked.
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the success terminal was invoked.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Some(Ok(_)))
    }

    /// Consume the capture, returning the outcome.
    ///
    /// # Panics
    ///
    /// Panics if no terminal was invoked.
    pub fn into_outcome(self) -> Result<T, String> {
        self.outcome.expect("operation did not complete")
    }

    /// Consume the capture, returning the success value.
    ///
    /// # Panics
    ///
    /// Panics if the operation failed or did not complete.
    pub fn into_success(self) -> T {
        match self.into_outcome() {
            Ok(value) => value,
            Err(reason) => panic!("operation failed: {reason}"),
        }
    }

    /// Consume the capture, returning the failure reason.
    ///
    /// # Panics
    ///
    /// Panics if the operation succeeded or did not complete.
    pub fn into_failure(self) -> String {
        match self.into_outcome() {
            Ok(_) => panic!("operation succeeded"),
            Err(reason) => reason,
        }
    }
}

impl<T> Completion<T> for OpCapture<T> {
    fn set_success(&mut self, value: T) {
        debug_assert!(self.outcome.is_none(), "completion invoked twice");
        self.outcome = Some(Ok(value));
    }

    fn set_failure(&mut self, reason: String) {
        debug_assert!(self.outcome.is_none(), "completion invoked twice");
        self.outcome = Some(Err(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_success() {
        let mut capture = OpCapture::new();
        assert!(!capture.is_complete());
        capture.set_success(41 + 1);
        assert!(capture.is_success());
        assert_eq!(capture.into_success(), 42);
    }

    #[test]
    fn test_capture_failure() {
        let mut capture: OpCapture<()> = OpCapture::new();
        capture.set_failure("Fail to [GET]".to_string());
        assert!(capture.is_complete());
        assert!(!capture.is_success());
        assert_eq!(capture.into_failure(), "Fail to [GET]");
    }

    #[test]
    #[should_panic(expected = "operation did not complete")]
    fn test_incomplete_capture_panics() {
        let capture: OpCapture<()> = OpCapture::new();
        capture.into_outcome().unwrap();
    }
}
