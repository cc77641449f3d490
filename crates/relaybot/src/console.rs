//! The operator console seam.

/// A line-oriented operator console.
///
/// `None` from either method means the operator closed the console (end
/// of input). After that, both keep returning `None`.
pub trait Console {
    /// Waits for the next command line.
    async fn next_line(&mut self) -> Option<String>;

    /// Shows `question` and waits for a one-line answer.
    ///
    /// Used only for the challenge-code prompt. Nothing else is processed
    /// while waiting.
    async fn ask(&mut self, question: &str) -> Option<String>;
}
