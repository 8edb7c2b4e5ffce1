//! Output notification for the interactive session
//!
//! Lets tests and alternative front ends capture session output instead of
//! printing it.

/// Trait for handling session output notifications
pub trait SessionNotifier: Send + Sync {
    /// Handle regular output
    fn on_output(&self, content: &str);

    /// Handle error output
    fn on_error(&self, content: &str);
}

/// Console notifier writing to stdout/stderr
pub struct DefaultNotifier;

impl DefaultNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl SessionNotifier for DefaultNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{content}");
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{content}");
    }
}

impl Default for DefaultNotifier {
    fn default() -> Self {
        Self::new()
    }
}
