//! Deferred diagnostic messages.

use std::fmt;
use std::sync::OnceLock;

/// A message rendered only when something displays it.
///
/// Wraps a zero-argument closure. Building a `LazyMessage` is cheap; the
/// closure runs the first time the message is formatted, never before, and
/// its text is kept for later reads.
pub struct LazyMessage {
    build: Box<dyn Fn() -> String + Send + Sync>,
    text: OnceLock<String>,
}

impl LazyMessage {
    /// Wrap a closure that produces the message.
    pub fn new(build: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            text: OnceLock::new(),
        }
    }

    /// Produce the message now.
    pub fn render(&self) -> String {
        self.text.get_or_init(|| (self.build)()).clone()
    }

    /// Whether the message has been built yet.
    pub fn is_rendered(&self) -> bool {
        self.text.get().is_some()
    }
}

impl fmt::Display for LazyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for LazyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyMessage(..)")
    }
}
