//! Shutdown reasons.

use crate::stopper::Signal;

/// Why shutdown was requested.
///
/// Either the symbolic name of the OS signal that was observed, or a
/// caller-supplied message when shutdown is driven through a [`Trigger`].
///
/// [`Trigger`]: crate::stopper::Trigger
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reason(String);

impl Reason {
    /// Create a reason from any string-like message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Get the reason as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the reason, returning the underlying message.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Reason {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Reason {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Signal> for Reason {
    fn from(signal: Signal) -> Self {
        Self::new(signal.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_from_message() {
        let reason = Reason::new("admin stop");
        assert_eq!(reason.as_str(), "admin stop");
        assert_eq!(format!("{}", reason), "admin stop");
        assert_eq!(reason.into_inner(), "admin stop".to_string());
    }

    #[test]
    fn test_reason_from_signal() {
        assert_eq!(Reason::from(Signal::Interrupt).as_str(), "SIGINT");
        assert_eq!(Reason::from(Signal::Terminate).as_str(), "SIGTERM");
    }

    #[test]
    fn test_reason_conversions() {
        let a: Reason = "deploy".into();
        let b: Reason = String::from("deploy").into();
        assert_eq!(a, b);
        assert_eq!(a.as_ref(), "deploy");
    }
}
