use std::error::Error;
use std::fmt;

/// Fatal parse failure. No partial game is returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SgfError {
    /// A property key outside both the game-scope and node-scope sets.
    UnsupportedProperty {
        key: String,
        /// Raw bracketed value group(s) as matched, e.g. `[foo]`.
        value: String,
        /// The full matched property text, e.g. `XX[foo]`.
        token: String,
    },
}

impl fmt::Display for SgfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedProperty { key, value, token } => write!(
                f,
                "Unsupported property '{}'={} found in '{}'",
                key, value, token
            ),
        }
    }
}

impl Error for SgfError {}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAccumulator, SgfError};

    #[test]
    fn test_unsupported_property_display_names_key_value_and_token() {
        let err = SgfError::UnsupportedProperty {
            key: "XX".to_string(),
            value: "[foo]".to_string(),
            token: "XX[foo]".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Unsupported property 'XX'=[foo] found in 'XX[foo]'"
        );
    }

    #[test]
    fn test_push_single_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("first error");

        assert_eq!(accumulator.take().as_deref(), Some("first error"));
    }

    #[test]
    fn test_push_multiple_messages_uses_separator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("Conversion error: Komi='six'");
        accumulator.push("Conversion error: Date='soon'");

        assert_eq!(
            accumulator.take().as_deref(),
            Some("Conversion error: Komi='six'; Conversion error: Date='soon'")
        );
    }

    #[test]
    fn test_take_consumes_accumulator() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("error");

        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.is_empty());
        assert!(accumulator.take().is_none());
    }

    #[test]
    fn test_default_is_empty() {
        let accumulator = ErrorAccumulator::default();
        assert!(accumulator.is_empty());
    }
}
