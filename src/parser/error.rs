//! Error types for portal markup parsing.
//!
//! These stay inside the parser module: the public parse functions log them
//! and degrade to an empty result.

use thiserror::Error;

/// Errors that can occur while decoding portal responses.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The course-list XML envelope could not be read.
    #[error("malformed XML envelope at byte {position}: {reason}")]
    Envelope {
        /// Reader offset where decoding stopped.
        position: u64,
        /// What the XML reader reported.
        reason: String,
    },

    /// The envelope decoded but carried no HTML payload.
    #[error("XML envelope has an empty payload")]
    EmptyPayload,
}

impl ParseError {
    /// Creates an `Envelope` error from a reader failure.
    #[must_use]
    pub fn envelope(position: u64, reason: impl ToString) -> Self {
        Self::Envelope {
            position,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_message() {
        let err = ParseError::envelope(42, "unexpected end of input");
        let msg = err.to_string();
        assert!(msg.contains("byte 42"));
        assert!(msg.contains("unexpected end of input"));
    }

    #[test]
    fn test_parse_error_clone() {
        let err = ParseError::EmptyPayload;
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}
