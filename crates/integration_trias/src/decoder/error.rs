//! Decoder error types and first-error capture

use thiserror::Error;

use super::schema::FieldKey;

/// Errors that can occur while decoding a TRIAS response document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input bytes are not valid UTF-8
    #[error("Encoding failure: {0}")]
    EncodingFailure(String),

    /// The XML tokenizer rejected the document
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A value was offered for a key the payload record does not declare
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// A text value could not be converted to the field's type
    #[error("Type mismatch for {key}: expected {expected}, got {value:?}")]
    TypeMismatch {
        /// Key of the rejected field
        key: String,
        /// Name of the expected type
        expected: &'static str,
        /// The offending text
        value: String,
    },

    /// A field closed while no payload record was open
    #[error("Missing value: {0}")]
    MissingValue(String),
}

impl DecodeError {
    /// Returns true if this error stops event consumption immediately
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::EncodingFailure(_) | Self::MalformedDocument(_))
    }

    pub(crate) fn type_mismatch(key: FieldKey, expected: &'static str, value: &str) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            expected,
            value: value.to_string(),
        }
    }
}

/// Whether the event source should keep feeding events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep consuming events
    Continue,
    /// Stop consuming events
    Abort,
}

/// Holds the first error seen during a decode
///
/// Later errors are dropped. Fatal errors ask the event source to stop.
#[derive(Debug, Default)]
pub(crate) struct ErrorCapture {
    first: Option<DecodeError>,
}

impl ErrorCapture {
    pub(crate) fn record(&mut self, error: DecodeError) -> Flow {
        let flow = if error.is_fatal() {
            Flow::Abort
        } else {
            Flow::Continue
        };

        if self.first.is_none() {
            self.first = Some(error);
        }

        flow
    }

    pub(crate) const fn first(&self) -> Option<&DecodeError> {
        self.first.as_ref()
    }

    pub(crate) fn into_first(self) -> Option<DecodeError> {
        self.first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(DecodeError::EncodingFailure("bad".to_string()).is_fatal());
        assert!(DecodeError::MalformedDocument("bad".to_string()).is_fatal());
        assert!(!DecodeError::UnknownKey("trias:Foo".to_string()).is_fatal());
        assert!(!DecodeError::MissingValue("trias:Foo".to_string()).is_fatal());
    }

    #[test]
    fn test_first_error_wins() {
        let mut capture = ErrorCapture::default();
        assert_eq!(
            capture.record(DecodeError::MissingValue("first".to_string())),
            Flow::Continue
        );
        assert_eq!(
            capture.record(DecodeError::MalformedDocument("second".to_string())),
            Flow::Abort
        );
        assert_eq!(
            capture.into_first(),
            Some(DecodeError::MissingValue("first".to_string()))
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = DecodeError::type_mismatch(FieldKey::leaf("trias:Longitude"), "f64", "east");
        let msg = err.to_string();
        assert!(msg.contains("trias:Longitude"));
        assert!(msg.contains("f64"));
        assert!(msg.contains("east"));
    }
}
