//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur during framing or message handling.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("incomplete message: need {needed} more bytes")]
    IncompleteMessage { needed: usize },

    #[error("invalid UTF-8 in payload")]
    InvalidUtf8,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::FrameTooLarge { size: 100, max: 50 };
        assert!(err.to_string().contains("100"));

        let err = ProtocolError::IncompleteMessage { needed: 60 };
        assert!(err.to_string().contains("60"));

        let err = ProtocolError::InvalidUtf8;
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ProtocolError::from(json_err);
        assert!(matches!(err, ProtocolError::Json(_)));
    }
}
