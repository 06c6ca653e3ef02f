//! Shared response envelope for API handlers
//!
//! Every handler answers with the `{success, data?, message?}` envelope.
//! Use [`ApiResponse`] instead of ad-hoc `serde_json::json!` so the shape
//! stays consistent across the surface.

use serde::Serialize;

/// Standard response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful envelope wrapping a payload
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful envelope carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_envelope_omits_message() {
        let json = serde_json::to_value(ApiResponse::ok(42)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 42}));
    }

    #[test]
    fn message_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));
    }
}
