//! The JSON envelope every row endpoint answers with.

use serde::Serialize;

/// `{"status": "success", "data": ...}` or `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success { data: T },
    Error { message: String },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_data() {
        let body = serde_json::to_value(Envelope::success(json!({"updatedRows": 1}))).unwrap();
        assert_eq!(body, json!({"status": "success", "data": {"updatedRows": 1}}));
    }

    #[test]
    fn error_serializes_with_message() {
        let body = serde_json::to_value(Envelope::error("boom")).unwrap();
        assert_eq!(body, json!({"status": "error", "message": "boom"}));
    }
}
