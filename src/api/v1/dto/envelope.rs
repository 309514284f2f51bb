/*
 * Responsibility
 * - Success body shared by every v1 handler: `{success: true, message?, count?, data?}`
 * - Rejections are rendered by AppError, not here
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::data(data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::data(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omits_empty_fields() {
        let v = serde_json::to_value(ApiResponse::data(json!({"a": 1}))).unwrap();
        assert_eq!(v, json!({"success": true, "data": {"a": 1}}));

        let v = serde_json::to_value(ApiResponse::list(vec![1, 2])).unwrap();
        assert_eq!(v, json!({"success": true, "count": 2, "data": [1, 2]}));

        let v = serde_json::to_value(ApiResponse::with_message("done", json!({}))).unwrap();
        assert_eq!(v, json!({"success": true, "message": "done", "data": {}}));
    }
}
