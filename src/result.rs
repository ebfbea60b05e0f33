use axum::Json;
use serde::Serialize;

/// 统一响应结构：`{success, message, ...payload}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub payload: T,
}

/// 无附加数据的响应
#[derive(Debug, Serialize)]
pub struct Empty {}

pub fn success_response<T: Serialize>(message: impl Into<String>, payload: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: message.into(),
        payload,
    })
}

pub fn message_response(message: impl Into<String>) -> Json<ApiResponse<Empty>> {
    success_response(message, Empty {})
}

pub fn error_response<T: Serialize>(message: impl Into<String>, payload: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: false,
        message: message.into(),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        count: u64,
    }

    #[test]
    fn payload_is_flattened_into_envelope() {
        let Json(body) = success_response("ok", Payload { count: 3 });
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"success": true, "message": "ok", "count": 3})
        );
    }

    #[test]
    fn empty_payload_only_has_envelope() {
        let Json(body) = message_response("done");
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "message": "done"}));
    }
}
