use crate::api::error::ApiError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、参数解析、结果序列化
// ==========================================

/// 服务端错误对外统一消息
const OPAQUE_SERVER_MESSAGE: &str = "内部错误";

/// 错误响应（返回给调用方）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// HTTP 风格状态码
    pub status: u16,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn from_api_error(err: &ApiError) -> Self {
        let status = err.status();
        let message = if err.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "请求处理失败");
            OPAQUE_SERVER_MESSAGE.to_string()
        } else {
            err.to_string()
        };

        let details = match err {
            ApiError::InvalidStateTransition { from, to } => {
                Some(serde_json::json!({ "from": from, "to": to }))
            }
            _ => None,
        };

        Self {
            code: err.code().to_string(),
            status,
            message,
            details,
        }
    }
}

/// 将ApiError转换为JSON字符串
pub(super) fn map_api_error(err: ApiError) -> String {
    let response = ErrorResponse::from_api_error(&err);
    serde_json::to_string(&response).unwrap_or_else(|_| response.message.clone())
}

/// 解析 JSON 请求体
pub(super) fn parse_request<T: DeserializeOwned>(request_json: &str) -> Result<T, String> {
    serde_json::from_str(request_json)
        .map_err(|e| map_api_error(ApiError::InvalidInput(format!("请求格式错误: {}", e))))
}

/// 解析日期字符串
pub(super) fn parse_date(date_str: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
        map_api_error(ApiError::InvalidInput(format!(
            "日期格式错误（应为YYYY-MM-DD）: {}",
            e
        )))
    })
}

/// 序列化成功结果
pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value)
        .map_err(|e| map_api_error(ApiError::InternalError(format!("序列化失败: {}", e))))
}
