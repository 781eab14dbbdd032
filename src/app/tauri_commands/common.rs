use crate::api::error::ApiError;
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、结果序列化
// ==========================================

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// 将ApiError转换为JSON字符串（Tauri要求）
pub(super) fn map_api_error(err: ApiError) -> String {
    tracing::warn!(code = err.code(), "命令执行失败: {}", err);
    let error_response = ErrorResponse {
        code: err.code().to_string(),
        message: err.to_string(),
        details: None,
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| err.to_string())
}

/// 参数解析失败（INVALID_INPUT）
pub(super) fn invalid_input(message: String) -> String {
    map_api_error(ApiError::InvalidInput(message))
}

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("序列化失败: {}", e))
}

/// 可空文本参数: 缺省 → 不修改；空字符串 → 置空
pub(super) fn nullable_arg(value: Option<&str>) -> Option<Option<&str>> {
    value.map(|v| if v.trim().is_empty() { None } else { Some(v) })
}
