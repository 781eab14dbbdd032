use std::collections::BTreeMap;

use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 配置管理相关命令
// ==========================================

/// 查询所有配置
#[tauri::command(rename_all = "snake_case")]
pub async fn list_configs(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let result = state.config_api.list_configs().map_err(map_api_error)?;
    to_json(&result)
}

/// 查询单个配置
#[tauri::command(rename_all = "snake_case")]
pub async fn get_config(state: tauri::State<'_, AppState>, key: String) -> Result<String, String> {
    let result = state.config_api.get_config(&key).map_err(map_api_error)?;
    to_json(&result)
}

/// 更新配置
#[tauri::command(rename_all = "snake_case")]
pub async fn update_config(
    state: tauri::State<'_, AppState>,
    key: String,
    value: String,
) -> Result<String, String> {
    state
        .config_api
        .update_config(&key, &value)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "key": key }))
}

/// 批量更新配置
#[tauri::command(rename_all = "snake_case")]
pub async fn batch_update_configs(
    state: tauri::State<'_, AppState>,
    configs: BTreeMap<String, String>,
) -> Result<String, String> {
    let updated = state
        .config_api
        .batch_update_configs(&configs)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "updated": updated }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn get_config_snapshot(state: tauri::State<'_, AppState>) -> Result<String, String> {
    state.config_api.get_config_snapshot().map_err(map_api_error)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn restore_config_from_snapshot(
    state: tauri::State<'_, AppState>,
    snapshot_json: String,
) -> Result<String, String> {
    let restored = state
        .config_api
        .restore_config_from_snapshot(&snapshot_json)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "restored": restored }))
}
