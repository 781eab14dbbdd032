use crate::app::state::AppState;
use crate::domain::matrix::{NewMatrixModel, SelectionInput};

use super::common::{map_api_error, nullable_arg, to_json};

// ==========================================
// Matrix 相关命令
// ==========================================

/// 创建机种；models 缺省或为空时使用默认机种
#[tauri::command(rename_all = "snake_case")]
pub async fn create_matrix_models(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    models: Option<Vec<NewMatrixModel>>,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .create_models(revision_id, &models.unwrap_or_default())
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn list_matrix_models(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .list_models(revision_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

/// 更新机种；description 空字符串表示置空
#[tauri::command(rename_all = "snake_case")]
pub async fn update_matrix_model(
    state: tauri::State<'_, AppState>,
    id: i64,
    name: Option<String>,
    description: Option<String>,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .update_model(id, name.as_deref(), nullable_arg(description.as_deref()))
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_matrix_model(
    state: tauri::State<'_, AppState>,
    id: i64,
) -> Result<String, String> {
    state.matrix_api.delete_model(id).map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn save_matrix_selection(
    state: tauri::State<'_, AppState>,
    selection: SelectionInput,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .save_selection(&selection)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_matrix_selection(
    state: tauri::State<'_, AppState>,
    model_id: i64,
    group_key: String,
) -> Result<String, String> {
    state
        .matrix_api
        .delete_selection(model_id, &group_key)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "model_id": model_id, "group_key": group_key }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn get_matrix_data(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .get_matrix_data(revision_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn get_matrix_summary(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
) -> Result<String, String> {
    let result = state
        .matrix_api
        .get_matrix_summary(revision_id)
        .map_err(map_api_error)?;
    to_json(&result)
}
