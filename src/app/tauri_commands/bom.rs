use crate::app::state::AppState;
use crate::domain::group::{GroupKey, MainItemKey};
use crate::domain::part::{NewPart, NewSecondSource, PartUpdate, SecondSourceUpdate};
use crate::domain::project::{NewBomRevision, NewProject};
use crate::domain::types::BomMode;

use super::common::{invalid_input, map_api_error, nullable_arg, to_json};

// ==========================================
// 系列 / 项目 / 版本相关命令
// ==========================================

#[tauri::command(rename_all = "snake_case")]
pub async fn create_series(
    state: tauri::State<'_, AppState>,
    name: String,
    description: Option<String>,
) -> Result<String, String> {
    let result = state
        .bom_api
        .create_series(&name, description.as_deref())
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn list_series(state: tauri::State<'_, AppState>) -> Result<String, String> {
    let result = state.bom_api.list_series().map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_series(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    state.bom_api.delete_series(id).map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn create_project(
    state: tauri::State<'_, AppState>,
    project: NewProject,
) -> Result<String, String> {
    let result = state
        .bom_api
        .create_project(&project)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn list_projects(
    state: tauri::State<'_, AppState>,
    series_id: Option<i64>,
) -> Result<String, String> {
    let result = state
        .bom_api
        .list_projects(series_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn get_project(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    let result = state.bom_api.get_project(id).map_err(map_api_error)?;
    to_json(&result)
}

/// 更新项目；code/description 缺省表示不修改，空字符串表示置空
#[tauri::command(rename_all = "snake_case")]
pub async fn update_project(
    state: tauri::State<'_, AppState>,
    id: i64,
    name: Option<String>,
    code: Option<String>,
    description: Option<String>,
) -> Result<String, String> {
    let result = state
        .bom_api
        .update_project(
            id,
            name.as_deref(),
            nullable_arg(code.as_deref()),
            nullable_arg(description.as_deref()),
        )
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_project(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    state.bom_api.delete_project(id).map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn create_revision(
    state: tauri::State<'_, AppState>,
    revision: NewBomRevision,
) -> Result<String, String> {
    let result = state
        .bom_api
        .create_revision(&revision)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn list_revisions(
    state: tauri::State<'_, AppState>,
    project_id: i64,
) -> Result<String, String> {
    let result = state
        .bom_api
        .list_revisions(project_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn get_revision(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    let result = state.bom_api.get_revision(id).map_err(map_api_error)?;
    to_json(&result)
}

/// 切换版本模式（NPI / MP）
#[tauri::command(rename_all = "snake_case")]
pub async fn set_revision_mode(
    state: tauri::State<'_, AppState>,
    id: i64,
    mode: String,
) -> Result<String, String> {
    let mode = BomMode::parse(&mode)
        .ok_or_else(|| invalid_input(format!("无效的版本模式: {}", mode)))?;
    let result = state
        .bom_api
        .set_revision_mode(id, mode)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_revision(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    state.bom_api.delete_revision(id).map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

// ==========================================
// 料件 / 替代料相关命令
// ==========================================

#[tauri::command(rename_all = "snake_case")]
pub async fn list_parts(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
) -> Result<String, String> {
    let result = state
        .bom_api
        .list_parts(revision_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn add_part(state: tauri::State<'_, AppState>, part: NewPart) -> Result<String, String> {
    let result = state.bom_api.add_part(&part).map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn update_part(
    state: tauri::State<'_, AppState>,
    id: i64,
    update: PartUpdate,
) -> Result<String, String> {
    let result = state
        .bom_api
        .update_part(id, &update)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_part(state: tauri::State<'_, AppState>, id: i64) -> Result<String, String> {
    state.bom_api.delete_part(id).map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn update_group(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    key: GroupKey,
    update: PartUpdate,
) -> Result<String, String> {
    let updated = state
        .bom_api
        .update_group(revision_id, &key, &update)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "updated": updated }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_group(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    key: GroupKey,
) -> Result<String, String> {
    let deleted = state
        .bom_api
        .delete_group(revision_id, &key)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": deleted }))
}

#[tauri::command(rename_all = "snake_case")]
pub async fn list_second_sources(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    main_item: Option<MainItemKey>,
) -> Result<String, String> {
    let result = match main_item {
        Some(key) => state
            .bom_api
            .find_second_sources_by_main_item(revision_id, &key),
        None => state.bom_api.list_second_sources(revision_id),
    }
    .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn add_second_source(
    state: tauri::State<'_, AppState>,
    second_source: NewSecondSource,
) -> Result<String, String> {
    let result = state
        .bom_api
        .add_second_source(&second_source)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn update_second_source(
    state: tauri::State<'_, AppState>,
    id: i64,
    update: SecondSourceUpdate,
) -> Result<String, String> {
    let result = state
        .bom_api
        .update_second_source(id, &update)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn delete_second_source(
    state: tauri::State<'_, AppState>,
    id: i64,
) -> Result<String, String> {
    state
        .bom_api
        .delete_second_source(id)
        .map_err(map_api_error)?;
    to_json(&serde_json::json!({ "deleted": id }))
}

// ==========================================
// 视图相关命令
// ==========================================

#[tauri::command(rename_all = "snake_case")]
pub async fn list_views(state: tauri::State<'_, AppState>) -> Result<String, String> {
    to_json(&state.bom_api.list_views())
}

#[tauri::command(rename_all = "snake_case")]
pub async fn execute_view(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    view_id: String,
) -> Result<String, String> {
    let result = state
        .bom_api
        .execute_view_by_id(revision_id, &view_id)
        .map_err(map_api_error)?;
    to_json(&result)
}

#[tauri::command(rename_all = "snake_case")]
pub async fn aggregated_view(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
) -> Result<String, String> {
    let result = state
        .bom_api
        .aggregated_view(revision_id)
        .map_err(map_api_error)?;
    to_json(&result)
}
