use crate::app::state::AppState;

use super::common::{map_api_error, to_json};

// ==========================================
// 导入 / 导出相关命令
// ==========================================

/// 导入 BOM 文件（.xlsx / .xls / .csv）
#[tauri::command(rename_all = "snake_case")]
pub async fn import_bom(
    state: tauri::State<'_, AppState>,
    file_path: String,
    project_id: i64,
    phase: String,
    version: String,
    description: Option<String>,
) -> Result<String, String> {
    tracing::info!("[import_bom] file_path={}, project_id={}", file_path, project_id);

    let result = state
        .import_api
        .import_bom(&file_path, project_id, &phase, &version, description.as_deref())
        .map_err(|e| {
            tracing::error!("[import_bom] 导入失败: {:?}", e);
            map_api_error(e)
        })?;

    to_json(&result)
}

/// 导出视图为 CSV
#[tauri::command(rename_all = "snake_case")]
pub async fn export_view_csv(
    state: tauri::State<'_, AppState>,
    revision_id: i64,
    view_id: String,
    path: String,
) -> Result<String, String> {
    let result = state
        .import_api
        .export_view_csv(revision_id, &view_id, &path)
        .map_err(map_api_error)?;
    to_json(&result)
}
