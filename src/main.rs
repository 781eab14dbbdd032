// ==========================================
// BOM 矩阵管理系统 - Tauri 主入口
// ==========================================
// 技术栈: Tauri + Rust + SQLite
// ==========================================

// 禁止控制台窗口 (Windows)
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(feature = "tauri-app")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use bom_matrix::app::tauri_commands::*;
    use bom_matrix::app::{get_default_db_path, AppState};

    // 初始化日志系统
    bom_matrix::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", bom_matrix::APP_NAME);
    tracing::info!("系统版本: {}", bom_matrix::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path.clone())
        .map_err(|e| anyhow::anyhow!("无法初始化AppState({}): {}", db_path, e))?;

    tracing::info!("启动Tauri应用...");

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            // ==========================================
            // 系列 / 项目 / 版本
            // ==========================================
            create_series,
            list_series,
            delete_series,
            create_project,
            list_projects,
            get_project,
            update_project,
            delete_project,
            create_revision,
            list_revisions,
            get_revision,
            set_revision_mode,
            delete_revision,

            // ==========================================
            // 料件 / 替代料
            // ==========================================
            list_parts,
            add_part,
            update_part,
            delete_part,
            update_group,
            delete_group,
            list_second_sources,
            add_second_source,
            update_second_source,
            delete_second_source,

            // ==========================================
            // 视图
            // ==========================================
            list_views,
            execute_view,
            aggregated_view,

            // ==========================================
            // Matrix
            // ==========================================
            create_matrix_models,
            list_matrix_models,
            update_matrix_model,
            delete_matrix_model,
            save_matrix_selection,
            delete_matrix_selection,
            get_matrix_data,
            get_matrix_summary,

            // ==========================================
            // 导入 / 导出
            // ==========================================
            import_bom,
            export_view_csv,

            // ==========================================
            // 配置管理
            // ==========================================
            list_configs,
            get_config,
            update_config,
            batch_update_configs,
            get_config_snapshot,
            restore_config_from_snapshot,
        ])
        .run(tauri::generate_context!())
        .context("启动Tauri应用失败")?;

    tracing::info!("Tauri应用已退出");
    Ok(())
}

#[cfg(not(feature = "tauri-app"))]
fn main() {
    println!("==================================================");
    println!("{}", bom_matrix::APP_NAME);
    println!("系统版本: {}", bom_matrix::VERSION);
    println!("==================================================");
    println!();
    println!("此可执行文件需要启用 tauri-app 特性");
    println!("使用: cargo run --features tauri-app");
    println!();
    println!("或者使用库模式:");
    println!("use bom_matrix::app::AppState;");
    println!();
    println!("默认数据库: {}", bom_matrix::app::get_default_db_path());
}
