// ==========================================
// BOM 矩阵管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约束: 全部仓储共享同一个 SharedConnection，由此处显式创建并注入
// ==========================================

use std::sync::Arc;

use crate::api::{BomApi, ConfigApi, ImportApi, MatrixApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{open_shared_connection, SharedConnection};
use crate::engine::store::BomRepositories;
use crate::repository::{
    BomRevisionRepository, MatrixRepository, PartRepository, ProjectRepository,
    SecondSourceRepository, SeriesRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 在Tauri应用中作为全局状态管理
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 系列/项目/版本/料件/视图 API
    pub bom_api: Arc<BomApi>,

    /// Matrix API
    pub matrix_api: Arc<MatrixApi>,

    /// 导入导出 API
    pub import_api: Arc<ImportApi>,

    /// 配置管理 API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    ///
    /// # 返回
    /// - Err(String): 数据库无法打开或建表失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let state = Self::from_connection(db_path, conn);

        // 应用已保存的界面语言
        match state.config_api.get_config(crate::config::config_keys::APP_LOCALE) {
            Ok(Some(locale)) => {
                crate::i18n::set_locale(&locale);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("读取界面语言配置失败(将使用默认语言): {}", e),
        }

        tracing::info!("AppState初始化完成");
        Ok(state)
    }

    /// 基于已有连接装配（连接需已完成建表）
    pub fn from_connection(db_path: String, conn: SharedConnection) -> Self {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let series_repo = Arc::new(SeriesRepository::new(conn.clone()));
        let project_repo = Arc::new(ProjectRepository::new(conn.clone()));
        let bom = BomRepositories::new(
            Arc::new(BomRevisionRepository::new(conn.clone())),
            Arc::new(PartRepository::new(conn.clone())),
            Arc::new(SecondSourceRepository::new(conn.clone())),
        );
        let matrix_repo = Arc::new(MatrixRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let bom_api = Arc::new(BomApi::new(series_repo, project_repo.clone(), bom.clone()));
        let matrix_api = Arc::new(MatrixApi::new(
            bom.clone(),
            matrix_repo,
            config_manager.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(
            conn,
            project_repo,
            bom,
            config_manager.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        Self {
            db_path,
            bom_api,
            matrix_api,
            import_api,
            config_api,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 BOM_MATRIX_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("BOM_MATRIX_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bom_matrix.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("bom-matrix-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("bom-matrix");

        // best-effort: 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bom_matrix.db");
        }
    }

    path.to_string_lossy().to_string()
}
