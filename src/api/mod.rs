// ==========================================
// BOM 矩阵管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 Tauri 命令调用
// ==========================================

pub mod bom_api;
pub mod config_api;
pub mod error;
pub mod import_api;
pub mod matrix_api;

// 重导出核心类型
pub use bom_api::BomApi;
pub use config_api::ConfigApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ExportApiResponse, ImportApi, ImportApiResponse};
pub use matrix_api::MatrixApi;
