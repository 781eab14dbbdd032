// ==========================================
// BOM 矩阵管理系统 - 配置层
// ==========================================
// 职责: 系统配置管理（默认机种、导入工作表、界面语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigEntry, ConfigManager, DEFAULT_LOCALE};
