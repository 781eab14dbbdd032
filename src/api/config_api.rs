// ==========================================
// BOM 矩阵管理系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新、快照管理
// 校验: 已知键在写入前校验格式（默认机种 JSON、语言代码）
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigEntry, ConfigManager, SUPPORTED_LOCALES};
use crate::domain::matrix::NewMatrixModel;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 配置查询（全部、单个）
/// 2. 配置更新（单个、批量），界面语言即时生效
/// 3. 配置快照导出 / 恢复
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    pub fn list_configs(&self) -> ApiResult<Vec<ConfigEntry>> {
        Ok(self.config_manager.list_all()?)
    }

    /// 查询单个配置
    ///
    /// # 返回
    /// - Ok(None): 配置不存在
    pub fn get_config(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.config_manager.get_value(key)?)
    }

    /// 更新单个配置
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        Self::validate(key, value)?;
        self.config_manager.set_value(key, value)?;

        if key == config_keys::APP_LOCALE {
            crate::i18n::set_locale(value);
        }
        info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 批量更新配置；任一校验失败时不写入
    pub fn batch_update_configs(&self, configs: &BTreeMap<String, String>) -> ApiResult<usize> {
        for (key, value) in configs {
            Self::validate(key, value)?;
        }
        let snapshot = serde_json::to_string(configs)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let count = self.config_manager.restore_config_from_snapshot(&snapshot)?;

        if let Some(locale) = configs.get(config_keys::APP_LOCALE) {
            crate::i18n::set_locale(locale);
        }
        Ok(count)
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ApiResult<usize> {
        let configs: BTreeMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| ApiError::InvalidInput(format!("配置快照格式错误: {}", e)))?;
        self.batch_update_configs(&configs)
    }

    fn validate(key: &str, value: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        match key {
            config_keys::MATRIX_DEFAULT_MODELS => {
                let models: Vec<NewMatrixModel> = serde_json::from_str(value).map_err(|e| {
                    ApiError::InvalidInput(format!("默认机种配置必须为 JSON 数组: {}", e))
                })?;
                if models.iter().any(|m| m.name.trim().is_empty()) {
                    return Err(ApiError::InvalidInput("机种名称不能为空".to_string()));
                }
            }
            config_keys::APP_LOCALE => {
                if !SUPPORTED_LOCALES.contains(&value) {
                    return Err(ApiError::InvalidInput(format!("不支持的语言: {}", value)));
                }
            }
            _ => {}
        }
        Ok(())
    }
}
