// ==========================================
// BOM 矩阵管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)，当前仅使用 global 作用域
// ==========================================

use crate::db::{open_shared_connection, SharedConnection};
use crate::domain::matrix::NewMatrixModel;
use crate::repository::db_utils::{begin, commit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;

const GLOBAL_SCOPE: &str = "global";

/// 配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: SharedConnection,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（打开并初始化数据库）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_shared_connection(db_path)?;
        Ok(Self { conn })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_value_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::debug!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 删除配置值，返回是否存在
    pub fn delete_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 列出全部配置（按 key 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value, updated_at FROM config_kv WHERE scope_id = ?1 ORDER BY key",
        )?;
        let entries = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok(ConfigEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 获取所有配置的快照（JSON 对象字符串）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let map: BTreeMap<String, String> = self
            .list_all()?
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        serde_json::to_string(&map).map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 从配置快照恢复配置（覆盖同名键，单事务）
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let map: BTreeMap<String, String> =
            serde_json::from_str(snapshot_json).map_err(|e| RepositoryError::FieldValueError {
                field: "snapshot_json".to_string(),
                message: e.to_string(),
            })?;

        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;
        let mut count = 0;
        for (key, value) in &map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        commit(tx)?;
        Ok(count)
    }

    // ===== 类型化配置 =====

    /// 默认机种列表（config: matrix/default_models）
    ///
    /// 配置缺失或格式错误时返回空列表，由引擎回落到 Model A/B/C
    pub fn get_default_models(&self) -> RepositoryResult<Vec<NewMatrixModel>> {
        let value = match self.get_value(config_keys::MATRIX_DEFAULT_MODELS)? {
            Some(v) => v,
            None => return Ok(Vec::new()),
        };
        let models: Vec<NewMatrixModel> = serde_json::from_str(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::MATRIX_DEFAULT_MODELS,
                raw_value = %value,
                "默认机种配置格式错误，使用内置默认值"
            );
            Vec::new()
        });
        Ok(models
            .into_iter()
            .filter(|m| !m.name.trim().is_empty())
            .collect())
    }

    /// 导入工作表名（config: import/sheet_name）；为空表示第一个工作表
    pub fn get_import_sheet_name(&self) -> RepositoryResult<Option<String>> {
        Ok(self
            .get_value(config_keys::IMPORT_SHEET_NAME)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// 界面语言（config: app/locale），默认 zh-CN
    pub fn get_locale(&self) -> RepositoryResult<String> {
        let value = self.get_value_or_default(config_keys::APP_LOCALE, DEFAULT_LOCALE)?;
        if SUPPORTED_LOCALES.contains(&value.as_str()) {
            Ok(value)
        } else {
            tracing::warn!(config_key = config_keys::APP_LOCALE, raw_value = %value, "不支持的语言，使用默认值");
            Ok(DEFAULT_LOCALE.to_string())
        }
    }
}

pub const DEFAULT_LOCALE: &str = "zh-CN";
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // Matrix
    pub const MATRIX_DEFAULT_MODELS: &str = "matrix/default_models"; // JSON: [{name, description}]

    // 导入
    pub const IMPORT_SHEET_NAME: &str = "import/sheet_name";

    // 应用
    pub const APP_LOCALE: &str = "app/locale";
}
