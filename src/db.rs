// ==========================================
// BOM 矩阵管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联依赖 foreign_keys=ON）
// - 统一 busy_timeout
// - 幂等建表，首次启动即可用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 共享连接句柄（显式传入各仓储）
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表，并包装为共享句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 幂等建表
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS series (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS project (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            series_id INTEGER REFERENCES series(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            code TEXT,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bom_revision (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
            phase TEXT NOT NULL,
            version TEXT NOT NULL,
            mode TEXT NOT NULL DEFAULT 'NPI' CHECK (mode IN ('NPI', 'MP')),
            description TEXT,
            source_filename TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (project_id, phase, version)
        );

        CREATE TABLE IF NOT EXISTS part (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bom_revision_id INTEGER NOT NULL REFERENCES bom_revision(id) ON DELETE CASCADE,
            item INTEGER NOT NULL,
            hhpn TEXT,
            supplier TEXT NOT NULL,
            supplier_pn TEXT NOT NULL,
            description TEXT,
            location TEXT NOT NULL,
            type TEXT CHECK (type IS NULL OR type IN ('SMD', 'PTH', 'BOTTOM')),
            bom_status TEXT NOT NULL CHECK (bom_status IN ('I', 'X', 'P', 'M')),
            ccl TEXT NOT NULL DEFAULT 'N' CHECK (ccl IN ('Y', 'N')),
            remark TEXT,
            UNIQUE (bom_revision_id, location)
        );
        CREATE INDEX IF NOT EXISTS idx_part_group
            ON part(bom_revision_id, supplier, supplier_pn, type);

        CREATE TABLE IF NOT EXISTS second_source (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bom_revision_id INTEGER NOT NULL REFERENCES bom_revision(id) ON DELETE CASCADE,
            main_supplier TEXT NOT NULL,
            main_supplier_pn TEXT NOT NULL,
            hhpn TEXT,
            supplier TEXT NOT NULL,
            supplier_pn TEXT NOT NULL,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_second_source_main
            ON second_source(bom_revision_id, main_supplier, main_supplier_pn);

        CREATE TABLE IF NOT EXISTS matrix_model (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bom_revision_id INTEGER NOT NULL REFERENCES bom_revision(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS matrix_selection (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            matrix_model_id INTEGER NOT NULL REFERENCES matrix_model(id) ON DELETE CASCADE,
            group_key TEXT NOT NULL,
            selected_type TEXT NOT NULL CHECK (selected_type IN ('part', 'second_source')),
            selected_id INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (matrix_model_id, group_key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
