// ==========================================
// BOM 矩阵管理系统 - 替代料仓储 (Second-Source Store)
// ==========================================
// 关联: 按 (bom_revision_id, main_supplier, main_supplier_pn) 逻辑键，不挂靠具体料件行
// 去重: 批量插入按完整键去重（批内 + 库内）
// ==========================================

use crate::db::SharedConnection;
use crate::domain::group::MainItemKey;
use crate::domain::part::{NewSecondSource, SecondSource, SecondSourceUpdate};
use crate::repository::db_utils::{begin, commit, SetClause};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;

const SECOND_SOURCE_COLUMNS: &str = "id, bom_revision_id, main_supplier, main_supplier_pn, \
                                     hhpn, supplier, supplier_pn, description";

// ==========================================
// SecondSourceRepository - 替代料仓储
// ==========================================
pub struct SecondSourceRepository {
    conn: SharedConnection,
}

impl SecondSourceRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入单条替代料（不去重，手工新增场景）
    pub fn insert(&self, ss: &NewSecondSource) -> RepositoryResult<SecondSource> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO second_source (
                bom_revision_id, main_supplier, main_supplier_pn,
                hhpn, supplier, supplier_pn, description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                ss.bom_revision_id,
                ss.main_supplier,
                ss.main_supplier_pn,
                ss.hhpn,
                ss.supplier,
                ss.supplier_pn,
                ss.description,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::find_by_id_with(&conn, id)?
            .ok_or_else(|| RepositoryError::not_found("SecondSource", id))
    }

    /// 批量插入（单事务，按完整键去重）
    ///
    /// # 返回
    /// - `Ok(count)`: 实际插入条数
    pub fn bulk_insert(&self, list: &[NewSecondSource]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;
        let count = Self::bulk_insert_with(&tx, list)?;
        commit(tx)?;
        Ok(count)
    }

    /// 在已有事务内批量插入（按完整键去重）
    pub fn bulk_insert_with(conn: &Connection, list: &[NewSecondSource]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO second_source (
                bom_revision_id, main_supplier, main_supplier_pn,
                hhpn, supplier, supplier_pn, description
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE NOT EXISTS (
                SELECT 1 FROM second_source
                WHERE bom_revision_id = ?1 AND main_supplier = ?2 AND main_supplier_pn = ?3
                  AND hhpn IS ?4 AND supplier = ?5 AND supplier_pn = ?6 AND description IS ?7
            )
            "#,
        )?;

        let mut seen = HashSet::new();
        let mut count = 0;
        for ss in list {
            if !seen.insert(ss) {
                continue;
            }
            count += stmt.execute(params![
                ss.bom_revision_id,
                ss.main_supplier,
                ss.main_supplier_pn,
                ss.hhpn,
                ss.supplier,
                ss.supplier_pn,
                ss.description,
            ])?;
        }
        Ok(count)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<SecondSource>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with(&conn, id)
    }

    /// 查询版本下全部替代料（按 id 升序）
    pub fn find_by_revision(&self, revision_id: i64) -> RepositoryResult<Vec<SecondSource>> {
        let conn = self.get_conn()?;
        Self::find_by_revision_with(&conn, revision_id)
    }

    pub fn find_by_revision_with(
        conn: &Connection,
        revision_id: i64,
    ) -> RepositoryResult<Vec<SecondSource>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM second_source WHERE bom_revision_id = ?1 ORDER BY id ASC",
            SECOND_SOURCE_COLUMNS
        ))?;
        let list = stmt
            .query_map(params![revision_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(list)
    }

    /// 查询某主料的替代料
    pub fn find_by_main_item(
        &self,
        revision_id: i64,
        key: &MainItemKey,
    ) -> RepositoryResult<Vec<SecondSource>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM second_source
             WHERE bom_revision_id = ?1 AND main_supplier = ?2 AND main_supplier_pn = ?3
             ORDER BY id ASC",
            SECOND_SOURCE_COLUMNS
        ))?;
        let list = stmt
            .query_map(
                params![revision_id, key.supplier, key.supplier_pn],
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(list)
    }

    pub fn update(&self, id: i64, update: &SecondSourceUpdate) -> RepositoryResult<SecondSource> {
        let conn = self.get_conn()?;

        let mut set = SetClause::new();
        if let Some(hhpn) = &update.hhpn {
            set.nullable_text("hhpn", hhpn.as_deref());
        }
        if let Some(supplier) = &update.supplier {
            set.text("supplier", supplier);
        }
        if let Some(supplier_pn) = &update.supplier_pn {
            set.text("supplier_pn", supplier_pn);
        }
        if let Some(description) = &update.description {
            set.nullable_text("description", description.as_deref());
        }

        if !set.is_empty() {
            let sql = format!("UPDATE second_source SET {} WHERE id = ?", set.sql());
            let affected =
                conn.execute(&sql, params_from_iter(set.into_params(vec![Value::Integer(id)])))?;
            if affected == 0 {
                return Err(RepositoryError::not_found("SecondSource", id));
            }
        }

        Self::find_by_id_with(&conn, id)?
            .ok_or_else(|| RepositoryError::not_found("SecondSource", id))
    }

    /// 删除单条替代料
    ///
    /// # 返回
    /// - `Ok(false)`: 记录不存在
    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM second_source WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// 在已有事务内把替代料迁移到新的主料键
    pub fn rekey_main_item_with(
        conn: &Connection,
        revision_id: i64,
        old_key: &MainItemKey,
        new_key: &MainItemKey,
    ) -> RepositoryResult<usize> {
        let affected = conn.execute(
            "UPDATE second_source SET main_supplier = ?1, main_supplier_pn = ?2
             WHERE bom_revision_id = ?3 AND main_supplier = ?4 AND main_supplier_pn = ?5",
            params![
                new_key.supplier,
                new_key.supplier_pn,
                revision_id,
                old_key.supplier,
                old_key.supplier_pn
            ],
        )?;
        Ok(affected)
    }

    /// 在已有事务内删除某主料的全部替代料
    pub fn delete_by_main_item_with(
        conn: &Connection,
        revision_id: i64,
        key: &MainItemKey,
    ) -> RepositoryResult<usize> {
        let affected = conn.execute(
            "DELETE FROM second_source
             WHERE bom_revision_id = ?1 AND main_supplier = ?2 AND main_supplier_pn = ?3",
            params![revision_id, key.supplier, key.supplier_pn],
        )?;
        Ok(affected)
    }

    fn find_by_id_with(conn: &Connection, id: i64) -> RepositoryResult<Option<SecondSource>> {
        let ss = conn
            .query_row(
                &format!("SELECT {} FROM second_source WHERE id = ?1", SECOND_SOURCE_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(ss)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<SecondSource> {
        Ok(SecondSource {
            id: row.get(0)?,
            bom_revision_id: row.get(1)?,
            main_supplier: row.get(2)?,
            main_supplier_pn: row.get(3)?,
            hhpn: row.get(4)?,
            supplier: row.get(5)?,
            supplier_pn: row.get(6)?,
            description: row.get(7)?,
        })
    }
}
