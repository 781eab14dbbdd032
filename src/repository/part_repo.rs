// ==========================================
// BOM 矩阵管理系统 - 料件仓储 (Part Store)
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束:
// - (bom_revision_id, location) 唯一，违反时原样返回 UniqueConstraintViolation
// - 分组级修改/删除在同一事务内完成，不留半更新状态
// - 主料键下已无料件时，同步删除其替代料（不保留孤儿）
// ==========================================

use std::collections::HashMap;

use crate::db::SharedConnection;
use crate::domain::group::{GroupKey, GroupedMainItem, MainItemKey};
use crate::domain::part::{NewPart, Part, PartUpdate};
use crate::domain::types::{BomStatus, CclFlag, PartType};
use crate::repository::db_utils::{
    begin, commit, parse_enum_column, parse_optional_enum_column, SetClause,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::second_source_repo::SecondSourceRepository;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

const PART_COLUMNS: &str = "id, bom_revision_id, item, hhpn, supplier, supplier_pn, \
                            description, location, type, bom_status, ccl, remark";

// ==========================================
// PartRepository - 料件仓储
// ==========================================
pub struct PartRepository {
    conn: SharedConnection,
}

impl PartRepository {
    /// 创建新的PartRepository实例
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入单个料件
    pub fn insert(&self, part: &NewPart) -> RepositoryResult<Part> {
        let conn = self.get_conn()?;
        let id = Self::insert_with(&conn, part)?;
        Self::find_by_id_with(&conn, id)?.ok_or_else(|| RepositoryError::not_found("Part", id))
    }

    /// 批量插入（单事务，任一失败整体回滚）
    ///
    /// # 返回
    /// - `Ok(count)`: 插入条数
    pub fn bulk_insert(&self, parts: &[NewPart]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;
        let count = Self::bulk_insert_with(&tx, parts)?;
        commit(tx)?;
        Ok(count)
    }

    /// 在已有事务内批量插入
    pub fn bulk_insert_with(conn: &Connection, parts: &[NewPart]) -> RepositoryResult<usize> {
        let mut stmt = conn.prepare(
            r#"INSERT INTO part (
                bom_revision_id, item, hhpn, supplier, supplier_pn,
                description, location, type, bom_status, ccl, remark
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
        )?;

        let mut count = 0;
        for part in parts {
            stmt.execute(params![
                part.bom_revision_id,
                part.item,
                part.hhpn,
                part.supplier,
                part.supplier_pn,
                part.description,
                part.location,
                part.part_type.map(|t| t.as_str()),
                part.bom_status.as_str(),
                part.ccl.as_str(),
                part.remark,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_with(conn: &Connection, part: &NewPart) -> RepositoryResult<i64> {
        Self::bulk_insert_with(conn, std::slice::from_ref(part))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Part>> {
        let conn = self.get_conn()?;
        Self::find_by_id_with(&conn, id)
    }

    /// 查询版本下全部料件（按 id 升序，即导入顺序）
    pub fn find_by_revision(&self, revision_id: i64) -> RepositoryResult<Vec<Part>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM part WHERE bom_revision_id = ?1 ORDER BY id ASC",
            PART_COLUMNS
        ))?;
        let parts = stmt
            .query_map(params![revision_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts)
    }

    /// 查询同一分组的全部料件；type 为空时只匹配 type 为空的料件
    pub fn find_by_group(&self, revision_id: i64, key: &GroupKey) -> RepositoryResult<Vec<Part>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM part
             WHERE bom_revision_id = ?1 AND supplier = ?2 AND supplier_pn = ?3 AND type IS ?4
             ORDER BY id ASC",
            PART_COLUMNS
        ))?;
        let parts = stmt
            .query_map(
                params![
                    revision_id,
                    key.supplier,
                    key.supplier_pn,
                    key.part_type.map(|t| t.as_str())
                ],
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts)
    }

    /// 更新单个料件
    ///
    /// 说明: 单件修改不迁移替代料；替代料随分组修改 (update_group) 一起迁移
    pub fn update(&self, id: i64, update: &PartUpdate) -> RepositoryResult<Part> {
        let conn = self.get_conn()?;

        let set = Self::build_set_clause(update);
        if !set.is_empty() {
            let sql = format!("UPDATE part SET {} WHERE id = ?", set.sql());
            let affected =
                conn.execute(&sql, params_from_iter(set.into_params(vec![Value::Integer(id)])))?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Part", id));
            }
        }

        Self::find_by_id_with(&conn, id)?.ok_or_else(|| RepositoryError::not_found("Part", id))
    }

    /// 更新整组料件（单事务）
    ///
    /// - 组内所有料件应用同一更新
    /// - 若修改了 supplier/supplier_pn，且旧主料键下已无料件，则替代料随之迁移到新主料键
    ///
    /// # 返回
    /// - `Ok(count)`: 更新的料件数
    /// - `Err(NotFound)`: 分组不存在
    pub fn update_group(
        &self,
        revision_id: i64,
        key: &GroupKey,
        update: &PartUpdate,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;

        let member_count = Self::count_group_with(&tx, revision_id, key)?;
        if member_count == 0 {
            return Err(RepositoryError::not_found(
                "PartGroup",
                format!("{}/{:?}", key.main_item_key(), key.part_type),
            ));
        }

        let set = Self::build_set_clause(update);
        if set.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE part SET {} WHERE bom_revision_id = ? AND supplier = ? AND supplier_pn = ? AND type IS ?",
            set.sql()
        );
        let where_params = vec![
            Value::Integer(revision_id),
            Value::Text(key.supplier.clone()),
            Value::Text(key.supplier_pn.clone()),
            key.part_type
                .map(|t| Value::Text(t.as_str().to_string()))
                .unwrap_or(Value::Null),
        ];
        let updated = tx.execute(&sql, params_from_iter(set.into_params(where_params)))?;

        if update.changes_main_item_key() {
            let old_key = key.main_item_key();
            let new_key = update.apply_to_main_item_key(&old_key);
            if old_key != new_key && Self::count_main_item_with(&tx, revision_id, &old_key)? == 0 {
                SecondSourceRepository::rekey_main_item_with(&tx, revision_id, &old_key, &new_key)?;
            }
        }

        commit(tx)?;
        Ok(updated)
    }

    /// 删除单个料件；若其主料键下已无料件，同步删除替代料
    ///
    /// # 返回
    /// - `Ok(true)`: 删除成功
    /// - `Ok(false)`: 料件不存在
    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;

        let part = match Self::find_by_id_with(&tx, id)? {
            Some(p) => p,
            None => return Ok(false),
        };

        tx.execute("DELETE FROM part WHERE id = ?1", params![id])?;
        Self::remove_orphan_second_sources_with(&tx, part.bom_revision_id, &part.main_item_key())?;

        commit(tx)?;
        Ok(true)
    }

    /// 删除整组料件（单事务）；主料键下已无料件时同步删除替代料
    ///
    /// # 返回
    /// - `Ok(count)`: 删除的料件数（0 表示分组不存在）
    pub fn delete_group(&self, revision_id: i64, key: &GroupKey) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;

        let deleted = tx.execute(
            "DELETE FROM part
             WHERE bom_revision_id = ?1 AND supplier = ?2 AND supplier_pn = ?3 AND type IS ?4",
            params![
                revision_id,
                key.supplier,
                key.supplier_pn,
                key.part_type.map(|t| t.as_str())
            ],
        )?;
        if deleted > 0 {
            Self::remove_orphan_second_sources_with(&tx, revision_id, &key.main_item_key())?;
        }

        commit(tx)?;
        Ok(deleted)
    }

    /// 删除版本下全部料件及替代料
    pub fn delete_by_revision(&self, revision_id: i64) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;
        let deleted = tx.execute("DELETE FROM part WHERE bom_revision_id = ?1", params![revision_id])?;
        tx.execute(
            "DELETE FROM second_source WHERE bom_revision_id = ?1",
            params![revision_id],
        )?;
        commit(tx)?;
        Ok(deleted)
    }

    /// SQL 侧聚合（不做状态/类型过滤），结果按最小项次升序
    pub fn aggregated_view(&self, revision_id: i64) -> RepositoryResult<Vec<GroupedMainItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT MIN(id), supplier, supplier_pn, type,
                   MAX(hhpn), MAX(description), MIN(bom_status), MAX(ccl), MAX(remark),
                   GROUP_CONCAT(location, ','), COUNT(*), MIN(item)
            FROM (SELECT * FROM part WHERE bom_revision_id = ?1 ORDER BY id ASC)
            GROUP BY supplier, supplier_pn, type
            ORDER BY MIN(item) ASC, MIN(id) ASC
            "#,
        )?;

        let mut groups = stmt
            .query_map(params![revision_id], |row| {
                let part_type: Option<String> = row.get(3)?;
                let status: String = row.get(6)?;
                let ccl: String = row.get(7)?;
                Ok(GroupedMainItem {
                    id: row.get(0)?,
                    supplier: row.get(1)?,
                    supplier_pn: row.get(2)?,
                    part_type: parse_optional_enum_column(3, part_type, PartType::parse)?,
                    hhpn: row.get(4)?,
                    description: row.get(5)?,
                    bom_status: parse_enum_column(6, &status, BomStatus::parse)?,
                    ccl: parse_enum_column(7, &ccl, CclFlag::parse)?,
                    remark: row.get(8)?,
                    locations: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                    quantity: row.get(10)?,
                    item: row.get(11)?,
                    second_sources: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_key = HashMap::new();
        for ss in SecondSourceRepository::find_by_revision_with(&conn, revision_id)? {
            by_key
                .entry(ss.main_item_key())
                .or_insert_with(Vec::new)
                .push(ss);
        }
        for group in groups.iter_mut() {
            if let Some(list) = by_key.get(&group.main_item_key()) {
                group.second_sources = list.clone();
            }
        }

        Ok(groups)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn build_set_clause(update: &PartUpdate) -> SetClause {
        let mut set = SetClause::new();
        if let Some(item) = update.item {
            set.integer("item", item);
        }
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
        if let Some(part_type) = &update.part_type {
            set.nullable_text("type", part_type.map(|t| t.as_str()));
        }
        if let Some(status) = update.bom_status {
            set.text("bom_status", status.as_str());
        }
        if let Some(ccl) = update.ccl {
            set.text("ccl", ccl.as_str());
        }
        if let Some(remark) = &update.remark {
            set.nullable_text("remark", remark.as_deref());
        }
        set
    }

    fn count_group_with(conn: &Connection, revision_id: i64, key: &GroupKey) -> RepositoryResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM part
             WHERE bom_revision_id = ?1 AND supplier = ?2 AND supplier_pn = ?3 AND type IS ?4",
            params![
                revision_id,
                key.supplier,
                key.supplier_pn,
                key.part_type.map(|t| t.as_str())
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_main_item_with(
        conn: &Connection,
        revision_id: i64,
        key: &MainItemKey,
    ) -> RepositoryResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM part WHERE bom_revision_id = ?1 AND supplier = ?2 AND supplier_pn = ?3",
            params![revision_id, key.supplier, key.supplier_pn],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn remove_orphan_second_sources_with(
        conn: &Connection,
        revision_id: i64,
        key: &MainItemKey,
    ) -> RepositoryResult<usize> {
        if Self::count_main_item_with(conn, revision_id, key)? > 0 {
            return Ok(0);
        }
        SecondSourceRepository::delete_by_main_item_with(conn, revision_id, key)
    }

    fn find_by_id_with(conn: &Connection, id: i64) -> RepositoryResult<Option<Part>> {
        let part = conn
            .query_row(
                &format!("SELECT {} FROM part WHERE id = ?1", PART_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(part)
    }

    /// 映射数据库行到Part对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Part> {
        let part_type: Option<String> = row.get(8)?;
        let status: String = row.get(9)?;
        let ccl: String = row.get(10)?;
        Ok(Part {
            id: row.get(0)?,
            bom_revision_id: row.get(1)?,
            item: row.get(2)?,
            hhpn: row.get(3)?,
            supplier: row.get(4)?,
            supplier_pn: row.get(5)?,
            description: row.get(6)?,
            location: row.get(7)?,
            part_type: parse_optional_enum_column(8, part_type, PartType::parse)?,
            bom_status: parse_enum_column(9, &status, BomStatus::parse)?,
            ccl: parse_enum_column(10, &ccl, CclFlag::parse)?,
            remark: row.get(11)?,
        })
    }
}
