// ==========================================
// BOM 矩阵管理系统 - Matrix 机种 / 选择仓储
// ==========================================
// 约束:
// - matrix_selection (matrix_model_id, group_key) 唯一，保存为 upsert
// - “有选择记录不可删除机种”属于引擎规则，不在此处校验
// ==========================================

use crate::db::SharedConnection;
use crate::domain::matrix::{MatrixModel, MatrixSelection, NewMatrixModel, SelectionInput};
use crate::domain::types::SelectedType;
use crate::repository::db_utils::{begin, commit, parse_enum_column, SetClause};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

const MODEL_COLUMNS: &str = "id, bom_revision_id, name, description, created_at";
const SELECTION_COLUMNS: &str =
    "s.id, s.matrix_model_id, s.group_key, s.selected_type, s.selected_id, s.updated_at";

// ==========================================
// MatrixRepository - 机种与选择仓储
// ==========================================
pub struct MatrixRepository {
    conn: SharedConnection,
}

impl MatrixRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 机种
    // ==========================================

    /// 批量创建机种（单事务）
    pub fn create_models(
        &self,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> RepositoryResult<Vec<MatrixModel>> {
        let mut conn = self.get_conn()?;
        let tx = begin(&mut conn)?;

        let mut ids = Vec::with_capacity(models.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO matrix_model (bom_revision_id, name, description) VALUES (?1, ?2, ?3)",
            )?;
            for model in models {
                stmt.execute(params![revision_id, model.name, model.description])?;
                ids.push(tx.last_insert_rowid());
            }
        }

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            let model = Self::find_model_with(&tx, id)?
                .ok_or_else(|| RepositoryError::not_found("MatrixModel", id))?;
            created.push(model);
        }

        commit(tx)?;
        Ok(created)
    }

    pub fn find_model(&self, id: i64) -> RepositoryResult<Option<MatrixModel>> {
        let conn = self.get_conn()?;
        Self::find_model_with(&conn, id)
    }

    /// 查询版本下全部机种（按 id 升序）
    pub fn find_models_by_revision(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixModel>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM matrix_model WHERE bom_revision_id = ?1 ORDER BY id ASC",
            MODEL_COLUMNS
        ))?;
        let models = stmt
            .query_map(params![revision_id], Self::map_model_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    pub fn update_model(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> RepositoryResult<MatrixModel> {
        let conn = self.get_conn()?;

        let mut set = SetClause::new();
        if let Some(name) = name {
            set.text("name", name);
        }
        if let Some(description) = description {
            set.nullable_text("description", description);
        }
        if !set.is_empty() {
            let sql = format!("UPDATE matrix_model SET {} WHERE id = ?", set.sql());
            let affected =
                conn.execute(&sql, params_from_iter(set.into_params(vec![Value::Integer(id)])))?;
            if affected == 0 {
                return Err(RepositoryError::not_found("MatrixModel", id));
            }
        }

        Self::find_model_with(&conn, id)?
            .ok_or_else(|| RepositoryError::not_found("MatrixModel", id))
    }

    /// 删除机种，返回受影响行数
    pub fn delete_model(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM matrix_model WHERE id = ?1", params![id])?;
        Ok(affected)
    }

    pub fn count_selections_for_model(&self, model_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM matrix_selection WHERE matrix_model_id = ?1",
            params![model_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 选择
    // ==========================================

    /// upsert: (matrix_model_id, group_key) 已存在则覆盖选定对象
    pub fn upsert_selection(&self, input: &SelectionInput) -> RepositoryResult<MatrixSelection> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO matrix_selection (matrix_model_id, group_key, selected_type, selected_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(matrix_model_id, group_key) DO UPDATE SET
                selected_type = excluded.selected_type,
                selected_id = excluded.selected_id,
                updated_at = datetime('now')
            "#,
            params![
                input.matrix_model_id,
                input.group_key,
                input.selected_type.as_str(),
                input.selected_id
            ],
        )?;

        Self::find_selection_with(&conn, input.matrix_model_id, &input.group_key)?.ok_or_else(
            || {
                RepositoryError::not_found(
                    "MatrixSelection",
                    format!("{}/{}", input.matrix_model_id, input.group_key),
                )
            },
        )
    }

    pub fn find_selection(
        &self,
        model_id: i64,
        group_key: &str,
    ) -> RepositoryResult<Option<MatrixSelection>> {
        let conn = self.get_conn()?;
        Self::find_selection_with(&conn, model_id, group_key)
    }

    /// 查询版本下全部显式选择（跨机种联表）
    pub fn find_selections_by_revision(
        &self,
        revision_id: i64,
    ) -> RepositoryResult<Vec<MatrixSelection>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM matrix_selection s
             JOIN matrix_model m ON m.id = s.matrix_model_id
             WHERE m.bom_revision_id = ?1
             ORDER BY s.matrix_model_id ASC, s.id ASC",
            SELECTION_COLUMNS
        ))?;
        let list = stmt
            .query_map(params![revision_id], Self::map_selection_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(list)
    }

    /// 删除选择；不存在时返回 0，不视为错误
    pub fn delete_selection(&self, model_id: i64, group_key: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM matrix_selection WHERE matrix_model_id = ?1 AND group_key = ?2",
            params![model_id, group_key],
        )?;
        Ok(affected)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn find_model_with(conn: &Connection, id: i64) -> RepositoryResult<Option<MatrixModel>> {
        let model = conn
            .query_row(
                &format!("SELECT {} FROM matrix_model WHERE id = ?1", MODEL_COLUMNS),
                params![id],
                Self::map_model_row,
            )
            .optional()?;
        Ok(model)
    }

    fn find_selection_with(
        conn: &Connection,
        model_id: i64,
        group_key: &str,
    ) -> RepositoryResult<Option<MatrixSelection>> {
        let sel = conn
            .query_row(
                &format!(
                    "SELECT {} FROM matrix_selection s WHERE s.matrix_model_id = ?1 AND s.group_key = ?2",
                    SELECTION_COLUMNS
                ),
                params![model_id, group_key],
                Self::map_selection_row,
            )
            .optional()?;
        Ok(sel)
    }

    fn map_model_row(row: &rusqlite::Row) -> rusqlite::Result<MatrixModel> {
        Ok(MatrixModel {
            id: row.get(0)?,
            bom_revision_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn map_selection_row(row: &rusqlite::Row) -> rusqlite::Result<MatrixSelection> {
        let selected_type: String = row.get(3)?;
        Ok(MatrixSelection {
            id: row.get(0)?,
            matrix_model_id: row.get(1)?,
            group_key: row.get(2)?,
            selected_type: parse_enum_column(3, &selected_type, SelectedType::parse)?,
            selected_id: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}
