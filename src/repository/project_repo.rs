// ==========================================
// BOM 矩阵管理系统 - 系列 / 项目 / BOM 版本仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 级联: 删除项目 → 版本 → 料件/替代料/机种/选择（外键 ON DELETE CASCADE）
// ==========================================

use crate::db::SharedConnection;
use crate::domain::project::{BomRevision, NewBomRevision, NewProject, Project, Series};
use crate::domain::types::BomMode;
use crate::repository::db_utils::{parse_enum_column, SetClause};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

fn lock(conn: &SharedConnection) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

// ==========================================
// SeriesRepository - 产品系列仓储
// ==========================================
pub struct SeriesRepository {
    conn: SharedConnection,
}

impl SeriesRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn create(&self, name: &str, description: Option<&str>) -> RepositoryResult<Series> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO series (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        let id = conn.last_insert_rowid();
        Self::find_by_id_with(&conn, id)?.ok_or_else(|| RepositoryError::not_found("Series", id))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Series>> {
        let conn = lock(&self.conn)?;
        Self::find_by_id_with(&conn, id)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Series>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at FROM series ORDER BY name ASC",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 删除系列；项目的 series_id 置空
    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM series WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn find_by_id_with(conn: &Connection, id: i64) -> RepositoryResult<Option<Series>> {
        let series = conn
            .query_row(
                "SELECT id, name, description, created_at FROM series WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(series)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Series> {
        Ok(Series {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

// ==========================================
// ProjectRepository - 项目仓储
// ==========================================
pub struct ProjectRepository {
    conn: SharedConnection,
}

const PROJECT_COLUMNS: &str =
    "id, series_id, name, code, description, created_at, updated_at";

impl ProjectRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn create(&self, project: &NewProject) -> RepositoryResult<Project> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO project (series_id, name, code, description) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.series_id,
                project.name,
                project.code,
                project.description
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::find_by_id_with(&conn, id)?.ok_or_else(|| RepositoryError::not_found("Project", id))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Project>> {
        let conn = lock(&self.conn)?;
        Self::find_by_id_with(&conn, id)
    }

    /// 查询项目；series_id 为 None 时返回全部
    pub fn list(&self, series_id: Option<i64>) -> RepositoryResult<Vec<Project>> {
        let conn = lock(&self.conn)?;
        let projects = match series_id {
            Some(sid) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM project WHERE series_id = ?1 ORDER BY name ASC",
                    PROJECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![sid], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM project ORDER BY name ASC",
                    PROJECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(projects)
    }

    /// 更新项目名称/代码/描述
    pub fn update(
        &self,
        id: i64,
        name: Option<&str>,
        code: Option<Option<&str>>,
        description: Option<Option<&str>>,
    ) -> RepositoryResult<Project> {
        let conn = lock(&self.conn)?;

        let mut set = SetClause::new();
        if let Some(name) = name {
            set.text("name", name);
        }
        if let Some(code) = code {
            set.nullable_text("code", code);
        }
        if let Some(description) = description {
            set.nullable_text("description", description);
        }

        if !set.is_empty() {
            let sql = format!(
                "UPDATE project SET {}, updated_at = datetime('now') WHERE id = ?",
                set.sql()
            );
            let affected =
                conn.execute(&sql, params_from_iter(set.into_params(vec![Value::Integer(id)])))?;
            if affected == 0 {
                return Err(RepositoryError::not_found("Project", id));
            }
        }

        Self::find_by_id_with(&conn, id)?.ok_or_else(|| RepositoryError::not_found("Project", id))
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM project WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn find_by_id_with(conn: &Connection, id: i64) -> RepositoryResult<Option<Project>> {
        let project = conn
            .query_row(
                &format!("SELECT {} FROM project WHERE id = ?1", PROJECT_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(project)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            series_id: row.get(1)?,
            name: row.get(2)?,
            code: row.get(3)?,
            description: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

// ==========================================
// BomRevisionRepository - BOM 版本仓储
// ==========================================
pub struct BomRevisionRepository {
    conn: SharedConnection,
}

const REVISION_COLUMNS: &str = "id, project_id, phase, version, mode, description, \
                                source_filename, created_at, updated_at";

impl BomRevisionRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn create(&self, revision: &NewBomRevision) -> RepositoryResult<BomRevision> {
        let conn = lock(&self.conn)?;
        let id = Self::insert_with(&conn, revision)?;
        Self::find_by_id_with(&conn, id)?
            .ok_or_else(|| RepositoryError::not_found("BomRevision", id))
    }

    /// 在已有连接/事务内插入版本，返回新 id
    pub fn insert_with(conn: &Connection, revision: &NewBomRevision) -> RepositoryResult<i64> {
        conn.execute(
            r#"INSERT INTO bom_revision (
                project_id, phase, version, mode, description, source_filename
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                revision.project_id,
                revision.phase,
                revision.version,
                revision.mode.as_str(),
                revision.description,
                revision.source_filename,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<BomRevision>> {
        let conn = lock(&self.conn)?;
        Self::find_by_id_with(&conn, id)
    }

    pub fn list_by_project(&self, project_id: i64) -> RepositoryResult<Vec<BomRevision>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bom_revision WHERE project_id = ?1 ORDER BY created_at DESC, id DESC",
            REVISION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 切换 NPI / MP 模式
    pub fn set_mode(&self, id: i64, mode: BomMode) -> RepositoryResult<BomRevision> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE bom_revision SET mode = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![mode.as_str(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("BomRevision", id));
        }
        Self::find_by_id_with(&conn, id)?
            .ok_or_else(|| RepositoryError::not_found("BomRevision", id))
    }

    pub fn update_description(&self, id: i64, description: Option<&str>) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE bom_revision SET description = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![description, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("BomRevision", id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute("DELETE FROM bom_revision WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn find_by_id_with(conn: &Connection, id: i64) -> RepositoryResult<Option<BomRevision>> {
        let revision = conn
            .query_row(
                &format!("SELECT {} FROM bom_revision WHERE id = ?1", REVISION_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(revision)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<BomRevision> {
        let mode: String = row.get(4)?;
        Ok(BomRevision {
            id: row.get(0)?,
            project_id: row.get(1)?,
            phase: row.get(2)?,
            version: row.get(3)?,
            mode: parse_enum_column(4, &mode, BomMode::parse)?,
            description: row.get(5)?,
            source_filename: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
