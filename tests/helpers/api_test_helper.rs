// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用环境与数据准备函数
// ==========================================

#![allow(dead_code)]

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use tempfile::NamedTempFile;

use bom_matrix::api::{BomApi, ConfigApi, ImportApi, MatrixApi};
use bom_matrix::app::AppState;
use bom_matrix::db::{open_shared_connection, SharedConnection};
use bom_matrix::domain::part::{NewPart, NewSecondSource};
use bom_matrix::domain::project::{BomRevision, NewBomRevision, NewProject, Project};
use bom_matrix::domain::types::{BomMode, BomStatus, CclFlag, PartType};

pub use test_helpers::{fixture_path, write_csv};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 与 AppState 相同的装配方式，额外暴露共享连接用于断言
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: SharedConnection,
    pub bom_api: Arc<BomApi>,
    pub matrix_api: Arc<MatrixApi>,
    pub import_api: Arc<ImportApi>,
    pub config_api: Arc<ConfigApi>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（临时数据库，已建表）
    pub fn new() -> Result<Self, String> {
        bom_matrix::logging::init_test();

        let (temp_file, db_path) = test_helpers::create_test_db()
            .map_err(|e| format!("创建测试数据库失败: {}", e))?;
        let conn = open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let state = AppState::from_connection(db_path.clone(), conn.clone());

        Ok(Self {
            db_path,
            conn,
            bom_api: state.bom_api,
            matrix_api: state.matrix_api,
            import_api: state.import_api,
            config_api: state.config_api,
            _temp_file: temp_file,
        })
    }

    /// 创建项目
    pub fn create_project(&self, name: &str) -> Project {
        self.bom_api
            .create_project(&NewProject {
                name: name.to_string(),
                ..Default::default()
            })
            .expect("创建项目失败")
    }

    /// 创建项目及一个空版本
    pub fn create_revision(&self, mode: BomMode) -> BomRevision {
        let project = self.create_project("P1");
        self.bom_api
            .create_revision(&NewBomRevision {
                project_id: project.id,
                phase: "EVT".to_string(),
                version: "1.0".to_string(),
                mode,
                description: None,
                source_filename: None,
            })
            .expect("创建版本失败")
    }

    /// 新增料件，返回 id
    pub fn add_part(&self, revision_id: i64, part: PartSpec) -> i64 {
        self.bom_api
            .add_part(&NewPart {
                bom_revision_id: revision_id,
                item: part.item,
                hhpn: None,
                supplier: part.supplier.to_string(),
                supplier_pn: part.supplier_pn.to_string(),
                description: None,
                location: part.location.to_string(),
                part_type: part.part_type,
                bom_status: part.status,
                ccl: part.ccl,
                remark: None,
            })
            .expect("新增料件失败")
            .id
    }

    /// 新增替代料，返回 id
    pub fn add_second_source(
        &self,
        revision_id: i64,
        main: (&str, &str),
        alternate: (&str, &str),
    ) -> i64 {
        self.bom_api
            .add_second_source(&NewSecondSource {
                bom_revision_id: revision_id,
                main_supplier: main.0.to_string(),
                main_supplier_pn: main.1.to_string(),
                hhpn: None,
                supplier: alternate.0.to_string(),
                supplier_pn: alternate.1.to_string(),
                description: None,
            })
            .expect("新增替代料失败")
            .id
    }

    /// 表行数（用于断言级联删除）
    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.conn.lock().expect("锁获取失败");
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .expect("计数失败")
    }
}

// ==========================================
// 测试数据构造
// ==========================================

/// 料件描述（默认 SMD / I / N）
#[derive(Debug, Clone, Copy)]
pub struct PartSpec {
    pub item: i64,
    pub supplier: &'static str,
    pub supplier_pn: &'static str,
    pub location: &'static str,
    pub part_type: Option<PartType>,
    pub status: BomStatus,
    pub ccl: CclFlag,
}

impl PartSpec {
    pub fn new(
        item: i64,
        supplier: &'static str,
        supplier_pn: &'static str,
        location: &'static str,
    ) -> Self {
        Self {
            item,
            supplier,
            supplier_pn,
            location,
            part_type: Some(PartType::Smd),
            status: BomStatus::I,
            ccl: CclFlag::N,
        }
    }

    pub fn part_type(mut self, part_type: Option<PartType>) -> Self {
        self.part_type = part_type;
        self
    }

    pub fn status(mut self, status: BomStatus) -> Self {
        self.status = status;
        self
    }

    pub fn critical(mut self) -> Self {
        self.ccl = CclFlag::Y;
        self
    }
}
