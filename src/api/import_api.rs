// ==========================================
// BOM 矩阵管理系统 - 导入 / 导出 API
// ==========================================
// 职责: 封装 BOM 文件导入与视图 CSV 导出
// ==========================================

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::db::SharedConnection;
use crate::engine::aggregation::BomAggregationEngine;
use crate::engine::store::BomRepositories;
use crate::importer::bom_exporter::export_view_csv;
use crate::importer::bom_importer::{BomImporter, ImportReport, ImportRequest};
use crate::repository::project_repo::ProjectRepository;

/// 导入API响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportApiResponse {
    #[serde(flatten)]
    pub report: ImportReport,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导出API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportApiResponse {
    pub path: String,
    pub view_id: String,
    /// 导出的主料分组数
    pub groups: usize,
    /// 写入的数据行数（含替代料行）
    pub rows: usize,
}

// ==========================================
// ImportApi - 导入 / 导出 API
// ==========================================
pub struct ImportApi {
    conn: SharedConnection,
    project_repo: Arc<ProjectRepository>,
    bom: BomRepositories,
    config: Arc<ConfigManager>,
}

impl ImportApi {
    pub fn new(
        conn: SharedConnection,
        project_repo: Arc<ProjectRepository>,
        bom: BomRepositories,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            project_repo,
            bom,
            config,
        }
    }

    /// 导入 BOM 文件，创建新版本
    ///
    /// # 参数
    /// - file_path: .xlsx / .xls / .csv 文件路径
    /// - project_id: 目标项目
    /// - phase / version: 版本标识，(project, phase, version) 唯一
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入报告（含行级警告）
    /// - Err(ImportError): 文件无法解析或没有可导入的料件
    /// - Err(ConstraintViolation): 版本已存在
    pub fn import_bom(
        &self,
        file_path: &str,
        project_id: i64,
        phase: &str,
        version: &str,
        description: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        if phase.trim().is_empty() || version.trim().is_empty() {
            return Err(ApiError::InvalidInput("阶段与版本号不能为空".to_string()));
        }
        if self.project_repo.find_by_id(project_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Project(id={})不存在", project_id)));
        }

        let sheet_name = self.config.get_import_sheet_name().unwrap_or_else(|e| {
            warn!(error = %e, "读取导入工作表配置失败，使用第一个工作表");
            None
        });

        let start = Instant::now();
        let importer = BomImporter::new(self.conn.clone(), sheet_name);
        let report = importer.import_file(
            Path::new(file_path),
            &ImportRequest {
                project_id,
                phase: phase.trim().to_string(),
                version: version.trim().to_string(),
                description: description.map(str::to_string),
            },
        )?;

        let elapsed_ms = start.elapsed().as_millis() as i64;
        info!(
            revision_id = report.revision_id,
            parts = report.part_count,
            second_sources = report.second_source_count,
            warnings = report.warnings.len(),
            elapsed_ms,
            "BOM 导入完成"
        );
        Ok(ImportApiResponse { report, elapsed_ms })
    }

    /// 将视图导出为 CSV（布局与导入一致）
    pub fn export_view_csv(
        &self,
        revision_id: i64,
        view_id: &str,
        path: &str,
    ) -> ApiResult<ExportApiResponse> {
        if path.trim().is_empty() {
            return Err(ApiError::InvalidInput("导出路径不能为空".to_string()));
        }

        let groups = BomAggregationEngine::new().execute_view_by_id(&self.bom, revision_id, view_id)?;
        let rows = export_view_csv(Path::new(path), &groups)?;

        info!(revision_id, view = view_id, groups = groups.len(), rows, "视图已导出");
        Ok(ExportApiResponse {
            path: path.to_string(),
            view_id: view_id.to_string(),
            groups: groups.len(),
            rows,
        })
    }
}
