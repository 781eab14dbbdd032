// ==========================================
// BOM 矩阵管理系统 - BOM API
// ==========================================
// 职责: 系列/项目/版本管理、料件与替代料维护、视图查询
// 说明: 视图计算委托给 BomAggregationEngine，API 只做参数校验与错误转换
// ==========================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::group::{GroupKey, GroupedMainItem, MainItemKey};
use crate::domain::part::{NewPart, NewSecondSource, Part, PartUpdate, SecondSource, SecondSourceUpdate};
use crate::domain::project::{BomRevision, NewBomRevision, NewProject, Project, Series};
use crate::domain::types::BomMode;
use crate::engine::aggregation::BomAggregationEngine;
use crate::engine::store::BomRepositories;
use crate::engine::view_registry::{list_views, ViewDefinition};
use crate::repository::project_repo::{ProjectRepository, SeriesRepository};

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

// ==========================================
// BomApi - BOM API
// ==========================================

/// BOM API
///
/// 职责：
/// 1. 系列 / 项目 / 版本的增删改查
/// 2. 料件与替代料维护（单件与整组）
/// 3. 视图查询（按定义或按视图 id）
pub struct BomApi {
    series_repo: Arc<SeriesRepository>,
    project_repo: Arc<ProjectRepository>,
    bom: BomRepositories,
    aggregation: BomAggregationEngine,
}

impl BomApi {
    pub fn new(
        series_repo: Arc<SeriesRepository>,
        project_repo: Arc<ProjectRepository>,
        bom: BomRepositories,
    ) -> Self {
        Self {
            series_repo,
            project_repo,
            bom,
            aggregation: BomAggregationEngine::new(),
        }
    }

    // ==========================================
    // 系列
    // ==========================================

    pub fn create_series(&self, name: &str, description: Option<&str>) -> ApiResult<Series> {
        require_non_empty("系列名称", name)?;
        let series = self.series_repo.create(name.trim(), description)?;
        info!(series_id = series.id, "已创建系列");
        Ok(series)
    }

    pub fn list_series(&self) -> ApiResult<Vec<Series>> {
        Ok(self.series_repo.list_all()?)
    }

    pub fn delete_series(&self, id: i64) -> ApiResult<()> {
        if !self.series_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("Series(id={})不存在", id)));
        }
        Ok(())
    }

    // ==========================================
    // 项目
    // ==========================================

    pub fn create_project(&self, project: &NewProject) -> ApiResult<Project> {
        require_non_empty("项目名称", &project.name)?;
        let created = self.project_repo.create(project)?;
        info!(project_id = created.id, "已创建项目");
        Ok(created)
    }

    /// 查询项目列表；指定 series_id 时只返回该系列下的项目
    pub fn list_projects(&self, series_id: Option<i64>) -> ApiResult<Vec<Project>> {
        Ok(self.project_repo.list(series_id)?)
    }

    pub fn get_project(&self, id: i64) -> ApiResult<Project> {
        self.project_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Project(id={})不存在", id)))
    }

    pub fn update_project(
        &self,
        id: i64,
        name: Option<&str>,
        code: Option<Option<&str>>,
        description: Option<Option<&str>>,
    ) -> ApiResult<Project> {
        if let Some(name) = name {
            require_non_empty("项目名称", name)?;
        }
        Ok(self.project_repo.update(id, name, code, description)?)
    }

    /// 删除项目（级联删除其全部版本）
    pub fn delete_project(&self, id: i64) -> ApiResult<()> {
        if !self.project_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("Project(id={})不存在", id)));
        }
        info!(project_id = id, "已删除项目");
        Ok(())
    }

    // ==========================================
    // BOM 版本
    // ==========================================

    pub fn create_revision(&self, revision: &NewBomRevision) -> ApiResult<BomRevision> {
        require_non_empty("阶段", &revision.phase)?;
        require_non_empty("版本号", &revision.version)?;
        let created = self.bom.revision_repo.create(revision)?;
        info!(revision_id = created.id, mode = %created.mode, "已创建 BOM 版本");
        Ok(created)
    }

    pub fn list_revisions(&self, project_id: i64) -> ApiResult<Vec<BomRevision>> {
        Ok(self.bom.revision_repo.list_by_project(project_id)?)
    }

    pub fn get_revision(&self, id: i64) -> ApiResult<BomRevision> {
        self.bom
            .revision_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("BomRevision(id={})不存在", id)))
    }

    /// 切换版本模式（NPI ↔ MP），影响 ACTIVE/INACTIVE 的状态口径
    pub fn set_revision_mode(&self, id: i64, mode: BomMode) -> ApiResult<BomRevision> {
        let revision = self.bom.revision_repo.set_mode(id, mode)?;
        info!(revision_id = id, mode = %mode, "已切换版本模式");
        Ok(revision)
    }

    pub fn update_revision_description(
        &self,
        id: i64,
        description: Option<&str>,
    ) -> ApiResult<()> {
        Ok(self.bom.revision_repo.update_description(id, description)?)
    }

    /// 删除版本（级联删除料件、替代料、机种、选择）
    pub fn delete_revision(&self, id: i64) -> ApiResult<()> {
        if !self.bom.revision_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("BomRevision(id={})不存在", id)));
        }
        info!(revision_id = id, "已删除 BOM 版本");
        Ok(())
    }

    // ==========================================
    // 料件
    // ==========================================

    /// 查询版本下全部料件（导入顺序）
    pub fn list_parts(&self, revision_id: i64) -> ApiResult<Vec<Part>> {
        Ok(self.bom.part_repo.find_by_revision(revision_id)?)
    }

    pub fn find_group_parts(&self, revision_id: i64, key: &GroupKey) -> ApiResult<Vec<Part>> {
        Ok(self.bom.part_repo.find_by_group(revision_id, key)?)
    }

    /// 新增料件；同版本位置重复时返回 ConstraintViolation
    pub fn add_part(&self, part: &NewPart) -> ApiResult<Part> {
        require_non_empty("Supplier", &part.supplier)?;
        require_non_empty("Supplier PN", &part.supplier_pn)?;
        require_non_empty("Location", &part.location)?;
        Ok(self.bom.part_repo.insert(part)?)
    }

    pub fn update_part(&self, id: i64, update: &PartUpdate) -> ApiResult<Part> {
        Self::validate_part_update(update)?;
        Ok(self.bom.part_repo.update(id, update)?)
    }

    pub fn delete_part(&self, id: i64) -> ApiResult<()> {
        if !self.bom.part_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("Part(id={})不存在", id)));
        }
        Ok(())
    }

    /// 整组修改
    ///
    /// # 返回
    /// - Ok(usize): 更新的料件数（空更新为 0）
    pub fn update_group(
        &self,
        revision_id: i64,
        key: &GroupKey,
        update: &PartUpdate,
    ) -> ApiResult<usize> {
        Self::validate_part_update(update)?;
        let updated = self.bom.part_repo.update_group(revision_id, key, update)?;
        info!(revision_id, group = %key.main_item_key(), updated, "已修改料件分组");
        Ok(updated)
    }

    /// 整组删除
    ///
    /// # 返回
    /// - Ok(usize): 删除的料件数
    /// - Err(NotFound): 分组不存在
    pub fn delete_group(&self, revision_id: i64, key: &GroupKey) -> ApiResult<usize> {
        let deleted = self.bom.part_repo.delete_group(revision_id, key)?;
        if deleted == 0 {
            return Err(ApiError::NotFound(format!(
                "PartGroup(id={}/{:?})不存在",
                key.main_item_key(),
                key.part_type
            )));
        }
        info!(revision_id, group = %key.main_item_key(), deleted, "已删除料件分组");
        Ok(deleted)
    }

    fn validate_part_update(update: &PartUpdate) -> ApiResult<()> {
        if let Some(ref supplier) = update.supplier {
            require_non_empty("Supplier", supplier)?;
        }
        if let Some(ref supplier_pn) = update.supplier_pn {
            require_non_empty("Supplier PN", supplier_pn)?;
        }
        Ok(())
    }

    // ==========================================
    // 替代料
    // ==========================================

    pub fn list_second_sources(&self, revision_id: i64) -> ApiResult<Vec<SecondSource>> {
        Ok(self.bom.second_source_repo.find_by_revision(revision_id)?)
    }

    pub fn find_second_sources_by_main_item(
        &self,
        revision_id: i64,
        key: &MainItemKey,
    ) -> ApiResult<Vec<SecondSource>> {
        Ok(self
            .bom
            .second_source_repo
            .find_by_main_item(revision_id, key)?)
    }

    pub fn add_second_source(&self, second_source: &NewSecondSource) -> ApiResult<SecondSource> {
        require_non_empty("Main Supplier", &second_source.main_supplier)?;
        require_non_empty("Main Supplier PN", &second_source.main_supplier_pn)?;
        require_non_empty("Supplier", &second_source.supplier)?;
        require_non_empty("Supplier PN", &second_source.supplier_pn)?;
        Ok(self.bom.second_source_repo.insert(second_source)?)
    }

    pub fn update_second_source(
        &self,
        id: i64,
        update: &SecondSourceUpdate,
    ) -> ApiResult<SecondSource> {
        if let Some(ref supplier) = update.supplier {
            require_non_empty("Supplier", supplier)?;
        }
        if let Some(ref supplier_pn) = update.supplier_pn {
            require_non_empty("Supplier PN", supplier_pn)?;
        }
        Ok(self.bom.second_source_repo.update(id, update)?)
    }

    pub fn delete_second_source(&self, id: i64) -> ApiResult<()> {
        if !self.bom.second_source_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("SecondSource(id={})不存在", id)));
        }
        Ok(())
    }

    // ==========================================
    // 视图
    // ==========================================

    /// 视图定义列表（ALL, SMD, PTH, BOTTOM, NI, PROTO, MP, CCL）
    pub fn list_views(&self) -> Vec<ViewDefinition> {
        list_views()
    }

    pub fn execute_view(
        &self,
        revision_id: i64,
        view: &ViewDefinition,
    ) -> ApiResult<Vec<GroupedMainItem>> {
        let groups = self.aggregation.execute_view(&self.bom, revision_id, view)?;
        debug!(revision_id, view = view.id, groups = groups.len(), "视图查询完成");
        Ok(groups)
    }

    pub fn execute_view_by_id(
        &self,
        revision_id: i64,
        view_id: &str,
    ) -> ApiResult<Vec<GroupedMainItem>> {
        Ok(self
            .aggregation
            .execute_view_by_id(&self.bom, revision_id, view_id)?)
    }

    /// 不做状态/类型过滤的 SQL 侧聚合
    pub fn aggregated_view(&self, revision_id: i64) -> ApiResult<Vec<GroupedMainItem>> {
        // 版本不存在时返回 NotFound，而不是空列表
        self.get_revision(revision_id)?;
        Ok(self.bom.part_repo.aggregated_view(revision_id)?)
    }
}
