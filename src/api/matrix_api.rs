// ==========================================
// BOM 矩阵管理系统 - Matrix API
// ==========================================
// 职责: 机种管理、选择保存、Matrix 汇总查询
// 说明: 未指定机种时优先使用配置 matrix/default_models，其次 Model A/B/C
// ==========================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::error::ApiResult;
use crate::config::config_manager::ConfigManager;
use crate::domain::matrix::{
    MatrixData, MatrixModel, MatrixSelection, MatrixSummary, NewMatrixModel, SelectionInput,
};
use crate::engine::matrix::MatrixEngine;
use crate::engine::store::BomRepositories;
use crate::repository::matrix_repo::MatrixRepository;

// ==========================================
// MatrixApi - Matrix API
// ==========================================
pub struct MatrixApi {
    bom: BomRepositories,
    matrix_repo: Arc<MatrixRepository>,
    config: Arc<ConfigManager>,
    engine: MatrixEngine,
}

impl MatrixApi {
    pub fn new(
        bom: BomRepositories,
        matrix_repo: Arc<MatrixRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            bom,
            matrix_repo,
            config,
            engine: MatrixEngine::new(),
        }
    }

    // ==========================================
    // 机种
    // ==========================================

    /// 创建机种
    ///
    /// # 参数
    /// - models: 为空时使用配置的默认机种；配置也为空时由引擎创建 Model A/B/C
    pub fn create_models(
        &self,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> ApiResult<Vec<MatrixModel>> {
        let configured;
        let models = if models.is_empty() {
            configured = self.config.get_default_models().unwrap_or_else(|e| {
                warn!(error = %e, "读取默认机种配置失败，使用内置默认值");
                Vec::new()
            });
            configured.as_slice()
        } else {
            models
        };

        Ok(self
            .engine
            .create_models(self.matrix_repo.as_ref(), revision_id, models)?)
    }

    pub fn list_models(&self, revision_id: i64) -> ApiResult<Vec<MatrixModel>> {
        Ok(self
            .engine
            .list_models(self.matrix_repo.as_ref(), revision_id)?)
    }

    pub fn update_model(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> ApiResult<MatrixModel> {
        Ok(self
            .engine
            .update_model(self.matrix_repo.as_ref(), id, name, description)?)
    }

    /// 删除机种；仍有选择记录时返回 BusinessRuleViolation
    pub fn delete_model(&self, id: i64) -> ApiResult<()> {
        Ok(self.engine.delete_model(self.matrix_repo.as_ref(), id)?)
    }

    // ==========================================
    // 选择
    // ==========================================

    pub fn save_selection(&self, input: &SelectionInput) -> ApiResult<MatrixSelection> {
        let selection = self
            .engine
            .save_selection(self.matrix_repo.as_ref(), input)?;
        info!(
            model_id = input.matrix_model_id,
            group_key = %input.group_key,
            selected_type = %input.selected_type,
            "已保存选择"
        );
        Ok(selection)
    }

    pub fn delete_selection(&self, model_id: i64, group_key: &str) -> ApiResult<()> {
        Ok(self
            .engine
            .delete_selection(self.matrix_repo.as_ref(), model_id, group_key)?)
    }

    // ==========================================
    // 汇总
    // ==========================================

    pub fn get_matrix_data(&self, revision_id: i64) -> ApiResult<MatrixData> {
        Ok(self
            .engine
            .get_matrix_data(&self.bom, self.matrix_repo.as_ref(), revision_id)?)
    }

    pub fn get_matrix_summary(&self, revision_id: i64) -> ApiResult<MatrixSummary> {
        Ok(self
            .engine
            .get_matrix_summary(&self.bom, self.matrix_repo.as_ref(), revision_id)?)
    }
}
