// ==========================================
// BOM 矩阵管理系统 - Matrix 一致性引擎
// ==========================================
// 输入: 版本 id，BOM 数据源 + 机种/选择存储
// 输出: MatrixData { models, selections(显式+隐式), summary, groups }
// 规则:
// - 只管 ACTIVE 且 CCL=Y 的主料组，每组都计入 totalGroups
// - 选择按主料键 (supplier|supplier_pn) 存储，同键的多个组共用一条显式选择
// - 显式选择优先；无显式选择且无替代料的组自动生成隐式选择
// - 隐式选择每次读取时重算，不落库
// - isComplete = selectedCount == totalGroups && totalGroups > 0
// ==========================================

use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

use crate::domain::group::GroupedMainItem;
use crate::domain::matrix::{
    MatrixData, MatrixModel, MatrixSelection, MatrixSelectionView, MatrixSummary, ModelStatus,
    NewMatrixModel, SelectionInput,
};
use crate::domain::types::SelectedType;
use crate::engine::aggregation::BomAggregationEngine;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::store::{BomSource, MatrixStore};
use crate::engine::view_registry::ViewDefinition;
use crate::i18n::default_model_description;

/// 未指定机种时的默认名称
pub const DEFAULT_MODEL_NAMES: [&str; 3] = ["Model A", "Model B", "Model C"];

/// 默认机种列表（Model A/B/C）
pub fn default_models() -> Vec<NewMatrixModel> {
    DEFAULT_MODEL_NAMES
        .iter()
        .map(|name| NewMatrixModel {
            name: name.to_string(),
            description: Some(default_model_description(name)),
        })
        .collect()
}

// ==========================================
// MatrixEngine - Matrix 一致性引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct MatrixEngine {
    aggregation: BomAggregationEngine,
}

impl MatrixEngine {
    pub fn new() -> Self {
        Self {
            aggregation: BomAggregationEngine::new(),
        }
    }

    // ==========================================
    // 机种
    // ==========================================

    /// 创建机种；models 为空时创建 Model A/B/C
    ///
    /// 不与已有同名机种去重
    pub fn create_models(
        &self,
        store: &dyn MatrixStore,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> EngineResult<Vec<MatrixModel>> {
        let created = if models.is_empty() {
            store.create_models(revision_id, &default_models())?
        } else {
            store.create_models(revision_id, models)?
        };
        tracing::info!(revision_id, models = created.len(), "已创建机种");
        Ok(created)
    }

    pub fn list_models(
        &self,
        store: &dyn MatrixStore,
        revision_id: i64,
    ) -> EngineResult<Vec<MatrixModel>> {
        Ok(store.find_models(revision_id)?)
    }

    /// # 返回
    /// - `Err(NotFound)`: 机种不存在
    pub fn update_model(
        &self,
        store: &dyn MatrixStore,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> EngineResult<MatrixModel> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(EngineError::Validation("机种名称不能为空".to_string()));
            }
        }
        Ok(store.update_model(id, name, description)?)
    }

    /// 删除机种
    ///
    /// # 返回
    /// - `Err(Validation)`: 机种仍有选择记录
    /// - `Err(NotFound)`: 机种不存在
    pub fn delete_model(&self, store: &dyn MatrixStore, id: i64) -> EngineResult<()> {
        let selections = store.count_selections_for_model(id)?;
        if selections > 0 {
            return Err(EngineError::Validation(format!(
                "机种 {} 仍有 {} 条选择记录，无法删除",
                id, selections
            )));
        }

        if store.delete_model(id)? == 0 {
            return Err(EngineError::not_found("MatrixModel", id));
        }
        tracing::info!(model_id = id, "已删除机种");
        Ok(())
    }

    // ==========================================
    // 选择
    // ==========================================

    /// 保存选择（upsert）；不校验被选对象是否存在
    pub fn save_selection(
        &self,
        store: &dyn MatrixStore,
        input: &SelectionInput,
    ) -> EngineResult<MatrixSelection> {
        let previous = store.find_selection(input.matrix_model_id, &input.group_key)?;
        let saved = store.upsert_selection(input)?;
        match previous {
            Some(prev) => tracing::info!(
                model_id = saved.matrix_model_id,
                group_key = %saved.group_key,
                from = %format!("{}:{}", prev.selected_type, prev.selected_id),
                to = %format!("{}:{}", saved.selected_type, saved.selected_id),
                "覆盖选择"
            ),
            None => tracing::info!(
                model_id = saved.matrix_model_id,
                group_key = %saved.group_key,
                "新增选择"
            ),
        }
        Ok(saved)
    }

    /// 删除选择；不存在也视为成功
    pub fn delete_selection(
        &self,
        store: &dyn MatrixStore,
        model_id: i64,
        group_key: &str,
    ) -> EngineResult<()> {
        let deleted = store.delete_selection(model_id, group_key)?;
        tracing::debug!(model_id, group_key, deleted, "删除选择");
        Ok(())
    }

    // ==========================================
    // 汇总
    // ==========================================

    /// 计算 Matrix 数据
    ///
    /// # 返回
    /// - `Err(NotFound)`: 版本不存在
    #[instrument(skip(self, source, store), fields(revision_id = %revision_id))]
    pub fn get_matrix_data(
        &self,
        source: &dyn BomSource,
        store: &dyn MatrixStore,
        revision_id: i64,
    ) -> EngineResult<MatrixData> {
        let groups = self
            .aggregation
            .execute_view(source, revision_id, &ViewDefinition::matrix())?;
        let models = store.find_models(revision_id)?;
        let explicit = store.find_selections(revision_id)?;

        let data = compute_matrix(groups, models, explicit);
        tracing::debug!(
            groups = data.summary.total_groups,
            models = data.models.len(),
            is_safe = data.summary.is_safe,
            "Matrix 计算完成"
        );
        Ok(data)
    }

    pub fn get_matrix_summary(
        &self,
        source: &dyn BomSource,
        store: &dyn MatrixStore,
        revision_id: i64,
    ) -> EngineResult<MatrixSummary> {
        Ok(self.get_matrix_data(source, store, revision_id)?.summary)
    }
}

/// Matrix 纯计算
///
/// - `groups`: ACTIVE + CCL=Y 的聚合结果
/// - `explicit`: 版本下全部显式选择；组键已失效的选择原样返回但不计数
pub fn compute_matrix(
    groups: Vec<GroupedMainItem>,
    models: Vec<MatrixModel>,
    explicit: Vec<MatrixSelection>,
) -> MatrixData {
    let rows = groups;
    let row_keys: Vec<String> = rows
        .iter()
        .map(|g| g.main_item_key().to_storage_key())
        .collect();

    let explicit_index: HashMap<(i64, &str), &MatrixSelection> = explicit
        .iter()
        .map(|s| ((s.matrix_model_id, s.group_key.as_str()), s))
        .collect();

    let mut implicit = Vec::new();
    let mut model_status = BTreeMap::new();
    for model in &models {
        let mut selected_count = 0;
        for (row, key) in rows.iter().zip(&row_keys) {
            if explicit_index.contains_key(&(model.id, key.as_str())) {
                selected_count += 1;
            } else if row.is_single_source() {
                implicit.push(MatrixSelectionView {
                    id: None,
                    matrix_model_id: model.id,
                    group_key: key.clone(),
                    selected_type: SelectedType::Part,
                    selected_id: row.id,
                    is_implicit: true,
                });
                selected_count += 1;
            }
        }

        let total = rows.len();
        model_status.insert(
            model.id,
            ModelStatus {
                selected_count,
                is_complete: selected_count == total && total > 0,
            },
        );
    }

    let has_matrix = !models.is_empty() && !explicit.is_empty();
    let is_safe = !models.is_empty() && model_status.values().all(|s| s.is_complete);

    let mut selections: Vec<MatrixSelectionView> =
        explicit.iter().map(MatrixSelectionView::from).collect();
    selections.extend(implicit);

    MatrixData {
        summary: MatrixSummary {
            total_groups: rows.len(),
            model_status,
            has_matrix,
            is_safe,
        },
        models,
        selections,
        groups: rows,
    }
}
