// ==========================================
// BOM 矩阵管理系统 - Matrix 领域模型
// ==========================================
// MatrixModel: 版本下的机种（如 Model A/B/C）
// MatrixSelection: (机种, 主料键) → 选定对象，唯一且 upsert
// 隐式选择: 单一来源组自动判定，仅在读取时计算，不落库
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::group::GroupedMainItem;
use crate::domain::types::SelectedType;

// ==========================================
// MatrixModel - 机种
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixModel {
    pub id: i64,
    pub bom_revision_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatrixModel {
    pub name: String,
    pub description: Option<String>,
}

impl NewMatrixModel {
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }
}

// ==========================================
// MatrixSelection - 显式选择（落库）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSelection {
    pub id: i64,
    pub matrix_model_id: i64,
    pub group_key: String,
    pub selected_type: SelectedType,
    pub selected_id: i64,
    pub updated_at: NaiveDateTime,
}

/// saveSelection 的入参
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionInput {
    pub matrix_model_id: i64,
    pub group_key: String,
    pub selected_type: SelectedType,
    pub selected_id: i64,
}

// ==========================================
// 对外输出的选择（显式 + 隐式）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSelectionView {
    pub id: Option<i64>, // 隐式选择无 id
    pub matrix_model_id: i64,
    pub group_key: String,
    pub selected_type: SelectedType,
    pub selected_id: i64,
    pub is_implicit: bool,
}

impl From<&MatrixSelection> for MatrixSelectionView {
    fn from(sel: &MatrixSelection) -> Self {
        Self {
            id: Some(sel.id),
            matrix_model_id: sel.matrix_model_id,
            group_key: sel.group_key.clone(),
            selected_type: sel.selected_type,
            selected_id: sel.selected_id,
            is_implicit: false,
        }
    }
}

// ==========================================
// 完整性汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub selected_count: usize,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixSummary {
    pub total_groups: usize,
    pub model_status: BTreeMap<i64, ModelStatus>,
    pub has_matrix: bool,
    pub is_safe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixData {
    pub models: Vec<MatrixModel>,
    pub selections: Vec<MatrixSelectionView>,
    pub summary: MatrixSummary,
    pub groups: Vec<GroupedMainItem>,
}
