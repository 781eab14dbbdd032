// ==========================================
// BOM 矩阵管理系统 - 系列 / 项目 / BOM 版本
// ==========================================
// 层级: Series → Project → BomRevision
// 说明: BomRevision 的 mode 决定状态过滤口径
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::BomMode;

// ==========================================
// Series - 产品系列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub series_id: Option<i64>,     // 所属系列（可为空）
    pub name: String,               // 项目名称
    pub code: Option<String>,       // 项目代码
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub series_id: Option<i64>,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
}

// ==========================================
// BomRevision - BOM 版本
// ==========================================
// 唯一键: (project_id, phase, version)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRevision {
    pub id: i64,
    pub project_id: i64,
    pub phase: String,                   // 阶段 (EVT/DVT/PVT/MP ...)
    pub version: String,                 // 版本号
    pub mode: BomMode,                   // NPI / MP
    pub description: Option<String>,
    pub source_filename: Option<String>, // 导入来源文件
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBomRevision {
    pub project_id: i64,
    pub phase: String,
    pub version: String,
    pub mode: BomMode,
    pub description: Option<String>,
    pub source_filename: Option<String>,
}
