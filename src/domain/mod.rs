// ==========================================
// BOM 矩阵管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、分组键
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod group;
pub mod matrix;
pub mod part;
pub mod project;
pub mod types;

// 重导出核心类型
pub use group::{GroupKey, GroupedMainItem, MainItemKey};
pub use matrix::{
    MatrixData, MatrixModel, MatrixSelection, MatrixSelectionView, MatrixSummary, ModelStatus,
    NewMatrixModel, SelectionInput,
};
pub use part::{NewPart, NewSecondSource, Part, PartUpdate, SecondSource, SecondSourceUpdate};
pub use project::{BomRevision, NewBomRevision, NewProject, Project, Series};
pub use types::{BomMode, BomStatus, CclFlag, PartType, SelectedType};
