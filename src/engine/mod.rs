// ==========================================
// BOM 矩阵管理系统 - 引擎层
// ==========================================
// 职责: 视图注册表、BOM 聚合、Matrix 一致性计算
// 红线: Engine 不拼 SQL，数据源显式传入
// ==========================================

pub mod aggregation;
pub mod error;
pub mod matrix;
pub mod store;
pub mod view_registry;

#[cfg(test)]
pub(crate) mod testing;

// 重导出核心引擎
pub use aggregation::BomAggregationEngine;
pub use error::{EngineError, EngineResult};
pub use matrix::{compute_matrix, default_models, MatrixEngine};
pub use store::{BomRepositories, BomSource, MatrixStore};
pub use view_registry::{get_view_definition, list_views, StatusFilter, ViewDefinition, ViewId};
