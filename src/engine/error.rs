// ==========================================
// BOM 矩阵管理系统 - 引擎层错误类型
// ==========================================
// 分类:
// - NotFound: 版本/机种/视图不存在，携带失败的 id
// - Validation: 用户可修正的业务校验失败（如机种仍有选择记录）
// - Repository: 存储层错误（含约束违反），原样透传
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("校验失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

// 仓储层 NotFound 统一提升为引擎层 NotFound，其余原样包装
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Repository(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
