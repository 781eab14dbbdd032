// ==========================================
// BOM 矩阵管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/引擎/导入错误转换为用户可读的错误消息
// 约束: 错误信息必须携带失败对象的 id 或字段
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 存储约束违反（唯一/外键/CHECK），原样上抛
    #[error("数据约束违反: {0}")]
    ConstraintViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入导出错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ConstraintViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ConstraintViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ConstraintViolation(format!("CHECK 约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::Validation(msg) => ApiError::BusinessRuleViolation(msg),
            EngineError::Repository(err) => ApiError::from(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(err) => ApiError::from(err),
            ImportError::CsvWriteError(msg) => ApiError::ExportError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 前端错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::ExportError(_) => "EXPORT_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_not_found_keeps_id() {
        let err: ApiError = EngineError::not_found("BomRevision", 7).into();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.to_string().contains("id=7"));
    }

    #[test]
    fn test_engine_validation_maps_to_business_rule() {
        let err: ApiError = EngineError::Validation("机种仍有选择记录".to_string()).into();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_constraint_violation_passthrough() {
        let repo_err = RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed: part.bom_revision_id, part.location".to_string(),
        );
        let err: ApiError = EngineError::from(repo_err).into();
        assert_eq!(err.code(), "CONSTRAINT_VIOLATION");
        assert!(err.to_string().contains("part.location"));
    }

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::MissingColumn("Supplier".to_string()).into();
        assert_eq!(err.code(), "IMPORT_ERROR");

        let err: ApiError = ImportError::CsvWriteError("disk full".to_string()).into();
        assert_eq!(err.code(), "EXPORT_ERROR");

        let err: ApiError =
            ImportError::Repository(RepositoryError::not_found("Project", 3)).into();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_transaction_error_mapping() {
        let err: ApiError = ImportError::Repository(RepositoryError::DatabaseTransactionError(
            "提交事务失败: database is locked".to_string(),
        ))
        .into();
        assert_eq!(err.code(), "DATABASE_TRANSACTION_ERROR");
        assert!(err.to_string().contains("database is locked"));
    }
}
