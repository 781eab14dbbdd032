// ==========================================
// BOM 矩阵管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod db_utils;
pub mod error;
pub mod matrix_repo;
pub mod part_repo;
pub mod project_repo;
pub mod second_source_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use matrix_repo::MatrixRepository;
pub use part_repo::PartRepository;
pub use project_repo::{BomRevisionRepository, ProjectRepository, SeriesRepository};
pub use second_source_repo::SecondSourceRepository;
