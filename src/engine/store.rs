// ==========================================
// BOM 矩阵管理系统 - 引擎层存储接口
// ==========================================
// 职责: 定义引擎所需的读写接口，由调用方显式传入
// 红线: 引擎不持有全局连接，不拼 SQL
// ==========================================

use std::sync::Arc;

use crate::domain::matrix::{MatrixModel, MatrixSelection, NewMatrixModel, SelectionInput};
use crate::domain::part::{Part, SecondSource};
use crate::domain::project::BomRevision;
use crate::repository::{
    BomRevisionRepository, MatrixRepository, PartRepository, RepositoryResult,
    SecondSourceRepository,
};

// ==========================================
// BomSource Trait
// ==========================================
// 用途: BOM 聚合引擎的只读数据源
// 实现者: BomRepositories（rusqlite），测试中为内存实现
pub trait BomSource: Send + Sync {
    fn find_revision(&self, revision_id: i64) -> RepositoryResult<Option<BomRevision>>;

    /// 版本下全部料件，按插入顺序
    fn find_parts(&self, revision_id: i64) -> RepositoryResult<Vec<Part>>;

    fn find_second_sources(&self, revision_id: i64) -> RepositoryResult<Vec<SecondSource>>;
}

// ==========================================
// MatrixStore Trait
// ==========================================
// 用途: Matrix 引擎的机种 / 选择读写
// 实现者: MatrixRepository（rusqlite），测试中为内存实现
pub trait MatrixStore: Send + Sync {
    // ===== 机种 =====

    fn create_models(
        &self,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> RepositoryResult<Vec<MatrixModel>>;

    fn find_models(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixModel>>;

    fn update_model(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> RepositoryResult<MatrixModel>;

    /// 返回受影响行数（0 表示不存在）
    fn delete_model(&self, id: i64) -> RepositoryResult<usize>;

    fn count_selections_for_model(&self, model_id: i64) -> RepositoryResult<i64>;

    // ===== 选择 =====

    fn upsert_selection(&self, input: &SelectionInput) -> RepositoryResult<MatrixSelection>;

    fn find_selection(
        &self,
        model_id: i64,
        group_key: &str,
    ) -> RepositoryResult<Option<MatrixSelection>>;

    /// 版本下全部显式选择（跨机种）
    fn find_selections(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixSelection>>;

    fn delete_selection(&self, model_id: i64, group_key: &str) -> RepositoryResult<usize>;
}

// ==========================================
// BomRepositories - BOM 数据源仓储集合
// ==========================================
#[derive(Clone)]
pub struct BomRepositories {
    pub revision_repo: Arc<BomRevisionRepository>,
    pub part_repo: Arc<PartRepository>,
    pub second_source_repo: Arc<SecondSourceRepository>,
}

impl BomRepositories {
    pub fn new(
        revision_repo: Arc<BomRevisionRepository>,
        part_repo: Arc<PartRepository>,
        second_source_repo: Arc<SecondSourceRepository>,
    ) -> Self {
        Self {
            revision_repo,
            part_repo,
            second_source_repo,
        }
    }
}

impl BomSource for BomRepositories {
    fn find_revision(&self, revision_id: i64) -> RepositoryResult<Option<BomRevision>> {
        self.revision_repo.find_by_id(revision_id)
    }

    fn find_parts(&self, revision_id: i64) -> RepositoryResult<Vec<Part>> {
        self.part_repo.find_by_revision(revision_id)
    }

    fn find_second_sources(&self, revision_id: i64) -> RepositoryResult<Vec<SecondSource>> {
        self.second_source_repo.find_by_revision(revision_id)
    }
}

impl MatrixStore for MatrixRepository {
    fn create_models(
        &self,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> RepositoryResult<Vec<MatrixModel>> {
        MatrixRepository::create_models(self, revision_id, models)
    }

    fn find_models(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixModel>> {
        self.find_models_by_revision(revision_id)
    }

    fn update_model(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> RepositoryResult<MatrixModel> {
        MatrixRepository::update_model(self, id, name, description)
    }

    fn delete_model(&self, id: i64) -> RepositoryResult<usize> {
        MatrixRepository::delete_model(self, id)
    }

    fn count_selections_for_model(&self, model_id: i64) -> RepositoryResult<i64> {
        MatrixRepository::count_selections_for_model(self, model_id)
    }

    fn upsert_selection(&self, input: &SelectionInput) -> RepositoryResult<MatrixSelection> {
        MatrixRepository::upsert_selection(self, input)
    }

    fn find_selection(
        &self,
        model_id: i64,
        group_key: &str,
    ) -> RepositoryResult<Option<MatrixSelection>> {
        MatrixRepository::find_selection(self, model_id, group_key)
    }

    fn find_selections(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixSelection>> {
        self.find_selections_by_revision(revision_id)
    }

    fn delete_selection(&self, model_id: i64, group_key: &str) -> RepositoryResult<usize> {
        MatrixRepository::delete_selection(self, model_id, group_key)
    }
}
