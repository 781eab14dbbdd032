// ==========================================
// 引擎单元测试用内存数据源
// ==========================================

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::matrix::{MatrixModel, MatrixSelection, NewMatrixModel, SelectionInput};
use crate::domain::part::{Part, SecondSource};
use crate::domain::project::BomRevision;
use crate::domain::types::{BomMode, BomStatus, CclFlag, PartType};
use crate::engine::store::{BomSource, MatrixStore};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// 构造料件（id 由 MemoryBomSource 分配）
pub fn part(
    item: i64,
    supplier: &str,
    supplier_pn: &str,
    part_type: Option<PartType>,
    bom_status: BomStatus,
    location: &str,
) -> Part {
    Part {
        id: 0,
        bom_revision_id: 1,
        item,
        hhpn: None,
        supplier: supplier.to_string(),
        supplier_pn: supplier_pn.to_string(),
        description: None,
        location: location.to_string(),
        part_type,
        bom_status,
        ccl: CclFlag::N,
        remark: None,
    }
}

pub fn second_source(
    main_supplier: &str,
    main_supplier_pn: &str,
    supplier: &str,
    supplier_pn: &str,
) -> SecondSource {
    SecondSource {
        id: 0,
        bom_revision_id: 1,
        main_supplier: main_supplier.to_string(),
        main_supplier_pn: main_supplier_pn.to_string(),
        hhpn: None,
        supplier: supplier.to_string(),
        supplier_pn: supplier_pn.to_string(),
        description: None,
    }
}

// ==========================================
// MemoryBomSource
// ==========================================
#[derive(Default)]
pub struct MemoryBomSource {
    revisions: HashMap<i64, BomRevision>,
    parts: Vec<Part>,
    second_sources: Vec<SecondSource>,
    next_id: i64,
}

impl MemoryBomSource {
    pub fn with_revision(revision_id: i64, mode: BomMode) -> Self {
        let mut source = Self::default();
        source.revisions.insert(
            revision_id,
            BomRevision {
                id: revision_id,
                project_id: 1,
                phase: "EVT".to_string(),
                version: "1.0".to_string(),
                mode,
                description: None,
                source_filename: None,
                created_at: fixed_time(),
                updated_at: fixed_time(),
            },
        );
        source
    }

    /// 追加料件，返回分配的 id
    pub fn add_part(&mut self, mut part: Part) -> i64 {
        self.next_id += 1;
        part.id = self.next_id;
        self.parts.push(part);
        self.next_id
    }

    pub fn add_second_source(&mut self, mut ss: SecondSource) -> i64 {
        self.next_id += 1;
        ss.id = self.next_id;
        self.second_sources.push(ss);
        self.next_id
    }
}

impl BomSource for MemoryBomSource {
    fn find_revision(&self, revision_id: i64) -> RepositoryResult<Option<BomRevision>> {
        Ok(self.revisions.get(&revision_id).cloned())
    }

    fn find_parts(&self, revision_id: i64) -> RepositoryResult<Vec<Part>> {
        Ok(self
            .parts
            .iter()
            .filter(|p| p.bom_revision_id == revision_id)
            .cloned()
            .collect())
    }

    fn find_second_sources(&self, revision_id: i64) -> RepositoryResult<Vec<SecondSource>> {
        Ok(self
            .second_sources
            .iter()
            .filter(|s| s.bom_revision_id == revision_id)
            .cloned()
            .collect())
    }
}

// ==========================================
// MemoryMatrixStore
// ==========================================
#[derive(Default)]
struct MatrixTables {
    models: Vec<MatrixModel>,
    selections: Vec<MatrixSelection>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryMatrixStore {
    tables: Mutex<MatrixTables>,
}

impl MemoryMatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection_count(&self) -> usize {
        self.tables.lock().unwrap().selections.len()
    }
}

impl MatrixStore for MemoryMatrixStore {
    fn create_models(
        &self,
        revision_id: i64,
        models: &[NewMatrixModel],
    ) -> RepositoryResult<Vec<MatrixModel>> {
        let mut t = self.tables.lock().unwrap();
        let mut created = Vec::new();
        for m in models {
            t.next_id += 1;
            let model = MatrixModel {
                id: t.next_id,
                bom_revision_id: revision_id,
                name: m.name.clone(),
                description: m.description.clone(),
                created_at: fixed_time(),
            };
            t.models.push(model.clone());
            created.push(model);
        }
        Ok(created)
    }

    fn find_models(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixModel>> {
        let t = self.tables.lock().unwrap();
        Ok(t.models
            .iter()
            .filter(|m| m.bom_revision_id == revision_id)
            .cloned()
            .collect())
    }

    fn update_model(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> RepositoryResult<MatrixModel> {
        let mut t = self.tables.lock().unwrap();
        let model = t
            .models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| RepositoryError::not_found("MatrixModel", id))?;
        if let Some(name) = name {
            model.name = name.to_string();
        }
        if let Some(description) = description {
            model.description = description.map(str::to_string);
        }
        Ok(model.clone())
    }

    fn delete_model(&self, id: i64) -> RepositoryResult<usize> {
        let mut t = self.tables.lock().unwrap();
        let before = t.models.len();
        t.models.retain(|m| m.id != id);
        Ok(before - t.models.len())
    }

    fn count_selections_for_model(&self, model_id: i64) -> RepositoryResult<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.selections
            .iter()
            .filter(|s| s.matrix_model_id == model_id)
            .count() as i64)
    }

    fn upsert_selection(&self, input: &SelectionInput) -> RepositoryResult<MatrixSelection> {
        let mut t = self.tables.lock().unwrap();
        if let Some(existing) = t.selections.iter_mut().find(|s| {
            s.matrix_model_id == input.matrix_model_id && s.group_key == input.group_key
        }) {
            existing.selected_type = input.selected_type;
            existing.selected_id = input.selected_id;
            return Ok(existing.clone());
        }
        t.next_id += 1;
        let sel = MatrixSelection {
            id: t.next_id,
            matrix_model_id: input.matrix_model_id,
            group_key: input.group_key.clone(),
            selected_type: input.selected_type,
            selected_id: input.selected_id,
            updated_at: fixed_time(),
        };
        t.selections.push(sel.clone());
        Ok(sel)
    }

    fn find_selection(
        &self,
        model_id: i64,
        group_key: &str,
    ) -> RepositoryResult<Option<MatrixSelection>> {
        let t = self.tables.lock().unwrap();
        Ok(t.selections
            .iter()
            .find(|s| s.matrix_model_id == model_id && s.group_key == group_key)
            .cloned())
    }

    fn find_selections(&self, revision_id: i64) -> RepositoryResult<Vec<MatrixSelection>> {
        let t = self.tables.lock().unwrap();
        let model_ids: Vec<i64> = t
            .models
            .iter()
            .filter(|m| m.bom_revision_id == revision_id)
            .map(|m| m.id)
            .collect();
        Ok(t.selections
            .iter()
            .filter(|s| model_ids.contains(&s.matrix_model_id))
            .cloned()
            .collect())
    }

    fn delete_selection(&self, model_id: i64, group_key: &str) -> RepositoryResult<usize> {
        let mut t = self.tables.lock().unwrap();
        let before = t.selections.len();
        t.selections
            .retain(|s| !(s.matrix_model_id == model_id && s.group_key == group_key));
        Ok(before - t.selections.len())
    }
}
