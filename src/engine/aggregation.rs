// ==========================================
// BOM 矩阵管理系统 - BOM 聚合引擎
// ==========================================
// 输入: 版本 id + 视图定义
// 输出: 主料聚合行 (GroupedMainItem)，按最小项次升序
// 流程: 加载版本/料件 → 状态过滤(按模式) → 类型过滤 → CCL 过滤
//       → 按 (supplier, supplier_pn, type) 分组 → 挂接替代料
// 红线: 只读，无副作用
// ==========================================

use std::collections::HashMap;
use tracing::instrument;

use crate::domain::group::{GroupKey, GroupedMainItem, MainItemKey};
use crate::domain::part::{Part, SecondSource};
use crate::domain::types::BomMode;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::store::BomSource;
use crate::engine::view_registry::{get_view_definition, ViewDefinition};

// ==========================================
// BomAggregationEngine - BOM 聚合引擎
// ==========================================
// 红线: 无状态引擎，数据源由调用方传入
#[derive(Debug, Default, Clone, Copy)]
pub struct BomAggregationEngine;

impl BomAggregationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 执行视图
    ///
    /// # 返回
    /// - `Err(NotFound)`: 版本不存在
    /// - `Ok(vec![])`: 空版本或过滤后无数据
    #[instrument(skip(self, source, view), fields(revision_id = %revision_id, view = %view.id))]
    pub fn execute_view(
        &self,
        source: &dyn BomSource,
        revision_id: i64,
        view: &ViewDefinition,
    ) -> EngineResult<Vec<GroupedMainItem>> {
        let revision = source
            .find_revision(revision_id)?
            .ok_or_else(|| EngineError::not_found("BomRevision", revision_id))?;

        let parts = source.find_parts(revision_id)?;
        let surviving = filter_parts(&parts, view, revision.mode);

        let mut groups = group_parts(&surviving);
        if !groups.is_empty() {
            attach_second_sources(&mut groups, source.find_second_sources(revision_id)?);
        }

        tracing::debug!(
            mode = %revision.mode,
            parts = parts.len(),
            kept = surviving.len(),
            groups = groups.len(),
            "视图聚合完成"
        );
        Ok(groups)
    }

    /// 按视图 id 执行
    pub fn execute_view_by_id(
        &self,
        source: &dyn BomSource,
        revision_id: i64,
        view_id: &str,
    ) -> EngineResult<Vec<GroupedMainItem>> {
        let view = get_view_definition(view_id)?;
        self.execute_view(source, revision_id, &view)
    }
}

// ==========================================
// 纯函数
// ==========================================

/// 按视图过滤料件（保持原顺序）
pub fn filter_parts<'a>(parts: &'a [Part], view: &ViewDefinition, mode: BomMode) -> Vec<&'a Part> {
    parts
        .iter()
        .filter(|p| view.status.allows(p.bom_status, mode))
        .filter(|p| view.allows_type(p.part_type))
        .filter(|p| view.allows_ccl(p.ccl))
        .collect()
}

/// 按 (supplier, supplier_pn, type) 分组
///
/// - 代表字段取组内第一条料件
/// - locations 按料件出现顺序拼接
/// - 结果按最小项次升序，项次相同时保持首次出现顺序
pub fn group_parts(parts: &[&Part]) -> Vec<GroupedMainItem> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupedMainItem> = Vec::new();

    for part in parts {
        let key = part.group_key();
        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                group.locations.push(',');
                group.locations.push_str(&part.location);
                group.quantity += 1;
                group.item = group.item.min(part.item);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(GroupedMainItem {
                    id: part.id,
                    supplier: part.supplier.clone(),
                    supplier_pn: part.supplier_pn.clone(),
                    part_type: part.part_type,
                    hhpn: part.hhpn.clone(),
                    description: part.description.clone(),
                    bom_status: part.bom_status,
                    ccl: part.ccl,
                    remark: part.remark.clone(),
                    locations: part.location.clone(),
                    quantity: 1,
                    item: part.item,
                    second_sources: Vec::new(),
                });
            }
        }
    }

    groups.sort_by_key(|g| g.item);
    groups
}

/// 按主料键 (supplier, supplier_pn) 挂接替代料；替代料无类型，不参与类型过滤
pub fn attach_second_sources(groups: &mut [GroupedMainItem], second_sources: Vec<SecondSource>) {
    let mut by_key: HashMap<MainItemKey, Vec<SecondSource>> = HashMap::new();
    for ss in second_sources {
        by_key.entry(ss.main_item_key()).or_default().push(ss);
    }
    for group in groups.iter_mut() {
        if let Some(list) = by_key.get(&group.main_item_key()) {
            group.second_sources = list.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BomStatus, CclFlag, PartType};
    use crate::engine::testing::{part, second_source, MemoryBomSource};
    use crate::engine::view_registry::{StatusFilter, ViewId};

    fn statuses(groups: &[GroupedMainItem]) -> Vec<BomStatus> {
        let mut list: Vec<_> = groups.iter().map(|g| g.bom_status).collect();
        list.sort();
        list
    }

    fn one_of_each_status(mode: BomMode) -> MemoryBomSource {
        let mut source = MemoryBomSource::with_revision(1, mode);
        source.add_part(part(1, "A", "I1", Some(PartType::Smd), BomStatus::I, "C1"));
        source.add_part(part(2, "A", "P1", Some(PartType::Smd), BomStatus::P, "C2"));
        source.add_part(part(3, "A", "X1", Some(PartType::Smd), BomStatus::X, "C3"));
        source.add_part(part(4, "A", "M1", Some(PartType::Smd), BomStatus::M, "C4"));
        source
    }

    #[test]
    fn test_scenario_two_locations_one_group() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        source.add_part(part(1, "A", "1", Some(PartType::Smd), BomStatus::I, "C1"));
        source.add_part(part(1, "A", "1", Some(PartType::Smd), BomStatus::I, "C2"));

        let groups = BomAggregationEngine::new()
            .execute_view_by_id(&source, 1, "ALL")
            .unwrap();

        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.supplier, "A");
        assert_eq!(g.supplier_pn, "1");
        assert_eq!(g.part_type, Some(PartType::Smd));
        assert_eq!(g.quantity, 2);
        assert_eq!(g.locations, "C1,C2");
        assert!(g.second_sources.is_empty());
    }

    #[test]
    fn test_grouping_quantity_and_locations() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        for (i, loc) in ["R1", "R2", "R3"].iter().enumerate() {
            source.add_part(part(5 + i as i64, "Y", "10K", Some(PartType::Smd), BomStatus::I, loc));
        }
        source.add_part(part(2, "Y", "1K", Some(PartType::Smd), BomStatus::I, "R9"));

        let groups = BomAggregationEngine::new()
            .execute_view(&source, 1, &ViewId::All.definition())
            .unwrap();

        assert_eq!(groups.len(), 2);
        // 按最小项次升序
        assert_eq!(groups[0].supplier_pn, "1K");
        let big = &groups[1];
        assert_eq!(big.quantity, 3);
        assert_eq!(big.item, 5);
        let mut locs = big.location_list();
        locs.sort();
        assert_eq!(locs, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn test_type_partition_none_vs_smd() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        source.add_part(part(1, "A", "1", None, BomStatus::I, "C1"));
        source.add_part(part(1, "A", "1", Some(PartType::Smd), BomStatus::I, "C2"));

        let groups = BomAggregationEngine::new()
            .execute_view(&source, 1, &ViewId::All.definition())
            .unwrap();

        assert_eq!(groups.len(), 2);
        let types: Vec<_> = groups.iter().map(|g| g.part_type).collect();
        assert!(types.contains(&None));
        assert!(types.contains(&Some(PartType::Smd)));
        assert!(groups.iter().all(|g| g.quantity == 1));
    }

    #[test]
    fn test_active_filter_by_mode() {
        let engine = BomAggregationEngine::new();
        let all = ViewId::All.definition();

        let npi = engine.execute_view(&one_of_each_status(BomMode::Npi), 1, &all).unwrap();
        assert_eq!(statuses(&npi), vec![BomStatus::I, BomStatus::P]);

        let mp = engine.execute_view(&one_of_each_status(BomMode::Mp), 1, &all).unwrap();
        assert_eq!(statuses(&mp), vec![BomStatus::I, BomStatus::M]);
    }

    #[test]
    fn test_active_and_inactive_partition_statuses() {
        let engine = BomAggregationEngine::new();
        for mode in [BomMode::Npi, BomMode::Mp] {
            let source = one_of_each_status(mode);
            let active = engine
                .execute_view(&source, 1, &ViewId::All.definition())
                .unwrap();
            let inactive = engine
                .execute_view(&source, 1, &ViewId::Ni.definition())
                .unwrap();

            let a = statuses(&active);
            let i = statuses(&inactive);
            assert!(a.iter().all(|s| !i.contains(s)), "{:?} 两侧不应相交", mode);

            let mut union: Vec<_> = a.into_iter().chain(i).collect();
            union.sort();
            union.dedup();
            assert_eq!(union, BomStatus::ALL.to_vec());
        }
    }

    #[test]
    fn test_specific_and_ccl_views() {
        let mut source = one_of_each_status(BomMode::Npi);
        let mut critical = part(9, "B", "9", Some(PartType::Pth), BomStatus::X, "U1");
        critical.ccl = CclFlag::Y;
        source.add_part(critical);

        let engine = BomAggregationEngine::new();
        let proto = engine.execute_view_by_id(&source, 1, "PROTO").unwrap();
        assert_eq!(statuses(&proto), vec![BomStatus::P]);
        let mp = engine.execute_view_by_id(&source, 1, "MP").unwrap();
        assert_eq!(statuses(&mp), vec![BomStatus::M]);

        // CCL 视图忽略状态，X 状态的关键料也保留
        let ccl = engine.execute_view_by_id(&source, 1, "CCL").unwrap();
        assert_eq!(ccl.len(), 1);
        assert_eq!(ccl[0].supplier, "B");
    }

    #[test]
    fn test_type_view_filters() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        source.add_part(part(1, "A", "1", Some(PartType::Smd), BomStatus::I, "C1"));
        source.add_part(part(2, "A", "2", Some(PartType::Pth), BomStatus::I, "J1"));
        source.add_part(part(3, "A", "3", None, BomStatus::I, "X1"));

        let engine = BomAggregationEngine::new();
        let pth = engine.execute_view_by_id(&source, 1, "PTH").unwrap();
        assert_eq!(pth.len(), 1);
        assert_eq!(pth[0].supplier_pn, "2");
        assert!(engine.execute_view_by_id(&source, 1, "BOTTOM").unwrap().is_empty());
    }

    #[test]
    fn test_second_source_attachment_by_main_key() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        source.add_part(part(1, "TI", "100", Some(PartType::Smd), BomStatus::I, "U1"));
        source.add_part(part(2, "TI", "200", Some(PartType::Smd), BomStatus::I, "U2"));
        source.add_part(part(3, "TI", "100", None, BomStatus::I, "U3"));
        source.add_second_source(second_source("TI", "100", "ADI", "A100"));
        source.add_second_source(second_source("TI", "100", "ST", "S100"));
        source.add_second_source(second_source("NXP", "200", "ON", "O200"));

        let groups = BomAggregationEngine::new()
            .execute_view(&source, 1, &ViewId::All.definition())
            .unwrap();

        let find = |pn: &str, t: Option<PartType>| {
            groups
                .iter()
                .find(|g| g.supplier_pn == pn && g.part_type == t)
                .unwrap()
        };
        assert_eq!(find("100", Some(PartType::Smd)).second_sources.len(), 2);
        // 替代料不按类型过滤
        assert_eq!(find("100", None).second_sources.len(), 2);
        // 供应商不同的替代料不会挂到同料号上
        assert!(find("200", Some(PartType::Smd)).is_single_source());
    }

    #[test]
    fn test_unknown_revision_is_not_found() {
        let source = MemoryBomSource::with_revision(1, BomMode::Npi);
        let err = BomAggregationEngine::new()
            .execute_view(&source, 99, &ViewId::All.definition())
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_empty_revision_and_empty_match_are_ok() {
        let source = MemoryBomSource::with_revision(1, BomMode::Mp);
        let engine = BomAggregationEngine::new();
        assert!(engine
            .execute_view(&source, 1, &ViewId::All.definition())
            .unwrap()
            .is_empty());

        let source = one_of_each_status(BomMode::Mp);
        let view = ViewDefinition::new(
            "CUSTOM",
            None,
            StatusFilter::Specific(vec![]),
            None,
        );
        assert!(engine.execute_view(&source, 1, &view).unwrap().is_empty());
    }

    #[test]
    fn test_representative_id_is_first_member() {
        let mut source = MemoryBomSource::with_revision(1, BomMode::Npi);
        let first = source.add_part(part(3, "A", "1", None, BomStatus::I, "C1"));
        source.add_part(part(1, "A", "1", None, BomStatus::I, "C2"));

        let groups = BomAggregationEngine::new()
            .execute_view(&source, 1, &ViewId::All.definition())
            .unwrap();
        assert_eq!(groups[0].id, first);
        assert_eq!(groups[0].item, 1);
    }
}
