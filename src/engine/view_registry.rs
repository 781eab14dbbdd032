// ==========================================
// BOM 矩阵管理系统 - 视图定义注册表
// ==========================================
// 固定视图: ALL / SMD / PTH / BOTTOM / NI / PROTO / MP / CCL
// 状态逻辑:
// - ACTIVE:   I 恒保留; NPI 保留 P; MP 保留 M
// - INACTIVE: X 恒保留; NPI 保留 M; MP 保留 P（与 ACTIVE 互补）
// - SPECIFIC: 仅保留指定状态，与模式无关
// - IGNORE:   不做状态过滤
// ==========================================

use serde::Serialize;
use std::fmt;

use crate::domain::types::{BomMode, BomStatus, CclFlag, PartType};
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// ViewId - 视图标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewId {
    All,
    Smd,
    Pth,
    Bottom,
    Ni,
    Proto,
    Mp,
    Ccl,
}

impl ViewId {
    /// 注册表顺序
    pub const ALL: [ViewId; 8] = [
        ViewId::All,
        ViewId::Smd,
        ViewId::Pth,
        ViewId::Bottom,
        ViewId::Ni,
        ViewId::Proto,
        ViewId::Mp,
        ViewId::Ccl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::All => "ALL",
            ViewId::Smd => "SMD",
            ViewId::Pth => "PTH",
            ViewId::Bottom => "BOTTOM",
            ViewId::Ni => "NI",
            ViewId::Proto => "PROTO",
            ViewId::Mp => "MP",
            ViewId::Ccl => "CCL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        ViewId::ALL.into_iter().find(|v| v.as_str() == upper)
    }

    pub fn definition(&self) -> ViewDefinition {
        let id = self.as_str();
        match self {
            ViewId::All => ViewDefinition::new(id, None, StatusFilter::Active, None),
            ViewId::Smd => {
                ViewDefinition::new(id, Some(vec![PartType::Smd]), StatusFilter::Active, None)
            }
            ViewId::Pth => {
                ViewDefinition::new(id, Some(vec![PartType::Pth]), StatusFilter::Active, None)
            }
            ViewId::Bottom => {
                ViewDefinition::new(id, Some(vec![PartType::Bottom]), StatusFilter::Active, None)
            }
            ViewId::Ni => ViewDefinition::new(id, None, StatusFilter::Inactive, None),
            ViewId::Proto => {
                ViewDefinition::new(id, None, StatusFilter::Specific(vec![BomStatus::P]), None)
            }
            ViewId::Mp => {
                ViewDefinition::new(id, None, StatusFilter::Specific(vec![BomStatus::M]), None)
            }
            ViewId::Ccl => {
                ViewDefinition::new(id, None, StatusFilter::Ignore, Some(CclFlag::Y))
            }
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// StatusFilter - 状态过滤逻辑
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "statusLogic",
    content = "bom_statuses",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum StatusFilter {
    Active,
    Inactive,
    Specific(Vec<BomStatus>),
    Ignore,
}

impl StatusFilter {
    /// 判断某状态在给定模式下是否保留
    pub fn allows(&self, status: BomStatus, mode: BomMode) -> bool {
        match self {
            StatusFilter::Active => match status {
                BomStatus::I => true,
                BomStatus::P => mode == BomMode::Npi,
                BomStatus::M => mode == BomMode::Mp,
                BomStatus::X => false,
            },
            StatusFilter::Inactive => match status {
                BomStatus::X => true,
                BomStatus::M => mode == BomMode::Npi,
                BomStatus::P => mode == BomMode::Mp,
                BomStatus::I => false,
            },
            StatusFilter::Specific(statuses) => statuses.contains(&status),
            StatusFilter::Ignore => true,
        }
    }
}

// ==========================================
// ViewDefinition - 视图过滤描述
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewDefinition {
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<PartType>>, // None = 全部类型
    #[serde(flatten)]
    pub status: StatusFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccl: Option<CclFlag>,
}

impl ViewDefinition {
    pub fn new(
        id: &'static str,
        types: Option<Vec<PartType>>,
        status: StatusFilter,
        ccl: Option<CclFlag>,
    ) -> Self {
        Self {
            id,
            types,
            status,
            ccl,
        }
    }

    /// Matrix 引擎内部视图: ACTIVE + CCL=Y
    pub fn matrix() -> Self {
        Self::new("MATRIX", None, StatusFilter::Active, Some(CclFlag::Y))
    }

    pub fn allows_type(&self, part_type: Option<PartType>) -> bool {
        match &self.types {
            None => true,
            Some(types) => part_type.map(|t| types.contains(&t)).unwrap_or(false),
        }
    }

    pub fn allows_ccl(&self, ccl: CclFlag) -> bool {
        self.ccl.map(|required| required == ccl).unwrap_or(true)
    }
}

/// 按 id 获取视图定义
///
/// # 返回
/// - `Err(NotFound)`: 未知视图 id
pub fn get_view_definition(id: &str) -> EngineResult<ViewDefinition> {
    ViewId::parse(id)
        .map(|v| v.definition())
        .ok_or_else(|| EngineError::not_found("View", id))
}

/// 全部视图定义（注册表顺序）
pub fn list_views() -> Vec<ViewDefinition> {
    ViewId::ALL.iter().map(|v| v.definition()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(filter: &StatusFilter, mode: BomMode) -> Vec<BomStatus> {
        BomStatus::ALL
            .into_iter()
            .filter(|s| filter.allows(*s, mode))
            .collect()
    }

    #[test]
    fn test_active_by_mode() {
        assert_eq!(
            kept(&StatusFilter::Active, BomMode::Npi),
            vec![BomStatus::I, BomStatus::P]
        );
        assert_eq!(
            kept(&StatusFilter::Active, BomMode::Mp),
            vec![BomStatus::I, BomStatus::M]
        );
    }

    #[test]
    fn test_inactive_is_complement_of_active() {
        for mode in [BomMode::Npi, BomMode::Mp] {
            for status in BomStatus::ALL {
                let active = StatusFilter::Active.allows(status, mode);
                let inactive = StatusFilter::Inactive.allows(status, mode);
                assert!(active ^ inactive, "{:?}/{:?} 应恰好属于一侧", mode, status);
            }
        }
    }

    #[test]
    fn test_specific_ignores_mode() {
        let proto = StatusFilter::Specific(vec![BomStatus::P]);
        assert_eq!(kept(&proto, BomMode::Npi), vec![BomStatus::P]);
        assert_eq!(kept(&proto, BomMode::Mp), vec![BomStatus::P]);
        assert_eq!(kept(&StatusFilter::Ignore, BomMode::Mp).len(), 4);
    }

    #[test]
    fn test_get_view_definition() {
        let smd = get_view_definition("smd").unwrap();
        assert_eq!(smd.id, "SMD");
        assert_eq!(smd.types, Some(vec![PartType::Smd]));
        assert_eq!(smd.status, StatusFilter::Active);

        let ccl = get_view_definition("CCL").unwrap();
        assert_eq!(ccl.status, StatusFilter::Ignore);
        assert_eq!(ccl.ccl, Some(CclFlag::Y));
    }

    #[test]
    fn test_unknown_view_is_not_found() {
        match get_view_definition("NOPE") {
            Err(EngineError::NotFound { entity, id }) => {
                assert_eq!(entity, "View");
                assert_eq!(id, "NOPE");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_type_filter_excludes_untyped() {
        let smd = ViewId::Smd.definition();
        assert!(smd.allows_type(Some(PartType::Smd)));
        assert!(!smd.allows_type(Some(PartType::Pth)));
        assert!(!smd.allows_type(None));
        assert!(ViewId::All.definition().allows_type(None));
    }

    #[test]
    fn test_list_views_order_and_json() {
        let ids: Vec<_> = list_views().iter().map(|v| v.id).collect();
        assert_eq!(
            ids,
            vec!["ALL", "SMD", "PTH", "BOTTOM", "NI", "PROTO", "MP", "CCL"]
        );

        let json = serde_json::to_value(ViewId::Proto.definition()).unwrap();
        assert_eq!(json["statusLogic"], "SPECIFIC");
        assert_eq!(json["bom_statuses"], serde_json::json!(["P"]));

        let json = serde_json::to_value(ViewId::Smd.definition()).unwrap();
        assert_eq!(json["statusLogic"], "ACTIVE");
        assert_eq!(json["types"], serde_json::json!(["SMD"]));
    }
}
