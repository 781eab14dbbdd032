// ==========================================
// BOM 矩阵管理系统 - 料件 / 替代料领域模型
// ==========================================
// Part: 单一位置上的原子料件，(bom_revision_id, location) 唯一
// SecondSource: 按主料逻辑键 (main_supplier, main_supplier_pn) 关联，与位置无关
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::group::{GroupKey, MainItemKey};
use crate::domain::types::{BomStatus, CclFlag, PartType};

// ==========================================
// Part - 原子料件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: i64,
    pub bom_revision_id: i64,
    pub item: i64,                      // 项次
    pub hhpn: Option<String>,           // 内部料号
    pub supplier: String,
    pub supplier_pn: String,
    pub description: Option<String>,
    pub location: String,
    #[serde(rename = "type")]
    pub part_type: Option<PartType>,
    pub bom_status: BomStatus,
    pub ccl: CclFlag,
    pub remark: Option<String>,
}

impl Part {
    /// 分组键 (supplier, supplier_pn, type)
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.supplier, &self.supplier_pn, self.part_type)
    }

    /// 主料逻辑键 (supplier, supplier_pn)
    pub fn main_item_key(&self) -> MainItemKey {
        MainItemKey::new(&self.supplier, &self.supplier_pn)
    }
}

/// 待插入的料件（无 id）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPart {
    pub bom_revision_id: i64,
    pub item: i64,
    pub hhpn: Option<String>,
    pub supplier: String,
    pub supplier_pn: String,
    pub description: Option<String>,
    pub location: String,
    #[serde(rename = "type")]
    pub part_type: Option<PartType>,
    pub bom_status: BomStatus,
    pub ccl: CclFlag,
    pub remark: Option<String>,
}

/// 区分"字段缺省"与"显式 null": 缺省 → None, null → Some(None)
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ==========================================
// PartUpdate - 料件部分更新
// ==========================================
// None = 不修改; 可空字段用 Some(None) 表示置空
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartUpdate {
    pub item: Option<i64>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub hhpn: Option<Option<String>>,
    pub supplier: Option<String>,
    pub supplier_pn: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub part_type: Option<Option<PartType>>,
    pub bom_status: Option<BomStatus>,
    pub ccl: Option<CclFlag>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub remark: Option<Option<String>>,
}

impl PartUpdate {
    pub fn is_empty(&self) -> bool {
        self.item.is_none()
            && self.hhpn.is_none()
            && self.supplier.is_none()
            && self.supplier_pn.is_none()
            && self.description.is_none()
            && self.part_type.is_none()
            && self.bom_status.is_none()
            && self.ccl.is_none()
            && self.remark.is_none()
    }

    /// 是否修改了主料逻辑键（需要同步替代料）
    pub fn changes_main_item_key(&self) -> bool {
        self.supplier.is_some() || self.supplier_pn.is_some()
    }

    /// 应用到旧主料键上，得到更新后的主料键
    pub fn apply_to_main_item_key(&self, old: &MainItemKey) -> MainItemKey {
        MainItemKey::new(
            self.supplier.as_deref().unwrap_or(&old.supplier),
            self.supplier_pn.as_deref().unwrap_or(&old.supplier_pn),
        )
    }
}

// ==========================================
// SecondSource - 替代料
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondSource {
    pub id: i64,
    pub bom_revision_id: i64,
    pub main_supplier: String,
    pub main_supplier_pn: String,
    pub hhpn: Option<String>,
    pub supplier: String,
    pub supplier_pn: String,
    pub description: Option<String>,
}

impl SecondSource {
    pub fn main_item_key(&self) -> MainItemKey {
        MainItemKey::new(&self.main_supplier, &self.main_supplier_pn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewSecondSource {
    pub bom_revision_id: i64,
    pub main_supplier: String,
    pub main_supplier_pn: String,
    pub hhpn: Option<String>,
    pub supplier: String,
    pub supplier_pn: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondSourceUpdate {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub hhpn: Option<Option<String>>,
    pub supplier: Option<String>,
    pub supplier_pn: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl SecondSourceUpdate {
    pub fn is_empty(&self) -> bool {
        self.hhpn.is_none()
            && self.supplier.is_none()
            && self.supplier_pn.is_none()
            && self.description.is_none()
    }
}
