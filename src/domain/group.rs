// ==========================================
// BOM 矩阵管理系统 - 分组键与主料聚合视图
// ==========================================
// GroupKey: (supplier, supplier_pn, type)，type 为空是独立分桶
// MainItemKey: (supplier, supplier_pn)，替代料与 Matrix 选择按此关联
// GroupedMainItem: 派生数据，不落库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::part::SecondSource;
use crate::domain::types::{BomStatus, CclFlag, PartType};

// ==========================================
// MainItemKey - 主料逻辑键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MainItemKey {
    pub supplier: String,
    pub supplier_pn: String,
}

const KEY_SEPARATOR: char = '|';
const KEY_ESCAPE: char = '\\';

impl MainItemKey {
    pub fn new(supplier: &str, supplier_pn: &str) -> Self {
        Self {
            supplier: supplier.to_string(),
            supplier_pn: supplier_pn.to_string(),
        }
    }

    /// 编码为持久化用的 group_key 字符串 "supplier|supplier_pn"
    ///
    /// 字段内的 `|` 与 `\` 以 `\` 转义，保证不同键编码后不会相同。
    /// 不含这两个字符的键编码结果与 "supplier|supplier_pn" 完全一致。
    pub fn to_storage_key(&self) -> String {
        let mut out = String::with_capacity(self.supplier.len() + self.supplier_pn.len() + 1);
        push_escaped(&mut out, &self.supplier);
        out.push(KEY_SEPARATOR);
        push_escaped(&mut out, &self.supplier_pn);
        out
    }

    /// 解析 group_key 字符串；格式不合法返回 None
    pub fn from_storage_key(raw: &str) -> Option<Self> {
        let mut parts: Vec<String> = vec![String::new()];
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                KEY_ESCAPE => {
                    let escaped = chars.next()?;
                    parts.last_mut()?.push(escaped);
                }
                KEY_SEPARATOR => parts.push(String::new()),
                other => parts.last_mut()?.push(other),
            }
        }

        if parts.len() != 2 {
            return None;
        }
        let supplier_pn = parts.pop()?;
        let supplier = parts.pop()?;
        Some(Self {
            supplier,
            supplier_pn,
        })
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if c == KEY_SEPARATOR || c == KEY_ESCAPE {
            out.push(KEY_ESCAPE);
        }
        out.push(c);
    }
}

impl fmt::Display for MainItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_storage_key())
    }
}

// ==========================================
// GroupKey - 主料分组键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub supplier: String,
    pub supplier_pn: String,
    #[serde(rename = "type")]
    pub part_type: Option<PartType>,
}

impl GroupKey {
    pub fn new(supplier: &str, supplier_pn: &str, part_type: Option<PartType>) -> Self {
        Self {
            supplier: supplier.to_string(),
            supplier_pn: supplier_pn.to_string(),
            part_type,
        }
    }

    pub fn main_item_key(&self) -> MainItemKey {
        MainItemKey::new(&self.supplier, &self.supplier_pn)
    }
}

// ==========================================
// GroupedMainItem - 主料聚合行
// ==========================================
// 对外字段名固定，UI/导出层依赖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMainItem {
    pub id: i64, // 代表料件 id（组内第一条）
    pub supplier: String,
    pub supplier_pn: String,
    #[serde(rename = "type")]
    pub part_type: Option<PartType>,
    pub hhpn: Option<String>,
    pub description: Option<String>,
    pub bom_status: BomStatus,
    pub ccl: CclFlag,
    pub remark: Option<String>,
    pub locations: String, // 逗号拼接
    pub quantity: i64,
    pub item: i64, // 组内最小项次
    pub second_sources: Vec<SecondSource>,
}

impl GroupedMainItem {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.supplier, &self.supplier_pn, self.part_type)
    }

    pub fn main_item_key(&self) -> MainItemKey {
        MainItemKey::new(&self.supplier, &self.supplier_pn)
    }

    /// 单一来源（无替代料）
    pub fn is_single_source(&self) -> bool {
        self.second_sources.is_empty()
    }

    pub fn location_list(&self) -> Vec<&str> {
        self.locations
            .split(',')
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_plain() {
        let key = MainItemKey::new("A", "1");
        assert_eq!(key.to_storage_key(), "A|1");
        assert_eq!(MainItemKey::from_storage_key("A|1"), Some(key));
    }

    #[test]
    fn test_storage_key_no_collision_with_separator_in_field() {
        // 未转义时 ("A|B", "C") 与 ("A", "B|C") 会得到相同的 "A|B|C"
        let k1 = MainItemKey::new("A|B", "C");
        let k2 = MainItemKey::new("A", "B|C");
        assert_ne!(k1.to_storage_key(), k2.to_storage_key());

        assert_eq!(MainItemKey::from_storage_key(&k1.to_storage_key()), Some(k1));
        assert_eq!(MainItemKey::from_storage_key(&k2.to_storage_key()), Some(k2));
    }

    #[test]
    fn test_storage_key_backslash() {
        let key = MainItemKey::new("A\\", "1");
        let encoded = key.to_storage_key();
        assert_eq!(encoded, "A\\\\|1");
        assert_eq!(MainItemKey::from_storage_key(&encoded), Some(key));
    }

    #[test]
    fn test_storage_key_invalid() {
        assert_eq!(MainItemKey::from_storage_key("no-separator"), None);
        assert_eq!(MainItemKey::from_storage_key("a|b|c"), None);
        assert_eq!(MainItemKey::from_storage_key("dangling\\"), None);
    }

    #[test]
    fn test_group_key_type_partition() {
        let none = GroupKey::new("A", "1", None);
        let smd = GroupKey::new("A", "1", Some(PartType::Smd));
        assert_ne!(none, smd);
        assert_eq!(none.main_item_key(), smd.main_item_key());
    }
}
