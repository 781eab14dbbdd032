// ==========================================
// BOM 矩阵管理系统 - 领域类型定义
// ==========================================
// 职责: 料件状态、制程类型、CCL 标记、BOM 模式等枚举
// 存储: 数据库中均以大写字符串保存
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// BOM 状态 (BOM Status)
// ==========================================
// I=导入/有效, X=不上件, P=试产, M=量产
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BomStatus {
    I,
    X,
    P,
    M,
}

impl BomStatus {
    /// 全部状态（固定顺序）
    pub const ALL: [BomStatus; 4] = [BomStatus::I, BomStatus::X, BomStatus::P, BomStatus::M];

    pub fn as_str(&self) -> &'static str {
        match self {
            BomStatus::I => "I",
            BomStatus::X => "X",
            BomStatus::P => "P",
            BomStatus::M => "M",
        }
    }

    /// 从字符串解析状态（大小写不敏感，去除首尾空白）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "I" => Some(BomStatus::I),
            "X" => Some(BomStatus::X),
            "P" => Some(BomStatus::P),
            "M" => Some(BomStatus::M),
            _ => None,
        }
    }
}

impl fmt::Display for BomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 制程类型 (Part Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartType {
    Smd,    // 表面贴装
    Pth,    // 插件
    Bottom, // 背面
}

impl PartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Smd => "SMD",
            PartType::Pth => "PTH",
            PartType::Bottom => "BOTTOM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SMD" => Some(PartType::Smd),
            "PTH" => Some(PartType::Pth),
            "BOTTOM" => Some(PartType::Bottom),
            _ => None,
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// CCL 标记 (Critical Component List)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CclFlag {
    Y,
    N,
}

impl CclFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CclFlag::Y => "Y",
            CclFlag::N => "N",
        }
    }

    /// 只有 "Y" 视为关键料，其余一律为 N
    pub fn from_cell(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("Y") {
            CclFlag::Y
        } else {
            CclFlag::N
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "Y" => Some(CclFlag::Y),
            "N" => Some(CclFlag::N),
            _ => None,
        }
    }
}

impl fmt::Display for CclFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// BOM 模式 (NPI / MP)
// ==========================================
// 模式决定 ACTIVE/INACTIVE 视图下 P/M 状态的归属
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BomMode {
    Npi, // 新品导入
    Mp,  // 量产
}

impl BomMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BomMode::Npi => "NPI",
            BomMode::Mp => "MP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NPI" => Some(BomMode::Npi),
            "MP" => Some(BomMode::Mp),
            _ => None,
        }
    }
}

impl fmt::Display for BomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Matrix 选择对象类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedType {
    Part,
    SecondSource,
}

impl SelectedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectedType::Part => "part",
            SelectedType::SecondSource => "second_source",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "part" => Some(SelectedType::Part),
            "second_source" => Some(SelectedType::SecondSource),
            _ => None,
        }
    }
}

impl fmt::Display for SelectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_status_parse() {
        assert_eq!(BomStatus::parse(" p "), Some(BomStatus::P));
        assert_eq!(BomStatus::parse("M"), Some(BomStatus::M));
        assert_eq!(BomStatus::parse("Z"), None);
        assert_eq!(BomStatus::parse(""), None);
    }

    #[test]
    fn test_part_type_roundtrip_str() {
        for t in [PartType::Smd, PartType::Pth, PartType::Bottom] {
            assert_eq!(PartType::parse(t.as_str()), Some(t));
        }
        assert_eq!(PartType::parse("smd"), Some(PartType::Smd));
    }

    #[test]
    fn test_ccl_from_cell() {
        assert_eq!(CclFlag::from_cell("y"), CclFlag::Y);
        assert_eq!(CclFlag::from_cell(""), CclFlag::N);
        assert_eq!(CclFlag::from_cell("yes"), CclFlag::N);
    }

    #[test]
    fn test_serde_format() {
        assert_eq!(serde_json::to_string(&PartType::Bottom).unwrap(), "\"BOTTOM\"");
        assert_eq!(serde_json::to_string(&BomMode::Npi).unwrap(), "\"NPI\"");
        assert_eq!(
            serde_json::to_string(&SelectedType::SecondSource).unwrap(),
            "\"second_source\""
        );
    }
}
