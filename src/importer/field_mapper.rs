// ==========================================
// BOM 矩阵管理系统 - 字段映射器实现
// ==========================================
// 职责: 源表头（含中英文别名）→ 标准 BOM 字段
// 匹配: 忽略大小写、空白、'_' '-' '.' '/'
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use std::collections::HashMap;

/// 标准 BOM 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BomField {
    Item,
    Hhpn,
    Description,
    Supplier,
    SupplierPn,
    Location,
    Type,
    Status,
    Ccl,
    Remark,
}

impl BomField {
    pub const ALL: [BomField; 10] = [
        BomField::Item,
        BomField::Hhpn,
        BomField::Description,
        BomField::Supplier,
        BomField::SupplierPn,
        BomField::Location,
        BomField::Type,
        BomField::Status,
        BomField::Ccl,
        BomField::Remark,
    ];

    /// 导出时使用的标准表头
    pub fn header(&self) -> &'static str {
        match self {
            BomField::Item => "Item",
            BomField::Hhpn => "HHPN",
            BomField::Description => "Description",
            BomField::Supplier => "Supplier",
            BomField::SupplierPn => "Supplier PN",
            BomField::Location => "Location",
            BomField::Type => "Type",
            BomField::Status => "BOM Status",
            BomField::Ccl => "CCL",
            BomField::Remark => "Remark",
        }
    }

    /// 归一化后的别名
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            BomField::Item => &["item", "項次", "项次", "itemno"],
            BomField::Hhpn => &["hhpn", "料號", "料号", "pn"],
            BomField::Description => &["description", "desc", "描述", "品名", "規格", "规格"],
            BomField::Supplier => &["supplier", "vendor", "mfr", "manufacturer", "供應商", "供应商"],
            BomField::SupplierPn => &[
                "supplierpn",
                "mpn",
                "vendorpn",
                "mfrpn",
                "供應商料號",
                "供应商料号",
            ],
            BomField::Location => &["location", "loc", "refdes", "位置", "位號", "位号"],
            BomField::Type => &["type", "類型", "类型"],
            BomField::Status => &["status", "bomstatus", "狀態", "状态"],
            BomField::Ccl => &["ccl"],
            BomField::Remark => &["remark", "remarks", "備註", "备注"],
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        let key = normalize_header(header);
        BomField::ALL
            .into_iter()
            .find(|f| f.aliases().contains(&key.as_str()))
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.' | '/'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// 映射后的 BOM 行（值已去除首尾空白，空串视为缺失）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBomRow {
    pub row_number: usize,
    values: HashMap<BomField, String>,
}

impl RawBomRow {
    pub fn get(&self, field: BomField) -> Option<&str> {
        self.values
            .get(&field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    #[cfg(test)]
    pub fn with(row_number: usize, values: &[(BomField, &str)]) -> Self {
        Self {
            row_number,
            values: values
                .iter()
                .map(|(f, v)| (*f, v.trim().to_string()))
                .collect(),
        }
    }
}

// ==========================================
// BomFieldMapper
// ==========================================
pub struct BomFieldMapper;

impl BomFieldMapper {
    /// 将原始行映射为 BOM 行
    ///
    /// # 返回
    /// - `Err(MissingColumn)`: 表头中缺少 Supplier / Supplier PN / Location / Item
    pub fn map_rows(&self, rows: Vec<RawRow>) -> ImportResult<Vec<RawBomRow>> {
        let mut headers: HashMap<String, BomField> = HashMap::new();
        for row in &rows {
            for header in row.cells.keys() {
                if headers.contains_key(header) {
                    continue;
                }
                if let Some(field) = BomField::from_header(header) {
                    headers.insert(header.clone(), field);
                }
            }
        }

        if !rows.is_empty() {
            for required in [
                BomField::Item,
                BomField::Supplier,
                BomField::SupplierPn,
                BomField::Location,
            ] {
                if !headers.values().any(|f| *f == required) {
                    return Err(ImportError::MissingColumn(required.header().to_string()));
                }
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut values = HashMap::new();
                for (header, value) in row.cells {
                    if let Some(field) = headers.get(&header) {
                        let value = value.trim().to_string();
                        // 同一字段出现多个别名列时，取第一个非空值
                        let slot = values.entry(*field).or_insert_with(String::new);
                        if slot.is_empty() {
                            *slot = value;
                        }
                    }
                }
                RawBomRow {
                    row_number: row.row_number,
                    values,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(row_number: usize, cells: &[(&str, &str)]) -> RawRow {
        RawRow {
            row_number,
            cells: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_header_aliases() {
        assert_eq!(BomField::from_header("Supplier PN"), Some(BomField::SupplierPn));
        assert_eq!(BomField::from_header("supplier_pn"), Some(BomField::SupplierPn));
        assert_eq!(BomField::from_header("MPN"), Some(BomField::SupplierPn));
        assert_eq!(BomField::from_header("項次"), Some(BomField::Item));
        assert_eq!(BomField::from_header("BOM Status"), Some(BomField::Status));
        assert_eq!(BomField::from_header("Qty"), None);
    }

    #[test]
    fn test_map_rows() {
        let rows = vec![raw(
            2,
            &[
                ("項次", "1"),
                ("Supplier", " TI "),
                ("MPN", "LM358"),
                ("Location", "U1"),
                ("CCL", ""),
                ("Qty", "1"),
            ],
        )];

        let mapped = BomFieldMapper.map_rows(rows).unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].row_number, 2);
        assert_eq!(mapped[0].get(BomField::Item), Some("1"));
        assert_eq!(mapped[0].get(BomField::Supplier), Some("TI"));
        assert_eq!(mapped[0].get(BomField::SupplierPn), Some("LM358"));
        assert_eq!(mapped[0].get(BomField::Ccl), None);
    }

    #[test]
    fn test_missing_required_column() {
        let rows = vec![raw(2, &[("Item", "1"), ("Supplier", "TI"), ("Location", "U1")])];
        match BomFieldMapper.map_rows(rows) {
            Err(ImportError::MissingColumn(col)) => assert_eq!(col, "Supplier PN"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
