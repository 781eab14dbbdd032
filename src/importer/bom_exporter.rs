// ==========================================
// BOM 矩阵管理系统 - BOM 视图 CSV 导出
// ==========================================
// 布局与导入一致: 每个主料一行，其后每个替代料一行（Item/Location 留空）
// 导出的文件可直接重新导入
// ==========================================

use std::io::Write;
use std::path::Path;

use crate::domain::group::GroupedMainItem;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::BomField;

const EXPORT_COLUMNS: [BomField; 10] = BomField::ALL;

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// 将聚合视图写为 CSV
///
/// # 返回
/// - `Ok(rows)`: 写入的数据行数（含替代料行）
pub fn write_view_csv<W: Write>(writer: W, groups: &[GroupedMainItem]) -> ImportResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let write_err = |e: csv::Error| ImportError::CsvWriteError(e.to_string());

    csv_writer
        .write_record(EXPORT_COLUMNS.iter().map(|f| f.header()))
        .map_err(write_err)?;

    let mut rows = 0;
    for group in groups {
        let item = group.item.to_string();
        let part_type = group.part_type.map(|t| t.as_str()).unwrap_or("");
        csv_writer
            .write_record([
                item.as_str(),
                opt(&group.hhpn),
                opt(&group.description),
                group.supplier.as_str(),
                group.supplier_pn.as_str(),
                group.locations.as_str(),
                part_type,
                group.bom_status.as_str(),
                group.ccl.as_str(),
                opt(&group.remark),
            ])
            .map_err(write_err)?;
        rows += 1;

        for ss in &group.second_sources {
            csv_writer
                .write_record([
                    "",
                    opt(&ss.hhpn),
                    opt(&ss.description),
                    ss.supplier.as_str(),
                    ss.supplier_pn.as_str(),
                    "",
                    "",
                    "",
                    "",
                    "",
                ])
                .map_err(write_err)?;
            rows += 1;
        }
    }

    csv_writer
        .flush()
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    Ok(rows)
}

/// 写入文件
pub fn export_view_csv(path: &Path, groups: &[GroupedMainItem]) -> ImportResult<usize> {
    let file = std::fs::File::create(path)
        .map_err(|e| ImportError::CsvWriteError(format!("{}: {}", path.display(), e)))?;
    write_view_csv(file, groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::part::SecondSource;
    use crate::domain::types::{BomStatus, CclFlag, PartType};
    use crate::importer::bom_importer::parse_bom_rows;
    use crate::importer::field_mapper::BomFieldMapper;
    use crate::importer::file_parser::UniversalFileParser;

    fn group() -> GroupedMainItem {
        GroupedMainItem {
            id: 1,
            supplier: "TI".to_string(),
            supplier_pn: "LM358".to_string(),
            part_type: Some(PartType::Smd),
            hhpn: Some("HH-1".to_string()),
            description: Some("OPAMP".to_string()),
            bom_status: BomStatus::P,
            ccl: CclFlag::Y,
            remark: None,
            locations: "U1,U2".to_string(),
            quantity: 2,
            item: 3,
            second_sources: vec![SecondSource {
                id: 9,
                bom_revision_id: 1,
                main_supplier: "TI".to_string(),
                main_supplier_pn: "LM358".to_string(),
                hhpn: None,
                supplier: "ST".to_string(),
                supplier_pn: "LM358D".to_string(),
                description: None,
            }],
        }
    }

    #[test]
    fn test_write_view_csv_layout() {
        let mut buf = Vec::new();
        let rows = write_view_csv(&mut buf, &[group()]).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Item,HHPN,Description,Supplier,Supplier PN,Location,Type,BOM Status,CCL,Remark"
        );
        assert_eq!(lines[1], "3,HH-1,OPAMP,TI,LM358,\"U1,U2\",SMD,P,Y,");
        assert_eq!(lines[2], ",,,ST,LM358D,,,,,");
    }

    #[test]
    fn test_export_can_be_reimported() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        export_view_csv(file.path(), &[group()]).unwrap();

        let raw = UniversalFileParser::default().parse(file.path()).unwrap();
        let rows = BomFieldMapper.map_rows(raw).unwrap();
        let parsed = parse_bom_rows(&rows);

        assert_eq!(parsed.parts.len(), 2);
        assert_eq!(parsed.parts[1].location, "U2");
        assert_eq!(parsed.parts[0].bom_status, BomStatus::P);
        assert_eq!(parsed.parts[0].ccl, CclFlag::Y);
        assert_eq!(parsed.second_sources.len(), 1);
        assert_eq!(parsed.second_sources[0].supplier_pn, "LM358D");
        assert!(parsed.issues.is_empty());
    }
}
