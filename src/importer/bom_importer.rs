// ==========================================
// BOM 矩阵管理系统 - BOM 导入器
// ==========================================
// 流程: 解析文件 → 表头映射 → 行解析(主料/替代料) → 模式判定 → 单事务落库
// 行规则:
// - 有 Item 且有 Location: 主料行，Location 按逗号/空白拆为逐位置料件
// - 无 Item 且无 Location: 紧随主料行的替代料行，挂到该主料 (supplier, supplier_pn)
// - 状态为空默认 I；类型为空为无类型；CCL 仅 "Y" 为 Y
// - 状态/类型非法、缺供应商信息: 记警告并跳过该行
// - 文件内位置重复: 记错误并跳过重复位置
// 模式: phase 为 MP 或任一料件状态为 M → MP，否则 NPI
// ==========================================

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::db::SharedConnection;
use crate::domain::group::MainItemKey;
use crate::domain::part::{NewPart, NewSecondSource};
use crate::domain::project::NewBomRevision;
use crate::domain::types::{BomMode, BomStatus, CclFlag, PartType};
use crate::i18n::t_with_args;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{BomField, BomFieldMapper, RawBomRow};
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::db_utils::{begin, commit};
use crate::repository::error::RepositoryError;
use crate::repository::{BomRevisionRepository, PartRepository, SecondSourceRepository};

// ==========================================
// 导入报告
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportIssue {
    pub row: usize,
    pub level: IssueLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub revision_id: i64,
    pub mode: BomMode,
    pub part_count: usize,
    pub second_source_count: usize,
    pub warnings: Vec<ImportIssue>,
}

/// 导入目标版本信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub project_id: i64,
    pub phase: String,
    pub version: String,
    pub description: Option<String>,
}

/// 行解析结果（料件 bom_revision_id 尚未赋值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBom {
    pub parts: Vec<NewPart>,
    pub second_sources: Vec<NewSecondSource>,
    pub issues: Vec<ImportIssue>,
}

// ==========================================
// 行解析（纯函数）
// ==========================================

/// 拆分位置单元格（逗号 / 全角逗号 / 空白）
pub fn split_locations(cell: &str) -> Vec<&str> {
    cell.split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 模式判定
pub fn derive_mode(phase: &str, parts: &[NewPart]) -> BomMode {
    if phase.trim().eq_ignore_ascii_case("MP") || parts.iter().any(|p| p.bom_status == BomStatus::M)
    {
        BomMode::Mp
    } else {
        BomMode::Npi
    }
}

fn parse_item(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    // Excel 数值单元格可能以浮点形式出现
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
        _ => None,
    }
}

fn issue(row: usize, level: IssueLevel, key: &str, args: &[(&str, &str)]) -> ImportIssue {
    ImportIssue {
        row,
        level,
        message: t_with_args(key, args),
    }
}

/// 解析映射后的 BOM 行
pub fn parse_bom_rows(rows: &[RawBomRow]) -> ParsedBom {
    let mut parsed = ParsedBom::default();
    let mut seen_locations: HashSet<String> = HashSet::new();
    let mut seen_second_sources: HashSet<NewSecondSource> = HashSet::new();
    let mut current_main: Option<MainItemKey> = None;

    for row in rows {
        let n = row.row_number;
        let item = row.get(BomField::Item);
        let location = row.get(BomField::Location);

        match (item, location) {
            // ===== 替代料行 =====
            (None, None) => {
                let Some(main) = &current_main else {
                    parsed
                        .issues
                        .push(issue(n, IssueLevel::Warning, "import.orphan_second_source", &[]));
                    continue;
                };
                let (Some(supplier), Some(supplier_pn)) =
                    (row.get(BomField::Supplier), row.get(BomField::SupplierPn))
                else {
                    parsed
                        .issues
                        .push(issue(n, IssueLevel::Warning, "import.missing_supplier", &[]));
                    continue;
                };

                let ss = NewSecondSource {
                    bom_revision_id: 0,
                    main_supplier: main.supplier.clone(),
                    main_supplier_pn: main.supplier_pn.clone(),
                    hhpn: row.get(BomField::Hhpn).map(str::to_string),
                    supplier: supplier.to_string(),
                    supplier_pn: supplier_pn.to_string(),
                    description: row.get(BomField::Description).map(str::to_string),
                };
                if seen_second_sources.insert(ss.clone()) {
                    parsed.second_sources.push(ss);
                }
            }

            // ===== 主料行 =====
            (Some(item_raw), Some(location_cell)) => {
                current_main = None;

                let Some(item) = parse_item(item_raw) else {
                    parsed.issues.push(issue(
                        n,
                        IssueLevel::Warning,
                        "import.invalid_item",
                        &[("value", item_raw)],
                    ));
                    continue;
                };
                let (Some(supplier), Some(supplier_pn)) =
                    (row.get(BomField::Supplier), row.get(BomField::SupplierPn))
                else {
                    parsed
                        .issues
                        .push(issue(n, IssueLevel::Warning, "import.missing_supplier", &[]));
                    continue;
                };
                let bom_status = match row.get(BomField::Status) {
                    None => BomStatus::I,
                    Some(raw) => match BomStatus::parse(raw) {
                        Some(s) => s,
                        None => {
                            parsed.issues.push(issue(
                                n,
                                IssueLevel::Warning,
                                "import.invalid_status",
                                &[("value", raw)],
                            ));
                            continue;
                        }
                    },
                };
                let part_type = match row.get(BomField::Type) {
                    None => None,
                    Some(raw) => match PartType::parse(raw) {
                        Some(t) => Some(t),
                        None => {
                            parsed.issues.push(issue(
                                n,
                                IssueLevel::Warning,
                                "import.invalid_type",
                                &[("value", raw)],
                            ));
                            continue;
                        }
                    },
                };
                let ccl = CclFlag::from_cell(row.get(BomField::Ccl).unwrap_or(""));

                for loc in split_locations(location_cell) {
                    if !seen_locations.insert(loc.to_string()) {
                        parsed.issues.push(issue(
                            n,
                            IssueLevel::Error,
                            "import.duplicate_location",
                            &[("location", loc)],
                        ));
                        continue;
                    }
                    parsed.parts.push(NewPart {
                        bom_revision_id: 0,
                        item,
                        hhpn: row.get(BomField::Hhpn).map(str::to_string),
                        supplier: supplier.to_string(),
                        supplier_pn: supplier_pn.to_string(),
                        description: row.get(BomField::Description).map(str::to_string),
                        location: loc.to_string(),
                        part_type,
                        bom_status,
                        ccl,
                        remark: row.get(BomField::Remark).map(str::to_string),
                    });
                }
                current_main = Some(MainItemKey::new(supplier, supplier_pn));
            }

            // ===== 半残行 =====
            _ => {
                current_main = None;
                parsed
                    .issues
                    .push(issue(n, IssueLevel::Warning, "import.incomplete_row", &[]));
            }
        }
    }

    parsed
}

// ==========================================
// BomImporter - 文件导入器
// ==========================================
pub struct BomImporter {
    conn: SharedConnection,
    parser: UniversalFileParser,
}

impl BomImporter {
    /// `sheet_name` 为空时读取第一个工作表
    pub fn new(conn: SharedConnection, sheet_name: Option<String>) -> Self {
        Self {
            conn,
            parser: UniversalFileParser::new(sheet_name),
        }
    }

    /// 从文件导入新版本
    ///
    /// # 返回
    /// - `Err(NoParts)`: 文件无有效料件，不写入任何数据
    /// - `Err(Repository(..))`: 落库失败（如版本重复），事务整体回滚
    #[instrument(skip(self, file_path, request), fields(project_id = %request.project_id, phase = %request.phase))]
    pub fn import_file(&self, file_path: &Path, request: &ImportRequest) -> ImportResult<ImportReport> {
        info!(file_path = %file_path.display(), "开始导入 BOM");

        // === 步骤 1: 解析文件 ===
        let raw_rows = self.parser.parse(file_path)?;
        debug!(rows = raw_rows.len(), "文件解析完成");

        // === 步骤 2: 表头映射 ===
        let rows = BomFieldMapper.map_rows(raw_rows)?;

        // === 步骤 3: 行解析 ===
        let parsed = parse_bom_rows(&rows);
        for issue in &parsed.issues {
            warn!(row = issue.row, level = ?issue.level, message = %issue.message, "导入行问题");
        }

        let source_filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        self.write_parsed(parsed, request, source_filename)
    }

    /// 将解析结果写入新版本（单事务）
    pub fn write_parsed(
        &self,
        mut parsed: ParsedBom,
        request: &ImportRequest,
        source_filename: Option<String>,
    ) -> ImportResult<ImportReport> {
        if parsed.parts.is_empty() {
            return Err(ImportError::NoParts);
        }

        let mode = derive_mode(&request.phase, &parsed.parts);

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = begin(&mut conn)?;

        let revision_id = BomRevisionRepository::insert_with(
            &tx,
            &NewBomRevision {
                project_id: request.project_id,
                phase: request.phase.clone(),
                version: request.version.clone(),
                mode,
                description: request.description.clone(),
                source_filename,
            },
        )?;

        for part in parsed.parts.iter_mut() {
            part.bom_revision_id = revision_id;
        }
        for ss in parsed.second_sources.iter_mut() {
            ss.bom_revision_id = revision_id;
        }

        let part_count = PartRepository::bulk_insert_with(&tx, &parsed.parts)?;
        let second_source_count =
            SecondSourceRepository::bulk_insert_with(&tx, &parsed.second_sources)?;
        commit(tx)?;

        info!(
            revision_id,
            mode = %mode,
            part_count,
            second_source_count,
            issues = parsed.issues.len(),
            "BOM 导入完成"
        );

        Ok(ImportReport {
            revision_id,
            mode,
            part_count,
            second_source_count,
            warnings: parsed.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_row(n: usize, item: &str, sup: &str, pn: &str, loc: &str) -> RawBomRow {
        RawBomRow::with(
            n,
            &[
                (BomField::Item, item),
                (BomField::Supplier, sup),
                (BomField::SupplierPn, pn),
                (BomField::Location, loc),
            ],
        )
    }

    fn ss_row(n: usize, sup: &str, pn: &str) -> RawBomRow {
        RawBomRow::with(n, &[(BomField::Supplier, sup), (BomField::SupplierPn, pn)])
    }

    #[test]
    fn test_split_locations() {
        assert_eq!(split_locations("C1,C2  C3，C4\nC5"), vec!["C1", "C2", "C3", "C4", "C5"]);
        assert!(split_locations(" , ").is_empty());
    }

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("12"), Some(12));
        assert_eq!(parse_item("3.0"), Some(3));
        assert_eq!(parse_item("3.5"), None);
        assert_eq!(parse_item("abc"), None);
    }

    #[test]
    fn test_main_row_expands_locations_with_defaults() {
        let parsed = parse_bom_rows(&[main_row(2, "1", "TI", "LM358", "U1, U2")]);

        assert_eq!(parsed.parts.len(), 2);
        let p = &parsed.parts[0];
        assert_eq!(p.item, 1);
        assert_eq!(p.location, "U1");
        assert_eq!(p.bom_status, BomStatus::I);
        assert_eq!(p.part_type, None);
        assert_eq!(p.ccl, CclFlag::N);
        assert_eq!(parsed.parts[1].location, "U2");
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_second_source_rows_follow_main_row_and_dedup() {
        let parsed = parse_bom_rows(&[
            main_row(2, "1", "TI", "LM358", "U1"),
            ss_row(3, "ST", "LM358D"),
            ss_row(4, "ST", "LM358D"),
            main_row(5, "2", "TI", "TL072", "U2"),
            ss_row(6, "ON", "TL072C"),
        ]);

        assert_eq!(parsed.second_sources.len(), 2);
        assert_eq!(parsed.second_sources[0].main_supplier_pn, "LM358");
        assert_eq!(parsed.second_sources[1].main_supplier_pn, "TL072");
        assert_eq!(parsed.second_sources[1].supplier, "ON");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let rows = [
            main_row(2, "1", "TI", "LM358", "U1 U2"),
            ss_row(3, "ST", "LM358D"),
            main_row(4, "2", "TI", "TL072", "U1"),
        ];
        let first = parse_bom_rows(&rows);
        assert_eq!(first, parse_bom_rows(&rows));
        assert_ne!(first, ParsedBom::default());
        assert_eq!(first.issues.len(), 1);
    }

    #[test]
    fn test_orphan_second_source_row_warns() {
        let parsed = parse_bom_rows(&[ss_row(2, "ST", "X")]);
        assert!(parsed.second_sources.is_empty());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].row, 2);
        assert_eq!(parsed.issues[0].level, IssueLevel::Warning);
    }

    #[test]
    fn test_invalid_status_and_type_skip_row() {
        let bad_status = RawBomRow::with(
            2,
            &[
                (BomField::Item, "1"),
                (BomField::Supplier, "TI"),
                (BomField::SupplierPn, "A"),
                (BomField::Location, "U1"),
                (BomField::Status, "Q"),
            ],
        );
        let bad_type = RawBomRow::with(
            3,
            &[
                (BomField::Item, "2"),
                (BomField::Supplier, "TI"),
                (BomField::SupplierPn, "B"),
                (BomField::Location, "U2"),
                (BomField::Type, "SMT"),
            ],
        );
        // 跟在非法行后的替代料行同样不挂接
        let parsed = parse_bom_rows(&[bad_status, bad_type, ss_row(4, "ST", "B2")]);

        assert!(parsed.parts.is_empty());
        assert!(parsed.second_sources.is_empty());
        let rows: Vec<_> = parsed.issues.iter().map(|i| i.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn test_duplicate_location_is_error() {
        let parsed = parse_bom_rows(&[
            main_row(2, "1", "TI", "A", "U1,U2"),
            main_row(3, "2", "TI", "B", "U2,U3"),
        ]);

        let locs: Vec<_> = parsed.parts.iter().map(|p| p.location.as_str()).collect();
        assert_eq!(locs, vec!["U1", "U2", "U3"]);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].row, 3);
        assert_eq!(parsed.issues[0].level, IssueLevel::Error);
    }

    #[test]
    fn test_ccl_only_y() {
        let row = |n, ccl| {
            RawBomRow::with(
                n,
                &[
                    (BomField::Item, "1"),
                    (BomField::Supplier, "TI"),
                    (BomField::SupplierPn, "A"),
                    (BomField::Location, if n == 2 { "U1" } else { "U2" }),
                    (BomField::Ccl, ccl),
                ],
            )
        };
        let parsed = parse_bom_rows(&[row(2, "y"), row(3, "yes")]);
        assert_eq!(parsed.parts[0].ccl, CclFlag::Y);
        assert_eq!(parsed.parts[1].ccl, CclFlag::N);
    }

    #[test]
    fn test_derive_mode() {
        let mut parts = parse_bom_rows(&[main_row(2, "1", "TI", "A", "U1")]).parts;
        assert_eq!(derive_mode("EVT", &parts), BomMode::Npi);
        assert_eq!(derive_mode("mp", &parts), BomMode::Mp);

        parts[0].bom_status = BomStatus::M;
        assert_eq!(derive_mode("DVT", &parts), BomMode::Mp);
    }
}
