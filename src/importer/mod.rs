// ==========================================
// BOM 矩阵管理系统 - 导入 / 导出层
// ==========================================
// 职责: Excel/CSV → 料件 + 替代料；聚合视图 → CSV
// 支持: .xlsx / .xls / .csv
// ==========================================

// 模块声明
pub mod bom_exporter;
pub mod bom_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use bom_exporter::{export_view_csv, write_view_csv};
pub use bom_importer::{
    derive_mode, parse_bom_rows, BomImporter, ImportIssue, ImportReport, ImportRequest,
    IssueLevel, ParsedBom,
};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{BomField, BomFieldMapper, RawBomRow};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
