// ==========================================
// BOM 矩阵管理系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 按文件顺序的原始行（表头 → 单元格文本），保留行号
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 原始数据行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize, // 文件中的行号（表头为第 1 行）
    pub cells: HashMap<String, String>,
}

impl RawRow {
    fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.is_empty())
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser / ExcelParser
pub trait FileParser: Send + Sync {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        let shown = path.display().to_string();
        tracing::warn!("{}", t_with_args("import.file_not_found", &[("path", shown.as_str())]));
        return Err(ImportError::FileNotFound(shown));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if !ext.is_empty() && ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut cells = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    cells.insert(header.clone(), value.trim().to_string());
                }
            }

            let row = RawRow {
                row_number: idx + 2,
                cells,
            };
            // 跳过完全空白的行
            if !row.is_blank() {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
/// `sheet_name` 为空时读取第一个工作表
#[derive(Default)]
pub struct ExcelParser {
    pub sheet_name: Option<String>,
}

impl ExcelParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = match &self.sheet_name {
            Some(name) => {
                if !sheet_names.iter().any(|s| s == name) {
                    return Err(ImportError::ExcelParseError(format!("工作表不存在: {}", name)));
                }
                name.clone()
            }
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let mut cells = HashMap::new();
            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    cells.insert(header.clone(), cell.to_string().trim().to_string());
                }
            }

            let row = RawRow {
                row_number: idx + 2,
                cells,
            };
            if !row.is_blank() {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Default)]
pub struct UniversalFileParser {
    pub sheet_name: Option<String>,
}

impl UniversalFileParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_to_raw_rows(path),
            "xlsx" | "xls" => ExcelParser::new(self.sheet_name.clone()).parse_to_raw_rows(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["Item,Supplier,Location", "1,TI,\"C1,C2\"", "2,ADI,R1"]);

        let rows = CsvParser.parse_to_raw_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].cells.get("Location"), Some(&"C1,C2".to_string()));
        assert_eq!(rows[1].cells.get("Supplier"), Some(&"ADI".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_keeps_row_numbers() {
        let temp_file = csv_file(&["Item,Location", "1,C1", ",", "2,C2"]);

        let rows = CsvParser.parse_to_raw_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser::default().parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
