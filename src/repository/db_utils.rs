// ==========================================
// BOM 矩阵管理系统 - 数据库工具模块
// ==========================================
// 职责: 仓储共用的事务开启/提交、行映射、部分更新 SET 子句构建
// ==========================================

use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Transaction};

use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// 事务
// ==========================================

/// 开启事务；失败归为 DatabaseTransactionError
pub fn begin(conn: &mut Connection) -> RepositoryResult<Transaction<'_>> {
    conn.transaction()
        .map_err(|e| RepositoryError::DatabaseTransactionError(format!("开启事务失败: {}", e)))
}

/// 提交事务
///
/// 提交阶段的约束失败（延迟外键）仍按约束错误上抛
pub fn commit(tx: Transaction<'_>) -> RepositoryResult<()> {
    tx.commit().map_err(|e| {
        let err = RepositoryError::from(e);
        if err.is_constraint_violation() {
            err
        } else {
            RepositoryError::DatabaseTransactionError(format!("提交事务失败: {}", err))
        }
    })
}

/// 解析枚举文本列，失败时返回 FromSqlConversionFailure
pub fn parse_enum_column<T>(
    idx: usize,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法识别的枚举值: {}", raw).into(),
        )
    })
}

/// 解析可空枚举文本列
pub fn parse_optional_enum_column<T>(
    idx: usize,
    raw: Option<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_enum_column(idx, &s, parse).map(Some),
    }
}

fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

// ==========================================
// SetClause - 部分更新
// ==========================================
/// 由结构化的部分更新生成 `col = ?` 列表与参数
///
/// # 示例
/// ```
/// use bom_matrix::repository::db_utils::SetClause;
///
/// let mut set = SetClause::new();
/// set.text("remark", "NEW");
/// set.nullable_text("hhpn", None);
/// assert_eq!(set.sql(), "remark = ?, hhpn = ?");
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SetClause {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl SetClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, column: &'static str, value: &str) {
        self.columns.push(column);
        self.values.push(Value::Text(value.to_string()));
    }

    pub fn nullable_text(&mut self, column: &'static str, value: Option<&str>) {
        self.columns.push(column);
        self.values.push(opt_text(value));
    }

    pub fn integer(&mut self, column: &'static str, value: i64) {
        self.columns.push(column);
        self.values.push(Value::Integer(value));
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn sql(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 返回 SET 参数，并在末尾追加 WHERE 参数
    pub fn into_params(self, where_params: Vec<Value>) -> Vec<Value> {
        let mut values = self.values;
        values.extend(where_params);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BomStatus;

    #[test]
    fn test_begin_inside_open_transaction_is_transaction_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("BEGIN").unwrap();

        let err = begin(&mut conn).unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseTransactionError(_)));
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_begin_and_commit() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();

        let tx = begin(&mut conn).unwrap();
        tx.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
        commit(tx).unwrap();

        let n: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_parse_enum_column() {
        assert_eq!(parse_enum_column(0, "P", BomStatus::parse).unwrap(), BomStatus::P);
        assert!(parse_enum_column(0, "Q", BomStatus::parse).is_err());
    }

    #[test]
    fn test_parse_optional_enum_column() {
        assert_eq!(
            parse_optional_enum_column(0, None, BomStatus::parse).unwrap(),
            None
        );
        assert_eq!(
            parse_optional_enum_column(0, Some("".to_string()), BomStatus::parse).unwrap(),
            None
        );
        assert_eq!(
            parse_optional_enum_column(0, Some("X".to_string()), BomStatus::parse).unwrap(),
            Some(BomStatus::X)
        );
    }

    #[test]
    fn test_set_clause_params_order() {
        let mut set = SetClause::new();
        set.integer("item", 3);
        set.text("supplier", "TI");
        let sql = set.sql();
        let params = set.into_params(vec![Value::Integer(9)]);
        assert_eq!(sql, "item = ?, supplier = ?");
        assert_eq!(
            params,
            vec![
                Value::Integer(3),
                Value::Text("TI".to_string()),
                Value::Integer(9)
            ]
        );
    }
}
