//! Translation of bucket queries into parameterised PostgreSQL.
//!
//! Predicates become a `WHERE` clause and sort orders an `ORDER BY` clause.
//! Every comparison is wrapped so it yields `TRUE` or `FALSE`, never `NULL`,
//! which keeps `NOT` and null handling identical to in-process evaluation.

use domain::{
    Bucket, BucketQuery, Comparison, Predicate, RepositoryError, RepositoryResult, SortDirection,
    SortOrder, Value,
};
use uuid::Uuid;

const SELECT_BUCKETS: &str = "SELECT b.id, b.name, b.description, b.size, b.version FROM buckets b";

/// Item count of the bucket aliased `b`.
const ITEM_COUNT_SQL: &str = "(SELECT COUNT(*) FROM items i WHERE i.bucket_id = b.id)";

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Uuid(Uuid),
}

/// A statement with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int,
    Text,
    Uuid,
}

struct Column {
    expr: String,
    ty: ColumnType,
    nullable: bool,
}

fn column(property: &str) -> RepositoryResult<Column> {
    let (expr, ty, nullable) = match property {
        "Id" => ("b.id".to_string(), ColumnType::Uuid, false),
        "Name" => ("b.name".to_string(), ColumnType::Text, true),
        "Description" => ("b.description".to_string(), ColumnType::Text, true),
        "Size" => ("b.size".to_string(), ColumnType::Int, false),
        "ItemCount" => (ITEM_COUNT_SQL.to_string(), ColumnType::Int, false),
        "Available" => (format!("(b.size - {ITEM_COUNT_SQL})"), ColumnType::Int, false),
        other => {
            return Err(RepositoryError::Unsupported(format!(
                "property '{other}' has no column"
            )));
        }
    };

    // Byte-wise collation so text orders the way `String` does.
    let expr = if ty == ColumnType::Text {
        format!("{expr} COLLATE \"C\"")
    } else {
        expr
    };

    Ok(Column { expr, ty, nullable })
}

#[derive(Default)]
struct Builder {
    params: Vec<SqlParam>,
}

impl Builder {
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn predicate(&mut self, predicate: &Predicate<Bucket>) -> RepositoryResult<String> {
        match predicate {
            Predicate::Constant(true) => Ok("TRUE".to_string()),
            Predicate::Constant(false) => Ok("FALSE".to_string()),
            Predicate::Compare {
                property,
                op,
                value,
            } => self.compare(property.name(), *op, value),
            Predicate::And(children) if children.is_empty() => Ok("TRUE".to_string()),
            Predicate::And(children) => {
                let parts = children
                    .iter()
                    .map(|c| self.predicate(c))
                    .collect::<RepositoryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" AND ")))
            }
            Predicate::Not(inner) => Ok(format!("(NOT {})", self.predicate(inner)?)),
        }
    }

    fn compare(
        &mut self,
        property: &str,
        op: Comparison,
        value: &Value,
    ) -> RepositoryResult<String> {
        let column = column(property)?;

        let param = match (column.ty, value) {
            (_, Value::Null) => {
                return Ok(match op {
                    Comparison::Eq => format!("({} IS NULL)", column.expr),
                    Comparison::Ne => format!("({} IS NOT NULL)", column.expr),
                    _ => "FALSE".to_string(),
                });
            }
            (_, Value::List(_)) => {
                return Err(RepositoryError::Unsupported(format!(
                    "list value in comparison on '{property}'"
                )));
            }
            (ColumnType::Int, Value::Int(v)) => SqlParam::Int(*v),
            (ColumnType::Text, Value::Text(v)) => SqlParam::Text(v.clone()),
            (ColumnType::Uuid, Value::Uuid(v)) => SqlParam::Uuid(*v),
            // Values of another kind never equal the column and never order against it.
            _ => {
                return Ok(if op == Comparison::Ne { "TRUE" } else { "FALSE" }.to_string());
            }
        };

        let placeholder = self.bind(param);
        let sql = match op {
            Comparison::Ne => format!("({} IS DISTINCT FROM {placeholder})", column.expr),
            _ if column.nullable => format!(
                "COALESCE({} {} {placeholder}, FALSE)",
                column.expr,
                op.symbol()
            ),
            _ => format!("({} {} {placeholder})", column.expr, op.symbol()),
        };
        Ok(sql)
    }
}

/// Builds the `ORDER BY` terms for a sort order, without the keywords.
///
/// Nulls sort first ascending and last descending, matching `Value`'s order.
pub fn order_terms(sort: &SortOrder<Bucket>) -> RepositoryResult<Vec<String>> {
    sort.keys()
        .iter()
        .map(|key| {
            let column = column(key.property().name())?;
            let nulls = match key.direction() {
                SortDirection::Ascending => "NULLS FIRST",
                SortDirection::Descending => "NULLS LAST",
            };
            Ok(format!(
                "{} {} {nulls}",
                column.expr,
                key.direction().keyword()
            ))
        })
        .collect()
}

/// Builds a `SELECT` over `buckets` for the given query.
///
/// Rows come back in sort-key order, ties (and unsorted queries) in
/// insertion order.
pub fn select_buckets(query: &BucketQuery) -> RepositoryResult<Statement> {
    let mut builder = Builder::default();

    let filter = builder.predicate(query.specification.predicate())?;

    let mut order = match &query.sort {
        Some(sort) => order_terms(sort)?,
        None => Vec::new(),
    };
    order.push("b.seq ASC".to_string());

    let mut sql = format!(
        "{SELECT_BUCKETS} WHERE {filter} ORDER BY {}",
        order.join(", ")
    );

    if let Some(limit) = query.limit {
        let placeholder = builder.bind(SqlParam::Int(to_i64(limit)));
        sql.push_str(&format!(" LIMIT {placeholder}"));
    }
    if let Some(offset) = query.offset {
        let placeholder = builder.bind(SqlParam::Int(to_i64(offset)));
        sql.push_str(&format!(" OFFSET {placeholder}"));
    }

    Ok(Statement {
        sql,
        params: builder.params,
    })
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
