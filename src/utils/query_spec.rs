use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
    Like,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Like => "LIKE",
        }
    }
}

/// One predicate of a WHERE clause. Field names are chosen by the store
/// module, never taken from request input.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Cmp {
        field: &'static str,
        op: Op,
        value: SqlValue,
    },
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: &'static str, value: SqlValue) -> Self {
        Condition::Cmp { field, op: Op::Eq, value }
    }

    pub fn gte(field: &'static str, value: SqlValue) -> Self {
        Condition::Cmp { field, op: Op::Gte, value }
    }

    pub fn lte(field: &'static str, value: SqlValue) -> Self {
        Condition::Cmp { field, op: Op::Lte, value }
    }

    /// Substring match; LIKE wildcards in `needle` are escaped.
    pub fn contains(field: &'static str, needle: &str) -> Self {
        Condition::Cmp {
            field,
            op: Op::Like,
            value: SqlValue::String(format!("%{}%", escape_like(needle))),
        }
    }

    fn render(&self, sql: &mut String, values: &mut Vec<SqlValue>) {
        match self {
            Condition::Cmp { field, op, value } => {
                sql.push_str(field);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                values.push(value.clone());
            }
            Condition::AnyOf(alternatives) => {
                sql.push('(');
                for (i, c) in alternatives.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    c.render(sql, values);
                }
                sql.push(')');
            }
        }
    }
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// ===============================
/// Typed filter specification
/// ===============================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    conditions: Vec<Condition>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        match condition {
            Condition::AnyOf(ref alternatives) if alternatives.is_empty() => {}
            c => self.conditions.push(c),
        }
        self
    }

    pub fn and_if(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(c) => self.and(c),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders `" WHERE a = ? AND (b LIKE ? OR c LIKE ?)"` (empty string when
    /// there are no conditions) and the bind values in placeholder order.
    pub fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut values = Vec::new();
        if self.is_empty() {
            return (sql, values);
        }

        for (i, c) in self.conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            c.render(&mut sql, &mut values);
        }

        (sql, values)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("No fields provided for update")]
    EmptyUpdate,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build typed UPDATE SQL
/// ===============================
pub fn build_update_sql(
    table: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
    id_column: &'static str,
    id_value: u64,
) -> Result<SqlUpdate, QueryError> {
    if assignments.is_empty() {
        return Err(QueryError::EmptyUpdate);
    }

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// Binds every value onto a sqlx `query`, `query_as` or `query_scalar` builder.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                $crate::utils::query_spec::SqlValue::String(v) => query.bind(v),
                $crate::utils::query_spec::SqlValue::U64(v) => query.bind(v),
                $crate::utils::query_spec::SqlValue::Date(v) => query.bind(v),
                $crate::utils::query_spec::SqlValue::DateTime(v) => query.bind(v),
            };
        }
        query
    }};
}

pub(crate) use bind_values;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_renders_nothing() {
        let (sql, values) = QuerySpec::new().where_clause();
        assert_eq!(sql, "");
        assert!(values.is_empty());
    }

    #[test]
    fn conditions_are_joined_in_order() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let spec = QuerySpec::new()
            .and(Condition::eq("a.member_id", SqlValue::U64(4)))
            .and(Condition::gte("a.checkin_date", SqlValue::Date(d)));

        let (sql, values) = spec.where_clause();
        assert_eq!(sql, " WHERE a.member_id = ? AND a.checkin_date >= ?");
        assert_eq!(values, vec![SqlValue::U64(4), SqlValue::Date(d)]);
    }

    #[test]
    fn any_of_is_parenthesized() {
        let spec = QuerySpec::new()
            .and(Condition::eq("m.id", SqlValue::U64(1)))
            .and(Condition::AnyOf(vec![
                Condition::contains("m.full_name", "kab"),
                Condition::contains("m.phone", "kab"),
            ]));

        let (sql, values) = spec.where_clause();
        assert_eq!(sql, " WHERE m.id = ? AND (m.full_name LIKE ? OR m.phone LIKE ?)");
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], SqlValue::String("%kab%".into()));
    }

    #[test]
    fn empty_any_of_and_none_are_skipped() {
        let spec = QuerySpec::new()
            .and(Condition::AnyOf(vec![]))
            .and_if(None);
        assert!(spec.is_empty());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        let c = Condition::contains("m.full_name", "50%_off");
        match c {
            Condition::Cmp { value, .. } => {
                assert_eq!(value, SqlValue::String("%50\\%\\_off%".into()))
            }
            _ => panic!("expected comparison"),
        }
    }

    #[test]
    fn update_sql_appends_id() {
        let update = build_update_sql(
            "members",
            vec![
                ("full_name", SqlValue::String("Kabir".into())),
                ("age", SqlValue::U64(31)),
            ],
            "id",
            9,
        )
        .unwrap();

        assert_eq!(update.sql, "UPDATE members SET full_name = ?, age = ? WHERE id = ?");
        assert_eq!(update.values.last(), Some(&SqlValue::U64(9)));
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = build_update_sql("members", vec![], "id", 1).unwrap_err();
        assert_eq!(err, QueryError::EmptyUpdate);
    }
}
