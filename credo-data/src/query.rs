use crate::dialect::{Dialect, Paging};
use crate::entity::Entity;
use crate::page::PageParams;
use crate::table::TableDescriptor;
use crate::value::Value;

/// Generated SQL text with its bind arguments in placeholder order.
pub type Statement = (String, Vec<Value>);

/// A fluent builder for parameterised statements against one table.
///
/// Identifiers are validated and quoted in the dialect's style; every value
/// travels as a bind argument.
///
/// # Example
///
/// ```
/// use credo_data::{Dialect, QueryBuilder, Value};
///
/// let dialect = Dialect::postgres();
/// let (sql, args) = QueryBuilder::new(&dialect, "users")
///     .where_eq("email", "a@b.com")
///     .order_by("id", true)
///     .build_select()
///     .unwrap();
/// assert_eq!(sql, r#"SELECT * FROM "users" WHERE "email" = $1 ORDER BY "id" ASC"#);
/// assert_eq!(args, vec![Value::from("a@b.com")]);
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'d> {
    dialect: &'d Dialect,
    table: String,
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    paging: Option<(u64, u64)>,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// Collects bind arguments and hands out the matching placeholders.
struct Binds<'d> {
    dialect: &'d Dialect,
    args: Vec<Value>,
}

impl<'d> Binds<'d> {
    fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            args: Vec::new(),
        }
    }

    fn push(&mut self, value: Value) -> String {
        self.args.push(value);
        self.dialect.placeholder(self.args.len())
    }
}

impl<'d> QueryBuilder<'d> {
    pub fn new(dialect: &'d Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            paging: None,
        }
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn where_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.conditions
            .push(Condition::In(column.to_string(), values));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Bound `(offset, limit)` paging clause.
    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.paging = Some((offset, limit));
        self
    }

    /// `SELECT * FROM <table> [WHERE ...] [ORDER BY ...] [paging]`.
    pub fn build_select(&self) -> Result<Statement, QueryError> {
        let mut binds = Binds::new(self.dialect);
        let mut sql = format!("SELECT * FROM {}", self.ident(&self.table, "table")?);
        self.append_where(&mut sql, &mut binds)?;
        self.append_order(&mut sql)?;
        self.append_paging(&mut sql, &mut binds)?;
        Ok((sql, binds.args))
    }

    /// `SELECT COUNT(<column>) FROM <table>;`
    pub fn build_count(&self, column: &str) -> Result<Statement, QueryError> {
        let mut binds = Binds::new(self.dialect);
        let mut sql = format!(
            "SELECT COUNT({}) FROM {}",
            self.ident(column, "column")?,
            self.ident(&self.table, "table")?
        );
        self.append_where(&mut sql, &mut binds)?;
        sql.push(';');
        Ok((sql, binds.args))
    }

    /// `DELETE FROM <table> [WHERE ...]`.
    pub fn build_delete(&self) -> Result<Statement, QueryError> {
        let mut binds = Binds::new(self.dialect);
        let mut sql = format!("DELETE FROM {}", self.ident(&self.table, "table")?);
        self.append_where(&mut sql, &mut binds)?;
        Ok((sql, binds.args))
    }

    /// `INSERT INTO <table> (<columns>) VALUES (<placeholders>)`.
    pub fn build_insert(&self, columns: &[&str], values: Vec<Value>) -> Result<Statement, QueryError> {
        check_columns(columns, &values)?;
        let mut binds = Binds::new(self.dialect);
        let cols = columns
            .iter()
            .map(|c| self.ident(c, "column"))
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders: Vec<_> = values.into_iter().map(|v| binds.push(v)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.ident(&self.table, "table")?,
            cols.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, binds.args))
    }

    /// `UPDATE <table> SET <col> = ?, ... [WHERE ...]`.
    ///
    /// SET arguments come first, condition arguments after them.
    pub fn build_update(&self, columns: &[&str], values: Vec<Value>) -> Result<Statement, QueryError> {
        check_columns(columns, &values)?;
        let mut binds = Binds::new(self.dialect);
        let mut assignments = Vec::with_capacity(columns.len());
        for (col, value) in columns.iter().zip(values) {
            let col = self.ident(col, "column")?;
            let placeholder = binds.push(value);
            assignments.push(format!("{col} = {placeholder}"));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.ident(&self.table, "table")?,
            assignments.join(", ")
        );
        self.append_where(&mut sql, &mut binds)?;
        Ok((sql, binds.args))
    }

    fn append_where(&self, sql: &mut String, binds: &mut Binds<'_>) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        sql.push_str(" WHERE ");
        let mut first = true;
        for cond in &self.conditions {
            if !first {
                sql.push_str(" AND ");
            }
            first = false;
            match cond {
                Condition::Eq(col, val) => {
                    let col = self.ident(col, "column")?;
                    let placeholder = binds.push(val.clone());
                    sql.push_str(&format!("{col} = {placeholder}"));
                }
                Condition::In(col, vals) => {
                    let col = self.ident(col, "column")?;
                    let placeholders: Vec<_> =
                        vals.iter().map(|v| binds.push(v.clone())).collect();
                    sql.push_str(&format!("{col} IN ({})", placeholders.join(", ")));
                }
            }
        }
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        sql.push_str(" ORDER BY ");
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.ident(col, "column")?;
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_paging(&self, sql: &mut String, binds: &mut Binds<'_>) -> Result<(), QueryError> {
        let Some((offset, limit)) = self.paging else {
            return Ok(());
        };
        let offset = binds.push(Value::Int(to_i64(offset)?));
        let limit = binds.push(Value::Int(to_i64(limit)?));
        match self.dialect.paging() {
            Paging::OffsetLimit => sql.push_str(&format!(" OFFSET {offset} LIMIT {limit}")),
            Paging::LimitComma => sql.push_str(&format!(" LIMIT {offset}, {limit}")),
        }
        Ok(())
    }

    fn ident(&self, ident: &str, kind: &'static str) -> Result<String, QueryError> {
        validate_identifier(ident, kind)?;
        Ok(self.dialect.quote(ident))
    }
}

/// The fixed set of statements a repository issues for one table.
///
/// The count and delete-all statements never change, so they are rendered
/// once here; everything else is built per call.
#[derive(Debug, Clone)]
pub struct Statements {
    dialect: Dialect,
    table: TableDescriptor,
    count: String,
    delete_all: String,
}

impl Statements {
    pub fn new(dialect: Dialect, table: TableDescriptor) -> Self {
        // Both names were validated by `TableDescriptor::new`.
        let quoted_table = dialect.quote(table.name());
        let count = format!(
            "SELECT COUNT({}) FROM {quoted_table};",
            dialect.quote(table.id_column())
        );
        let delete_all = dialect
            .delete_all()
            .template()
            .replace("{table}", &quoted_table);
        Self {
            dialect,
            table,
            count,
            delete_all,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.dialect, self.table.name())
    }

    pub fn select_all(&self) -> Result<Statement, QueryError> {
        self.builder().build_select()
    }

    pub fn select_by_id(&self, id: Value) -> Result<Statement, QueryError> {
        self.builder()
            .where_eq(self.table.id_column(), id)
            .build_select()
    }

    /// Rows come back in ascending identity order, not in `ids` order.
    pub fn select_by_ids(&self, ids: Vec<Value>) -> Result<Statement, QueryError> {
        let id_column = self.table.id_column();
        self.builder()
            .where_in(id_column, ids)
            .order_by(id_column, true)
            .build_select()
    }

    pub fn insert<T: Entity>(&self, entity: &T) -> Result<Statement, QueryError> {
        self.builder().build_insert(T::columns(), entity.values())
    }

    /// Every mapped column is written, the identity column included; the
    /// filter argument comes last.
    pub fn update<T: Entity>(&self, id: Value, entity: &T) -> Result<Statement, QueryError> {
        self.builder()
            .where_eq(self.table.id_column(), id)
            .build_update(T::columns(), entity.values())
    }

    pub fn delete(&self, id: Value) -> Result<Statement, QueryError> {
        self.builder()
            .where_eq(self.table.id_column(), id)
            .build_delete()
    }

    pub fn delete_all(&self) -> Statement {
        (self.delete_all.clone(), Vec::new())
    }

    pub fn count(&self) -> Statement {
        (self.count.clone(), Vec::new())
    }

    /// `SELECT * ... ORDER BY ... <paging>` binding `(offset, limit)`.
    pub fn page(&self, params: &PageParams) -> Result<Statement, QueryError> {
        let offset = params.offset()?;
        let ascending = !params.sort_desc();
        let builder = params
            .sort_by()
            .iter()
            .fold(self.builder(), |b, col| b.order_by(col, ascending));
        builder.page(offset, params.page_size()).build_select()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid {kind} identifier: {ident:?}")]
    InvalidIdentifier { kind: &'static str, ident: String },

    #[error("entity maps {columns} columns but produced {values} values")]
    ColumnMismatch { columns: usize, values: usize },

    #[error("entity maps no columns")]
    NoColumns,

    #[error("page offset overflows: page {page} * size {size}")]
    OffsetOverflow { page: u64, size: u64 },

    #[error("value {0} does not fit a signed 64-bit bind argument")]
    OutOfRange(u64),
}

fn check_columns(columns: &[&str], values: &[Value]) -> Result<(), QueryError> {
    if columns.is_empty() {
        return Err(QueryError::NoColumns);
    }
    if columns.len() != values.len() {
        return Err(QueryError::ColumnMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }
    Ok(())
}

fn to_i64(v: u64) -> Result<i64, QueryError> {
    i64::try_from(v).map_err(|_| QueryError::OutOfRange(v))
}

/// Reject anything that is not a plain, optionally dotted, identifier.
pub fn validate_identifier(ident: &str, kind: &'static str) -> Result<(), QueryError> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageRequest;
    use crate::value::{FromRecord, Record};
    use crate::DataError;

    struct TestObj {
        id: String,
        name: String,
    }

    impl FromRecord for TestObj {
        fn from_record(record: &Record) -> Result<Self, DataError> {
            Ok(Self {
                id: record.get("id")?,
                name: record.get("name")?,
            })
        }
    }

    impl Entity for TestObj {
        fn columns() -> &'static [&'static str] {
            &["id", "name"]
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.clone().into(), self.name.clone().into()]
        }
    }

    fn statements(driver: &str) -> Statements {
        let table = TableDescriptor::new("test_table", "id").unwrap();
        Statements::new(Dialect::resolve(driver), table)
    }

    fn obj() -> TestObj {
        TestObj {
            id: "12".into(),
            name: "test12".into(),
        }
    }

    #[test]
    fn test_select_all() {
        let (sql, args) = statements("sqlite3").select_all().unwrap();
        assert_eq!(sql, r#"SELECT * FROM "test_table""#);
        assert!(args.is_empty());
    }

    #[test]
    fn test_select_by_id() {
        let (sql, args) = statements("sqlite3").select_by_id("test_id".into()).unwrap();
        assert_eq!(sql, r#"SELECT * FROM "test_table" WHERE "id" = ?"#);
        assert_eq!(args, vec![Value::from("test_id")]);
    }

    #[test]
    fn test_select_by_ids_keeps_argument_order() {
        let ids = vec!["0".into(), "3".into(), "16".into()];
        let (sql, args) = statements("pgx").select_by_ids(ids).unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "test_table" WHERE "id" IN ($1, $2, $3) ORDER BY "id" ASC"#
        );
        assert_eq!(args, vec![Value::from("0"), Value::from("3"), Value::from("16")]);
    }

    #[test]
    fn test_insert() {
        let (sql, args) = statements("mysql").insert(&obj()).unwrap();
        assert_eq!(sql, "INSERT INTO `test_table` (`id`, `name`) VALUES (?, ?)");
        assert_eq!(args, vec![Value::from("12"), Value::from("test12")]);
    }

    #[test]
    fn test_update_writes_identity_twice() {
        let (sql, args) = statements("postgres").update("12".into(), &obj()).unwrap();
        assert_eq!(
            sql,
            r#"UPDATE "test_table" SET "id" = $1, "name" = $2 WHERE "id" = $3"#
        );
        assert_eq!(
            args,
            vec![Value::from("12"), Value::from("test12"), Value::from("12")]
        );
    }

    #[test]
    fn test_delete() {
        let (sql, args) = statements("sqlite3").delete("test_id".into()).unwrap();
        assert_eq!(sql, r#"DELETE FROM "test_table" WHERE "id" = ?"#);
        assert_eq!(args, vec![Value::from("test_id")]);
    }

    #[test]
    fn test_delete_all_per_dialect() {
        assert_eq!(statements("sqlite3").delete_all().0, r#"DELETE FROM "test_table";"#);
        assert_eq!(statements("pgx").delete_all().0, r#"TRUNCATE "test_table";"#);
        assert_eq!(statements("whatever").delete_all().0, r#"TRUNCATE "test_table";"#);
        assert!(statements("sqlite3").delete_all().1.is_empty());
    }

    #[test]
    fn test_count_uses_identity_column() {
        let (sql, args) = statements("sqlite3").count();
        assert_eq!(sql, r#"SELECT COUNT("id") FROM "test_table";"#);
        assert!(args.is_empty());
    }

    #[test]
    fn test_page_default_sort() {
        let params = PageRequest::new().page_number(2).page_size(5).resolve("id").unwrap();

        let (sql, args) = statements("postgres").page(&params).unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "test_table" ORDER BY "id" ASC OFFSET $1 LIMIT $2"#
        );
        assert_eq!(args, vec![Value::Int(10), Value::Int(5)]);

        let (sql, args) = statements("sqlite3").page(&params).unwrap();
        assert_eq!(sql, r#"SELECT * FROM "test_table" ORDER BY "id" ASC LIMIT ?, ?"#);
        assert_eq!(args, vec![Value::Int(10), Value::Int(5)]);
    }

    #[test]
    fn test_page_shared_direction() {
        let params = PageRequest::new()
            .sort_by("name")
            .sort_by("id")
            .sort_desc()
            .resolve("id")
            .unwrap();
        let (sql, _) = statements("unknown").page(&params).unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "test_table" ORDER BY "name" DESC, "id" DESC OFFSET ? LIMIT ?"#
        );
    }

    #[test]
    fn test_invalid_sort_column() {
        let params = PageRequest::new().sort_by("name; DROP TABLE x").resolve("id").unwrap();
        let err = statements("sqlite3").page(&params).unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "column", .. }));
    }

    #[test]
    fn test_column_mismatch() {
        let dialect = Dialect::sqlite();
        let err = QueryBuilder::new(&dialect, "t")
            .build_insert(&["a", "b"], vec![Value::Int(1)])
            .unwrap_err();
        assert_eq!(err, QueryError::ColumnMismatch { columns: 2, values: 1 });

        let err = QueryBuilder::new(&dialect, "t")
            .build_update(&[], Vec::new())
            .unwrap_err();
        assert_eq!(err, QueryError::NoColumns);
    }

    #[test]
    fn test_generic_builder_conditions() {
        let dialect = Dialect::postgres();
        let (sql, args) = QueryBuilder::new(&dialect, "users")
            .where_eq("status", "active")
            .where_in("role", vec!["admin".into(), "user".into()])
            .build_count("id")
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT COUNT("id") FROM "users" WHERE "status" = $1 AND "role" IN ($2, $3);"#
        );
        assert_eq!(args.len(), 3);
    }
}
