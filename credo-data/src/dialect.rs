//! SQL dialect profiles.
//!
//! A dialect is plain data selected once per repository from the driver name.
//! The only things that vary between engines are the identifier quote, the
//! placeholder style, the shape of the paging clause and the statement used
//! to empty a table.

use serde::Serialize;

/// How bind parameters are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placeholder {
    /// `?` for every parameter.
    Question,
    /// `$1, $2, ...`.
    Numbered,
}

/// How the offset/limit pair is rendered. Both forms bind `(offset, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Paging {
    /// `OFFSET ? LIMIT ?`
    OffsetLimit,
    /// `LIMIT ?, ?` (SQLite and MySQL do not accept `OFFSET` before `LIMIT`).
    LimitComma,
}

/// Statement used to remove every row of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeleteAll {
    /// `DELETE FROM <table>;` for engines without `TRUNCATE`.
    DeleteFrom,
    /// `TRUNCATE <table>;`
    Truncate,
}

impl DeleteAll {
    pub fn template(self) -> &'static str {
        match self {
            DeleteAll::DeleteFrom => "DELETE FROM {table};",
            DeleteAll::Truncate => "TRUNCATE {table};",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialect {
    name: String,
    quote: char,
    placeholder: Placeholder,
    paging: Paging,
    delete_all: DeleteAll,
}

impl Dialect {
    pub const POSTGRES: &'static str = "postgres";
    pub const SQLITE: &'static str = "sqlite3";
    pub const MYSQL: &'static str = "mysql";

    /// Map a driver identifier to its dialect profile.
    ///
    /// Total: unknown drivers keep their name and get the generic profile
    /// (double-quoted identifiers, `?` placeholders, `TRUNCATE`).
    pub fn resolve(driver: &str) -> Self {
        match driver {
            "pgx" | Self::POSTGRES => Self::postgres(),
            Self::SQLITE => Self::sqlite(),
            Self::MYSQL => Self::mysql(),
            other => Self::generic(other),
        }
    }

    pub fn postgres() -> Self {
        Self {
            name: Self::POSTGRES.to_string(),
            quote: '"',
            placeholder: Placeholder::Numbered,
            paging: Paging::OffsetLimit,
            delete_all: DeleteAll::Truncate,
        }
    }

    pub fn sqlite() -> Self {
        Self {
            name: Self::SQLITE.to_string(),
            quote: '"',
            placeholder: Placeholder::Question,
            paging: Paging::LimitComma,
            delete_all: DeleteAll::DeleteFrom,
        }
    }

    pub fn mysql() -> Self {
        Self {
            name: Self::MYSQL.to_string(),
            quote: '`',
            placeholder: Placeholder::Question,
            paging: Paging::LimitComma,
            delete_all: DeleteAll::Truncate,
        }
    }

    pub fn generic(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quote: '"',
            placeholder: Placeholder::Question,
            paging: Paging::OffsetLimit,
            delete_all: DeleteAll::Truncate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quote_char(&self) -> char {
        self.quote
    }

    pub fn paging(&self) -> Paging {
        self.paging
    }

    pub fn delete_all(&self) -> DeleteAll {
        self.delete_all
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self.placeholder {
            Placeholder::Numbered => format!("${index}"),
            Placeholder::Question => "?".to_string(),
        }
    }

    /// Quote an already validated identifier; dotted paths are quoted per segment.
    pub fn quote(&self, ident: &str) -> String {
        let q = self.quote;
        ident
            .split('.')
            .map(|part| format!("{q}{part}{q}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_names() {
        let cases = [
            ("pgx", "postgres"),
            ("postgres", "postgres"),
            ("sqlite3", "sqlite3"),
            ("mysql", "mysql"),
            ("unknown", "unknown"),
            ("", ""),
        ];
        for (driver, want) in cases {
            assert_eq!(Dialect::resolve(driver).name(), want, "driver {driver:?}");
        }
    }

    #[test]
    fn test_unknown_driver_uses_generic_profile() {
        let d = Dialect::resolve("duckdb");
        assert_eq!(d, Dialect::generic("duckdb"));
        assert_eq!(d.delete_all(), DeleteAll::Truncate);
        assert_eq!(d.placeholder(3), "?");
    }

    #[test]
    fn test_scheme_names_are_not_driver_names() {
        assert_eq!(Dialect::resolve("sqlite"), Dialect::generic("sqlite"));
        assert_eq!(Dialect::resolve("postgresql"), Dialect::generic("postgresql"));
    }

    #[test]
    fn test_delete_all_divergence() {
        assert_eq!(Dialect::sqlite().delete_all().template(), "DELETE FROM {table};");
        assert_eq!(Dialect::postgres().delete_all().template(), "TRUNCATE {table};");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(Dialect::postgres().quote("users.id"), "\"users\".\"id\"");
        assert_eq!(Dialect::mysql().quote("users"), "`users`");
        assert_eq!(Dialect::postgres().placeholder(2), "$2");
    }
}
