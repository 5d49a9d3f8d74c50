//! Query construction layer.
//!
//! Turns sparse, optional search criteria into a store-native filter: a SQL
//! `WHERE` fragment plus the bound arguments that go with it. Semantics:
//!
//! - string fields take a list of terms, each matched case-insensitively
//!   (substring by default, prefix-anchored in [`MatchMode::Prefix`]);
//!   multiple terms on one field AND together, empty terms are ignored;
//! - numeric/date fields take a list of [`Range`] conditions; multiple
//!   ranges on one field OR together, the operators inside a range AND
//!   together;
//! - distinct fields AND together;
//! - an entirely empty specification builds to no `WHERE` clause at all,
//!   i.e. "match everything".

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use crate::models::EntityId;

/// How string terms are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Term may occur anywhere in the field.
    #[default]
    Substring,
    /// Term must match from the start of the field ("exact" lookups).
    Prefix,
}

/// Explicit sort direction. `None` entries are dropped from the ORDER BY
/// clause rather than erroring, matching the lenient handling of a zero
/// direction in interactive use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    fn sql(self) -> Option<&'static str> {
        match self {
            SortDirection::Ascending => Some("ASC"),
            SortDirection::Descending => Some("DESC"),
            SortDirection::None => None,
        }
    }
}

/// A sortable field of some entity. Implemented by per-entity key enums so
/// that an unrecognized sort field is unrepresentable.
pub trait SortKey {
    fn column(&self) -> &'static str;
}

/// Range condition over a numeric or date field. Every bound is
/// independently optional; bounds present in one range AND together.
#[derive(Debug, Clone, Copy, Default)]
pub struct Range<T> {
    pub gte: Option<T>,
    pub gt: Option<T>,
    pub lte: Option<T>,
    pub lt: Option<T>,
    pub eq: Option<T>,
}

impl<T> Range<T> {
    pub fn is_empty(&self) -> bool {
        self.gte.is_none()
            && self.gt.is_none()
            && self.lte.is_none()
            && self.lt.is_none()
            && self.eq.is_none()
    }
}

/// A value bound into the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

/// Scalar types usable as range bounds.
pub trait IntoArg: Copy {
    fn into_arg(self) -> Arg;
}

impl IntoArg for i64 {
    fn into_arg(self) -> Arg {
        Arg::Int(self)
    }
}

impl IntoArg for NaiveDate {
    fn into_arg(self) -> Arg {
        Arg::Date(self)
    }
}

impl IntoArg for DateTime<Utc> {
    fn into_arg(self) -> Arg {
        Arg::DateTime(self)
    }
}

/// Built filter: a `WHERE ...` fragment (empty string when the
/// specification was empty) and its bound arguments, in order.
#[derive(Debug, Default)]
pub struct Filter {
    pub where_sql: String,
    pub args: Vec<Arg>,
}

/// Accumulates per-field conditions; fields AND together.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    clauses: Vec<String>,
    args: Vec<Arg>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `terms` must match `column`, case-insensitively. Empty terms are
    /// ignored.
    pub fn text_all(&mut self, column: &str, terms: &[String], mode: MatchMode) -> &mut Self {
        for term in terms {
            if term.is_empty() {
                continue;
            }
            self.clauses
                .push(format!("lower({}) LIKE ? ESCAPE '\\'", column));
            self.args.push(Arg::Text(like_pattern(term, mode)));
        }
        self
    }

    /// Like [`text_all`](Self::text_all) but for JSON-array columns
    /// (authors, genres, publisher): each term must match at least one
    /// entry of the list.
    pub fn text_all_in_list(&mut self, column: &str, terms: &[String], mode: MatchMode) -> &mut Self {
        for term in terms {
            if term.is_empty() {
                continue;
            }
            self.clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each({}) WHERE lower(json_each.value) LIKE ? ESCAPE '\\')",
                column
            ));
            self.args.push(Arg::Text(like_pattern(term, mode)));
        }
        self
    }

    /// At least one of `ranges` must hold for `column`. Empty ranges are
    /// ignored; if all ranges are empty the field places no constraint.
    pub fn range_any<T: IntoArg>(&mut self, column: &str, ranges: &[Range<T>]) -> &mut Self {
        let mut alternatives = Vec::new();
        for range in ranges {
            if range.is_empty() {
                continue;
            }
            let mut parts = Vec::new();
            for (op, bound) in [
                (">=", range.gte),
                (">", range.gt),
                ("<=", range.lte),
                ("<", range.lt),
                ("=", range.eq),
            ] {
                if let Some(value) = bound {
                    parts.push(format!("{} {} ?", column, op));
                    self.args.push(value.into_arg());
                }
            }
            alternatives.push(format!("({})", parts.join(" AND ")));
        }
        if !alternatives.is_empty() {
            self.clauses.push(format!("({})", alternatives.join(" OR ")));
        }
        self
    }

    /// Exact equality on a scalar column.
    pub fn equals(&mut self, column: &str, arg: Arg) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.args.push(arg);
        self
    }

    /// Exact equality on an identifier column.
    pub fn equals_id(&mut self, column: &str, id: &EntityId) -> &mut Self {
        self.equals(column, Arg::Text(id.to_hex()))
    }

    pub fn build(self) -> Filter {
        if self.clauses.is_empty() {
            return Filter::default();
        }
        Filter {
            where_sql: format!("WHERE {}", self.clauses.join(" AND ")),
            args: self.args,
        }
    }
}

/// Render an `ORDER BY` clause from `(key, direction)` pairs, dropping
/// `SortDirection::None` entries. Empty input (or all-`None`) renders
/// nothing, preserving store-native order.
pub fn order_clause<K: SortKey>(sort: &[(K, SortDirection)]) -> String {
    let columns: Vec<String> = sort
        .iter()
        .filter_map(|(key, dir)| dir.sql().map(|d| format!("{} {}", key.column(), d)))
        .collect();
    if columns.is_empty() {
        String::new()
    } else {
        format!("ORDER BY {}", columns.join(", "))
    }
}

/// Build the LIKE pattern for a term: lowercased, with LIKE metacharacters
/// escaped so terms are matched literally.
fn like_pattern(term: &str, mode: MatchMode) -> String {
    let escaped: String = term
        .to_lowercase()
        .chars()
        .flat_map(|c| match c {
            '\\' | '%' | '_' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    match mode {
        MatchMode::Substring => format!("%{}%", escaped),
        MatchMode::Prefix => format!("{}%", escaped),
    }
}

/// Bind filter arguments onto a prepared query, in order.
pub fn bind_args<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    args: &[Arg],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            Arg::Text(s) => query.bind(s.clone()),
            Arg::Int(i) => query.bind(*i),
            Arg::Bool(b) => query.bind(*b),
            Arg::Date(d) => query.bind(*d),
            Arg::DateTime(t) => query.bind(*t),
        };
    }
    query
}
