//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::EntityId;
use crate::query::{MatchMode, Range, SortDirection, SortKey};

/// Book record as returned by the store. `borrowed` is derived from the
/// loans collection on every fetch, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: EntityId,
    pub name: String,
    pub isbn: Option<String>,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub publisher: Vec<String>,
    pub pages: Option<u32>,
    pub words: Option<u32>,
    pub pub_date: Option<NaiveDate>,
    pub last_updated: DateTime<Utc>,
    pub borrowed: bool,
}

/// Fields for creating a book. Only `name` is required; the list fields
/// accept a single value or a list when deserialized from an import file,
/// with entries stringified.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "book name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub publisher: Vec<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub words: Option<u32>,
    #[serde(default, deserialize_with = "de_pub_date")]
    pub pub_date: Option<NaiveDate>,
}

impl CreateBook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn publisher<I, S>(mut self, publisher: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publisher = publisher.into_iter().map(Into::into).collect();
        self
    }

    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn words(mut self, words: u32) -> Self {
        self.words = Some(words);
        self
    }

    pub fn pub_date(mut self, date: NaiveDate) -> Self {
        self.pub_date = Some(date);
        self
    }
}

/// Partial update: only the provided fields are written, everything else is
/// left untouched. `last_updated` is refreshed regardless.
#[derive(Debug, Clone, Default)]
pub struct UpdateBook {
    pub name: Option<String>,
    pub isbn: Option<String>,
    pub authors: Option<Vec<String>>,
    pub genres: Option<Vec<String>>,
    pub publisher: Option<Vec<String>>,
    pub pages: Option<u32>,
    pub words: Option<u32>,
    pub pub_date: Option<NaiveDate>,
}

impl UpdateBook {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    pub fn publisher<I, S>(mut self, publisher: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publisher = Some(publisher.into_iter().map(Into::into).collect());
        self
    }

    pub fn pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn words(mut self, words: u32) -> Self {
        self.words = Some(words);
        self
    }

    pub fn pub_date(mut self, date: NaiveDate) -> Self {
        self.pub_date = Some(date);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.isbn.is_none()
            && self.authors.is_none()
            && self.genres.is_none()
            && self.publisher.is_none()
            && self.pages.is_none()
            && self.words.is_none()
            && self.pub_date.is_none()
    }
}

/// Search criteria for books. String fields hold terms that AND together;
/// range fields hold alternatives that OR together; distinct fields AND.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub name: Vec<String>,
    pub isbn: Vec<String>,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub publisher: Vec<String>,
    pub pages: Vec<Range<i64>>,
    pub words: Vec<Range<i64>>,
    pub pub_date: Vec<Range<NaiveDate>>,
    pub match_mode: MatchMode,
    pub sort: Vec<(BookSortKey, SortDirection)>,
}

/// Sortable book fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSortKey {
    Name,
    Authors,
    Isbn,
    Pages,
    Words,
    PubDate,
}

impl SortKey for BookSortKey {
    fn column(&self) -> &'static str {
        match self {
            BookSortKey::Name => "name",
            BookSortKey::Authors => "authors",
            BookSortKey::Isbn => "isbn",
            BookSortKey::Pages => "pages",
            BookSortKey::Words => "words",
            BookSortKey::PubDate => "pub_date",
        }
    }
}

/// Accepts a single scalar or a list; entries are stringified.
fn de_string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<serde_json::Value>),
        One(serde_json::Value),
    }

    let values = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => return Ok(Vec::new()),
        Some(OneOrMany::Many(values)) => values,
        Some(OneOrMany::One(value)) => vec![value],
    };
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect())
}

/// Accepts an ISO `YYYY-MM-DD` string or a `{year, month, day}` mapping;
/// invalid calendar parts are rejected.
fn de_pub_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DateInput {
        Parts { year: i32, month: u32, day: u32 },
        Iso(NaiveDate),
    }

    match Option::<DateInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(DateInput::Iso(date)) => Ok(Some(date)),
        Some(DateInput::Parts { year, month, day }) => NaiveDate::from_ymd_opt(year, month, day)
            .map(Some)
            .ok_or_else(|| {
                de::Error::custom(format!(
                    "invalid calendar date: {:04}-{:02}-{:02}",
                    year, month, day
                ))
            }),
    }
}
