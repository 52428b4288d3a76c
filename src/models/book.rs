//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Book record as stored in the `books` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub price: f64,
    pub popularity: i64,
    pub isbn: Option<String>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub price: f64,
    pub isbn: Option<String>,
    #[serde(default)]
    pub popularity: i64,
}

/// Partial update request.
///
/// Absent and `null` fields both mean "leave unchanged": a column cannot be
/// cleared through this payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub isbn: Option<String>,
    pub popularity: Option<i64>,
}

impl UpdateBook {
    /// True when no field would be written
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.price.is_none()
            && self.isbn.is_none()
            && self.popularity.is_none()
    }
}

/// Allowed orderings for book listings. Every ordering breaks ties by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookSort {
    /// Most popular first
    #[default]
    Popularity,
    /// Cheapest first
    Price,
    /// Alphabetical
    Title,
}

impl BookSort {
    /// SQL ORDER BY clause body (trusted, never built from user input)
    pub fn order_clause(&self) -> &'static str {
        match self {
            BookSort::Popularity => "popularity DESC, id ASC",
            BookSort::Price => "price ASC, id ASC",
            BookSort::Title => "title ASC, id ASC",
        }
    }
}

impl std::str::FromStr for BookSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity" => Ok(BookSort::Popularity),
            "price" => Ok(BookSort::Price),
            "title" => Ok(BookSort::Title),
            _ => Err(AppError::BadRequest("invalid sort".to_string())),
        }
    }
}

/// Raw query string of `GET /books`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring matched against title or author
    pub search: Option<String>,
    /// Exact genre
    pub genre: Option<String>,
    /// Exact author
    pub author: Option<String>,
    /// One of popularity (default), price, title
    pub sort: Option<String>,
    /// Page size, 1..=100 (default 20)
    pub limit: Option<i64>,
    /// Only return books with an id strictly greater than this
    pub cursor: Option<i64>,
}

/// Validated listing parameters handed to the repository
#[derive(Debug, Clone, PartialEq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub sort: BookSort,
    pub limit: i64,
    pub cursor: Option<i64>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

impl TryFrom<&BookQuery> for BookFilter {
    type Error = AppError;

    fn try_from(query: &BookQuery) -> AppResult<Self> {
        let sort = match query.sort.as_deref() {
            Some(s) => s.parse()?,
            None => BookSort::default(),
        };

        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LIST_LIMIT
            )));
        }

        Ok(Self {
            search: non_empty(&query.search),
            genre: non_empty(&query.genre),
            author: non_empty(&query.author),
            sort,
            limit,
            cursor: query.cursor,
        })
    }
}
