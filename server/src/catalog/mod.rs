//! Catalog query engine
//!
//! Turns raw, untrusted query-string parameters into a validated
//! filter + sort + pagination triple the movie repository can execute.
//! Filters are additive (AND); `is_active = 1` is always enforced by
//! the repository and cannot be switched off from the outside.

use crate::db::models::MovieStatus;
use serde::Deserialize;
use shared::{ApiError, ApiResult};
use sqlx::{QueryBuilder, Sqlite};

/// Page size used when the caller does not send one
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Hard cap on page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query-string parameters, exactly as the client sent them
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawCatalogParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Sortable movie columns. Everything else is rejected, so the sort
/// field can be spliced into SQL directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Title,
    Year,
    Rating,
    AverageRating,
    Views,
    Popularity,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Year => "year",
            SortField::Rating => "rating",
            SortField::AverageRating => "average_rating",
            SortField::Views => "views",
            SortField::Popularity => "popularity",
        }
    }

    fn parse(s: &str) -> Option<SortField> {
        match s {
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            "title" => Some(SortField::Title),
            "year" => Some(SortField::Year),
            "rating" => Some(SortField::Rating),
            "averageRating" | "average_rating" => Some(SortField::AverageRating),
            "views" => Some(SortField::Views),
            "popularity" => Some(SortField::Popularity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated catalog query
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i64>,
    pub status: Option<MovieStatus>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            year: None,
            status: None,
            // Newest first unless the caller overrides
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// Validate raw parameters. Bad values are rejected, not silently
    /// corrected, except that the page size is clamped to the cap.
    pub fn parse(raw: RawCatalogParams) -> ApiResult<Self> {
        let mut query = CatalogQuery::default();

        if let Some(search) = raw.search {
            let search = search.trim().to_string();
            if !search.is_empty() {
                query.search = Some(search);
            }
        }

        if let Some(genre) = raw.genre {
            let genre = genre.trim().to_string();
            if !genre.is_empty() {
                query.genre = Some(genre);
            }
        }

        if let Some(year) = raw.year {
            let year: i64 = year
                .parse()
                .map_err(|_| ApiError::validation(format!("year must be a number, got {year:?}")))?;
            query.year = Some(year);
        }

        if let Some(status) = raw.status {
            let status = status
                .parse::<MovieStatus>()
                .map_err(|e| ApiError::validation(e))?;
            query.status = Some(status);
        }

        if let Some(sort) = raw.sort {
            query.sort = SortField::parse(&sort)
                .ok_or_else(|| ApiError::validation(format!("{sort:?} is not sortable")))?;
            // Explicit sort defaults to ascending, like the original API
            query.order = SortOrder::Asc;
        }

        if let Some(order) = raw.order {
            query.order = match order.as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                other => {
                    return Err(ApiError::validation(format!(
                        "order must be asc or desc, got {other:?}"
                    )));
                }
            };
        }

        if let Some(page) = raw.page {
            let page: u32 = page
                .parse()
                .map_err(|_| ApiError::validation(format!("page must be a number, got {page:?}")))?;
            if page == 0 {
                return Err(ApiError::validation("page is 1-based"));
            }
            query.page = page;
        }

        if let Some(limit) = raw.limit {
            let limit: u32 = limit.parse().map_err(|_| {
                ApiError::validation(format!("limit must be a number, got {limit:?}"))
            })?;
            if limit == 0 {
                return Err(ApiError::validation("limit must be positive"));
            }
            query.limit = limit.min(MAX_PAGE_SIZE);
        }

        Ok(query)
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }

    /// Append the WHERE clauses for this query. The caller has already
    /// written `WHERE is_active = 1`.
    pub fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(search) = &self.search {
            // LIKE is case-insensitive for ASCII in SQLite
            let pattern = format!("%{search}%");
            qb.push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR description LIKE ")
                .push_bind(pattern.clone())
                .push(" OR director LIKE ")
                .push_bind(pattern.clone())
                .push(
                    " OR EXISTS (SELECT 1 FROM json_each(movies.cast_list) \
                       WHERE json_each.value LIKE ",
                )
                .push_bind(pattern)
                .push("))");
        }

        if let Some(genre) = &self.genre {
            qb.push(
                " AND EXISTS (SELECT 1 FROM json_each(movies.genres) WHERE json_each.value = ",
            )
            .push_bind(genre.clone())
            .push(")");
        }

        if let Some(year) = self.year {
            qb.push(" AND year = ").push_bind(year);
        }

        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawCatalogParams {
        let mut params = RawCatalogParams::default();
        for (key, value) in pairs {
            let value = value.to_string();
            match *key {
                "search" => params.search = Some(value),
                "genre" => params.genre = Some(value),
                "year" => params.year = Some(value),
                "status" => params.status = Some(value),
                "sort" => params.sort = Some(value),
                "order" => params.order = Some(value),
                "page" => params.page = Some(value),
                "limit" => params.limit = Some(value),
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn defaults_to_newest_first() {
        let query = CatalogQuery::parse(RawCatalogParams::default()).unwrap();
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn parses_combined_filters() {
        let query = CatalogQuery::parse(raw(&[
            ("search", "matrix"),
            ("genre", "Action"),
            ("year", "1999"),
            ("status", "released"),
            ("page", "2"),
            ("limit", "10"),
        ]))
        .unwrap();

        assert_eq!(query.search.as_deref(), Some("matrix"));
        assert_eq!(query.genre.as_deref(), Some("Action"));
        assert_eq!(query.year, Some(1999));
        assert_eq!(query.status, Some(MovieStatus::Released));
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn rejects_bad_pagination() {
        assert!(CatalogQuery::parse(raw(&[("page", "0")])).is_err());
        assert!(CatalogQuery::parse(raw(&[("page", "two")])).is_err());
        assert!(CatalogQuery::parse(raw(&[("limit", "0")])).is_err());
    }

    #[test]
    fn clamps_oversized_limits() {
        let query = CatalogQuery::parse(raw(&[("limit", "5000")])).unwrap();
        assert_eq!(query.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn rejects_unknown_sort_fields() {
        assert!(CatalogQuery::parse(raw(&[("sort", "password_hash")])).is_err());
        assert!(CatalogQuery::parse(raw(&[("order", "sideways")])).is_err());
    }

    #[test]
    fn explicit_sort_defaults_ascending() {
        let query = CatalogQuery::parse(raw(&[("sort", "year")])).unwrap();
        assert_eq!(query.sort, SortField::Year);
        assert_eq!(query.order, SortOrder::Asc);

        let query = CatalogQuery::parse(raw(&[("sort", "year"), ("order", "desc")])).unwrap();
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn rejects_invalid_status() {
        assert!(CatalogQuery::parse(raw(&[("status", "straight-to-dvd")])).is_err());
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = CatalogQuery::parse(raw(&[("search", "   ")])).unwrap();
        assert_eq!(query.search, None);
    }
}
