//! Movie model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

pub type MovieId = i64;

/// Release status of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum MovieStatus {
    Upcoming,
    Released,
    InProduction,
}

impl MovieStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Upcoming => "upcoming",
            MovieStatus::Released => "released",
            MovieStatus::InProduction => "in-production",
        }
    }
}

impl fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(MovieStatus::Upcoming),
            "released" => Ok(MovieStatus::Released),
            "in-production" => Ok(MovieStatus::InProduction),
            other => Err(format!("unknown movie status: {other}")),
        }
    }
}

/// Movie catalog row.
///
/// `rating` is the editorial score set by admins; `average_rating` is
/// the mean of user ratings, recomputed on every rating write and
/// rounded to one decimal. Deactivated movies (`is_active = false`)
/// never leave the catalog query engine.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub director: String,
    pub genres: Json<Vec<String>>,
    #[serde(rename = "cast")]
    pub cast_list: Json<Vec<String>>,
    pub year: i64,
    pub rating: f64,
    pub average_rating: f64,
    pub rating_count: i64,
    pub status: MovieStatus,
    pub is_active: bool,
    pub views: i64,
    pub watchlist_count: i64,
    pub popularity: f64,
    pub poster: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    pub year: i64,
    #[serde(default)]
    pub rating: f64,
    pub status: Option<MovieStatus>,
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genres: Option<Vec<String>>,
    pub cast: Option<Vec<String>>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub status: Option<MovieStatus>,
    pub poster: Option<String>,
    pub is_active: Option<bool>,
}
