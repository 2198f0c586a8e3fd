//! Film catalog models.
//!
//! Field names mirror the film catalog's JSON so responses deserialize
//! directly into these types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Full metadata for one film.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FilmDetails {
    pub id: u64,
    pub title: String,
    /// Release date as `YYYY-MM-DD` (may be empty)
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub credits: Credits,
}

impl FilmDetails {
    /// Release year parsed from the release date.
    pub fn year(&self) -> Option<i32> {
        self.release_date.get(..4).and_then(|y| y.parse().ok())
    }

    /// Genre names in catalog order.
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }

    /// Credited directors.
    pub fn directors(&self) -> Vec<&str> {
        self.credits
            .crew
            .iter()
            .filter(|c| c.job == "Director")
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: String,
}

/// Film search hit from the catalog's own search endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FilmSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_details_from_catalog_json() {
        let json = r#"{
            "id": 105,
            "title": "Back to the Future",
            "release_date": "1985-07-03",
            "poster_path": "/poster.jpg",
            "backdrop_path": null,
            "vote_average": 8.3,
            "genres": [{"id": 12, "name": "Adventure"}, {"id": 35, "name": "Comedy"}],
            "runtime": 116,
            "credits": {
                "cast": [{"name": "Michael J. Fox", "character": "Marty McFly", "order": 0}],
                "crew": [{"name": "Robert Zemeckis", "job": "Director", "department": "Directing"}]
            }
        }"#;

        let film: FilmDetails = serde_json::from_str(json).unwrap();
        assert_eq!(film.year(), Some(1985));
        assert_eq!(film.genre_names(), vec!["Adventure", "Comedy"]);
        assert_eq!(film.directors(), vec!["Robert Zemeckis"]);
        assert_eq!(film.backdrop_path, None);
    }

    #[test]
    fn test_year_missing_release_date() {
        let film = FilmDetails::default();
        assert_eq!(film.year(), None);
    }
}
