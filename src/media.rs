use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ApiError;

pub type MediaId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the metadata API.
    pub fn as_path(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaType::Movie => "Movie",
            MediaType::Tv => "TV",
        }
    }

    fn from_discriminant(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" | "show" => Ok(MediaType::Tv),
            other => Err(format!("unknown media type `{}` (expected movie or tv)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Lightweight catalog entry as returned by list endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSummary {
    pub id: MediaId,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f32,
    pub release_date: Option<String>,
    pub genre_ids: Vec<u64>,
}

impl MediaSummary {
    /// Names of the known genres among `genre_ids`, in listed order.
    pub fn genre_names(&self) -> Vec<&'static str> {
        self.genre_ids.iter().filter_map(|id| genre_name(*id)).collect()
    }

    /// First two genre names joined with `" + "`, or `"Unknown"`.
    pub fn genre_label(&self) -> String {
        let names = self.genre_names();
        if names.is_empty() {
            return String::from("Unknown");
        }
        names
            .into_iter()
            .take(GENRE_LABEL_LIMIT)
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

const GENRE_LABEL_LIMIT: usize = 2;

/// Movie and TV genre ids as listed by `/genre/movie/list` and `/genre/tv/list`.
const GENRES: &[(u64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
    (10759, "Action & Adventure"),
    (10762, "Kids"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
];

pub fn genre_name(id: u64) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub page: u32,
    pub results: Vec<T>,
    pub total_pages: u32,
    pub total_results: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Movie,
    Tv,
}

impl MediaFilter {
    pub fn matches(self, item: &MediaSummary) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Movie => item.media_type == MediaType::Movie,
            MediaFilter::Tv => item.media_type == MediaType::Tv,
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFilter::All => write!(f, "All"),
            MediaFilter::Movie => write!(f, "Movies"),
            MediaFilter::Tv => write!(f, "TV"),
        }
    }
}

impl FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(MediaFilter::All),
            "movie" | "movies" => Ok(MediaFilter::Movie),
            "tv" => Ok(MediaFilter::Tv),
            other => Err(format!("unknown filter `{}` (expected all, movie or tv)", other)),
        }
    }
}

/// Order-preserving subsequence of `items` matching `selection`.
pub fn filter(items: &[MediaSummary], selection: MediaFilter) -> Vec<MediaSummary> {
    items
        .iter()
        .filter(|item| selection.matches(item))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_path(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Day => write!(f, "Today"),
            TimeWindow::Week => write!(f, "This Week"),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            other => Err(format!("unknown time window `{}` (expected day or week)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingScope {
    All,
    Movie,
    Tv,
}

impl TrendingScope {
    pub fn as_path(self) -> &'static str {
        match self {
            TrendingScope::All => "all",
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
        }
    }

    pub(crate) fn implied_media_type(self) -> Option<MediaType> {
        match self {
            TrendingScope::All => None,
            TrendingScope::Movie => Some(MediaType::Movie),
            TrendingScope::Tv => Some(MediaType::Tv),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpcomingTab {
    #[default]
    Movies,
    Tv,
}

impl fmt::Display for UpcomingTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpcomingTab::Movies => write!(f, "Movies"),
            UpcomingTab::Tv => write!(f, "TV Shows"),
        }
    }
}

impl FromStr for UpcomingTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" | "movie" => Ok(UpcomingTab::Movies),
            "tv" => Ok(UpcomingTab::Tv),
            other => Err(format!("unknown tab `{}` (expected movies or tv)", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TmdbMediaResult {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub media_type: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl TmdbMediaResult {
    /// Movies carry `title`/`release_date`, TV carries `name`/`first_air_date`.
    pub(crate) fn into_summary(
        self,
        media_type: MediaType,
        path: &str,
    ) -> Result<MediaSummary, ApiError> {
        let (title, title_field, date) = match media_type {
            MediaType::Movie => (self.title, "title", self.release_date),
            MediaType::Tv => (self.name, "name", self.first_air_date),
        };
        let title = non_empty(title)
            .ok_or_else(|| ApiError::parse(join_path(path, title_field), "missing field"))?;

        Ok(MediaSummary {
            id: self.id,
            media_type,
            title,
            overview: self.overview.unwrap_or_default(),
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            vote_average: self.vote_average,
            release_date: non_empty(date),
            genre_ids: self.genre_ids,
        })
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Classifies and decodes raw list entries.
///
/// The explicit `media_type` discriminant wins over the one implied by the
/// endpoint. Entries that are neither movies nor TV shows (people) are
/// dropped; entries that claim to be one but fail to decode fail the page.
pub(crate) fn parse_results(
    values: Vec<serde_json::Value>,
    implied: Option<MediaType>,
) -> Result<Vec<MediaSummary>, ApiError> {
    let mut items = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let path = format!("results[{}]", index);
        let explicit = value.get("media_type").and_then(|v| v.as_str());
        let media_type = match (explicit, implied) {
            (Some(discriminant), _) => match MediaType::from_discriminant(discriminant) {
                Some(media_type) => media_type,
                None => continue,
            },
            (None, Some(media_type)) => media_type,
            (None, None) => {
                return Err(ApiError::parse(
                    join_path(&path, "media_type"),
                    "missing field",
                ))
            }
        };

        let raw: TmdbMediaResult = serde_path_to_error::deserialize(value).map_err(|e| {
            ApiError::parse(join_path(&path, &e.path().to_string()), e.inner().to_string())
        })?;
        items.push(raw.into_summary(media_type, &path)?);
    }
    Ok(items)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{movie, show};
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_all_is_identity() {
        let items = vec![movie(1, "a"), show(2, "b"), movie(3, "c")];
        assert_eq!(filter(&items, MediaFilter::All), items);
    }

    #[test]
    fn filter_preserves_order() {
        let items = vec![movie(1, "a"), show(2, "b"), movie(3, "c"), show(4, "d")];

        let movies = filter(&items, MediaFilter::Movie);
        assert_eq!(movies.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(movies.iter().all(|i| i.media_type == MediaType::Movie));

        let shows = filter(&items, MediaFilter::Tv);
        assert_eq!(shows.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn parse_results_drops_people_and_maps_tv_fields() {
        let values = vec![
            json!({"id": 1, "media_type": "movie", "title": "Batman", "release_date": "1989-06-23", "vote_average": 7.2}),
            json!({"id": 2, "media_type": "person", "name": "Adam West"}),
            json!({"id": 3, "media_type": "tv", "name": "Batman", "first_air_date": "1966-01-12", "genre_ids": [10759]}),
        ];

        let items = parse_results(values, None).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!((items[0].media_type, items[0].id), (MediaType::Movie, 1));
        assert_eq!(items[0].release_date.as_deref(), Some("1989-06-23"));
        assert_eq!((items[1].media_type, items[1].id), (MediaType::Tv, 3));
        assert_eq!(items[1].title, "Batman");
        assert_eq!(items[1].release_date.as_deref(), Some("1966-01-12"));
        assert_eq!(items[1].genre_ids, vec![10759]);
    }

    #[test]
    fn parse_results_uses_implied_type_and_blanks_empty_paths() {
        let values = vec![json!({"id": 9, "title": "Dune", "poster_path": "", "release_date": ""})];

        let items = parse_results(values, Some(MediaType::Movie)).unwrap();

        assert_eq!(items[0].media_type, MediaType::Movie);
        assert_eq!(items[0].poster_path, None);
        assert_eq!(items[0].release_date, None);
    }

    #[test]
    fn parse_results_reports_path_of_bad_field() {
        let values = vec![
            json!({"id": 1, "media_type": "movie", "title": "ok"}),
            json!({"id": "nope", "media_type": "movie", "title": "bad"}),
        ];

        match parse_results(values, None) {
            Err(ApiError::Parse { path, .. }) => assert_eq!(path, "results[1].id"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn parse_results_requires_title_for_kind() {
        let values = vec![json!({"id": 1, "media_type": "tv", "title": "wrong field"})];

        match parse_results(values, None) {
            Err(ApiError::Parse { path, .. }) => assert_eq!(path, "results[0].name"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn parse_results_without_any_discriminant_fails() {
        let values = vec![json!({"id": 1, "title": "?"})];
        assert!(matches!(
            parse_results(values, None),
            Err(ApiError::Parse { .. })
        ));
    }

    #[test]
    fn filter_and_window_parse_from_cli_values() {
        assert_eq!("movie".parse::<MediaFilter>(), Ok(MediaFilter::Movie));
        assert_eq!("week".parse::<TimeWindow>(), Ok(TimeWindow::Week));
        assert!("month".parse::<TimeWindow>().is_err());
        assert_eq!("show".parse::<MediaType>(), Ok(MediaType::Tv));
    }

    #[test]
    fn genre_label_names_first_two_known_genres() {
        let mut item = movie(1, "Inception");
        item.genre_ids = vec![999, 28, 878, 12];
        assert_eq!(item.genre_names(), vec!["Action", "Science Fiction", "Adventure"]);
        assert_eq!(item.genre_label(), "Action + Science Fiction");

        item.genre_ids = vec![10765];
        assert_eq!(item.genre_label(), "Sci-Fi & Fantasy");
    }

    #[test]
    fn genre_label_falls_back_to_unknown() {
        let mut item = show(2, "Mystery Show");
        assert_eq!(item.genre_label(), "Unknown");

        item.genre_ids = vec![1, 2];
        assert!(item.genre_names().is_empty());
        assert_eq!(item.genre_label(), "Unknown");
    }
}
