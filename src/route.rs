use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::RouteError;
use crate::media::{MediaId, MediaSummary, MediaType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Trending,
    Upcoming,
    About,
    Search { query: String },
    Detail { media_type: MediaType, id: MediaId },
}

fn detail_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^/(movie|show)/([^/]+)/?$").ok())
        .as_ref()
}

impl Route {
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (input, None),
        };

        match path.trim_end_matches('/') {
            "" => return Ok(Route::Home),
            "/trending" => return Ok(Route::Trending),
            "/upcoming" => return Ok(Route::Upcoming),
            "/about" => return Ok(Route::About),
            "/search" => {
                return Ok(Route::Search {
                    query: query.and_then(search_term).unwrap_or_default(),
                })
            }
            _ => {}
        }

        let captures = detail_pattern()
            .and_then(|pattern| pattern.captures(path))
            .ok_or_else(|| RouteError::Unknown(input.to_string()))?;
        let media_type = match &captures[1] {
            "movie" => MediaType::Movie,
            _ => MediaType::Tv,
        };
        let id = captures[2]
            .parse::<MediaId>()
            .map_err(|_| RouteError::InvalidId(captures[2].to_string()))?;
        Ok(Route::Detail { media_type, id })
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => String::from("/"),
            Route::Trending => String::from("/trending"),
            Route::Upcoming => String::from("/upcoming"),
            Route::About => String::from("/about"),
            Route::Search { query } if query.is_empty() => String::from("/search"),
            Route::Search { query } => format!("/search?q={}", urlencoding::encode(query)),
            Route::Detail {
                media_type: MediaType::Movie,
                id,
            } => format!("/movie/{}", id),
            Route::Detail {
                media_type: MediaType::Tv,
                id,
            } => format!("/show/{}", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

/// Value of `q` in a query string, with `+` read as a space.
fn search_term(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != "q" {
            return None;
        }
        let value = value.replace('+', " ");
        urlencoding::decode(&value).ok().map(|v| v.into_owned())
    })
}

impl MediaSummary {
    pub fn route(&self) -> Route {
        Route::Detail {
            media_type: self.media_type,
            id: self.id,
        }
    }
}
