use serde::Deserialize;
use tracing::debug;

use crate::controller::{Applied, RequestSlot, ViewStatus};
use crate::error::{ApiError, ControllerError};
use crate::labels::{rating_label, release_year};
use crate::media::{
    non_empty, parse_results, Genre, MediaId, MediaSummary, MediaType, TmdbMediaResult,
};
use crate::tmdb::{ImageSize, TmdbClient};

const CAST_LIMIT: usize = 8;
const RECOMMENDATION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.kind == "Trailer" && self.site == "YouTube"
    }

    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.key)
    }
}

/// Full entity record with credits, videos and recommendations attached.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDetail {
    pub summary: MediaSummary,
    pub genres: Vec<Genre>,
    /// Movie runtime, or the first listed episode runtime for TV.
    pub runtime: Option<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub cast: Vec<CastMember>,
    pub videos: Vec<Video>,
    pub recommendations: Vec<MediaSummary>,
}

impl MediaDetail {
    pub fn trailer(&self) -> Option<&Video> {
        self.videos.iter().find(|v| v.is_youtube_trailer())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCredits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVideos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecommendations {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawDetailExtras {
    #[serde(default)]
    genres: Vec<Genre>,
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    number_of_seasons: Option<u32>,
    number_of_episodes: Option<u32>,
    status: Option<String>,
    tagline: Option<String>,
    homepage: Option<String>,
    #[serde(default)]
    credits: Option<RawCredits>,
    #[serde(default)]
    videos: Option<RawVideos>,
    #[serde(default)]
    recommendations: Option<RawRecommendations>,
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_path_to_error::deserialize(value)
        .map_err(|e| ApiError::parse(e.path().to_string(), e.inner().to_string()))
}

pub(crate) fn parse_detail(
    value: serde_json::Value,
    media_type: MediaType,
) -> Result<MediaDetail, ApiError> {
    let raw: TmdbMediaResult = decode(value.clone())?;
    let extras: RawDetailExtras = decode(value)?;

    let mut summary = raw.into_summary(media_type, "")?;
    if summary.genre_ids.is_empty() {
        summary.genre_ids = extras.genres.iter().map(|g| g.id).collect();
    }

    let runtime = match media_type {
        MediaType::Movie => extras.runtime.filter(|r| *r > 0),
        MediaType::Tv => extras.episode_run_time.first().copied().filter(|r| *r > 0),
    };

    let mut cast = extras.credits.unwrap_or_default().cast;
    cast.sort_by_key(|c| c.order);

    let recommendations = parse_results(
        extras.recommendations.unwrap_or_default().results,
        Some(media_type),
    )
    .map_err(|err| match err {
        ApiError::Parse { path, message } => ApiError::Parse {
            path: format!("recommendations.{}", path),
            message,
        },
        other => other,
    })?;

    Ok(MediaDetail {
        summary,
        genres: extras.genres,
        runtime,
        number_of_seasons: extras.number_of_seasons,
        number_of_episodes: extras.number_of_episodes,
        status: non_empty(extras.status),
        tagline: non_empty(extras.tagline),
        homepage: non_empty(extras.homepage),
        cast,
        videos: extras.videos.unwrap_or_default().results,
        recommendations,
    })
}

/// Display-ready fields derived from a [`MediaDetail`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub year: Option<String>,
    pub rating: String,
    pub rating_percent: u32,
    pub full_stars: u32,
    pub runtime_label: Option<String>,
    pub seasons_label: Option<String>,
    pub status: Option<String>,
    pub type_label: &'static str,
    pub overview: String,
    pub tagline: Option<String>,
    pub genres: Vec<String>,
    pub backdrop_url: String,
    pub poster_url: String,
    pub cast: Vec<CastMember>,
    pub trailer_url: Option<String>,
    pub recommendations: Vec<MediaSummary>,
}

impl DetailView {
    pub fn new(detail: &MediaDetail, client: &TmdbClient) -> Self {
        let summary = &detail.summary;
        let is_movie = summary.media_type == MediaType::Movie;

        let runtime_label = detail.runtime.map(|minutes| {
            if is_movie {
                format!("{}m", minutes)
            } else {
                format!("{}m / ep", minutes)
            }
        });
        let seasons_label = if is_movie {
            None
        } else {
            detail.number_of_seasons.map(|n| {
                format!("{} Season{}", n, if n == 1 { "" } else { "s" })
            })
        };

        let backdrop_path = summary
            .backdrop_path
            .as_deref()
            .or(summary.poster_path.as_deref());
        let overview = if summary.overview.trim().is_empty() {
            String::from("No description available.")
        } else {
            summary.overview.clone()
        };

        Self {
            title: summary.title.clone(),
            year: summary.release_date.as_deref().and_then(release_year),
            rating: rating_label(summary.vote_average),
            rating_percent: (summary.vote_average / 10.0 * 100.0).round().max(0.0) as u32,
            full_stars: (summary.vote_average / 2.0).round().max(0.0) as u32,
            runtime_label,
            seasons_label,
            status: detail.status.clone(),
            type_label: if is_movie { "Movie" } else { "TV Series" },
            overview,
            tagline: detail.tagline.clone(),
            genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
            backdrop_url: client.image_url(backdrop_path, ImageSize::Original),
            poster_url: client.image_url(summary.poster_path.as_deref(), ImageSize::W500),
            cast: detail.cast.iter().take(CAST_LIMIT).cloned().collect(),
            trailer_url: detail.trailer().map(Video::watch_url),
            recommendations: detail
                .recommendations
                .iter()
                .take(RECOMMENDATION_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    id: u64,
    media_type: MediaType,
    media_id: MediaId,
}

/// `Idle -> Loading -> {Ready | Error | NotFound}` for one detail page.
pub struct DetailController {
    client: TmdbClient,
    target: Option<(MediaType, MediaId)>,
    status: ViewStatus,
    detail: Option<MediaDetail>,
    slot: RequestSlot,
}

impl DetailController {
    pub fn new(client: TmdbClient) -> Self {
        Self {
            client,
            target: None,
            status: ViewStatus::Idle,
            detail: None,
            slot: RequestSlot::default(),
        }
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn target(&self) -> Option<(MediaType, MediaId)> {
        self.target
    }

    pub fn detail(&self) -> Option<&MediaDetail> {
        self.detail.as_ref()
    }

    pub fn view(&self) -> Option<DetailView> {
        self.detail
            .as_ref()
            .map(|detail| DetailView::new(detail, &self.client))
    }

    pub fn open(&mut self, media_type: MediaType, media_id: MediaId) -> DetailTicket {
        self.target = Some((media_type, media_id));
        self.detail = None;
        self.status = ViewStatus::Loading;
        DetailTicket {
            id: self.slot.issue(),
            media_type,
            media_id,
        }
    }

    pub async fn fetch(&self, ticket: &DetailTicket) -> Result<MediaDetail, ApiError> {
        self.client
            .fetch_detail(ticket.media_type, ticket.media_id)
            .await
    }

    pub fn apply(
        &mut self,
        ticket: DetailTicket,
        result: Result<MediaDetail, ApiError>,
    ) -> Applied {
        if !self.slot.accept(ticket.id) {
            debug!(
                media_type = %ticket.media_type,
                id = ticket.media_id,
                "discarding stale detail response"
            );
            return Applied::Stale;
        }

        match result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.status = ViewStatus::Ready;
            }
            Err(err) => self.status = ViewStatus::from_error(&err),
        }
        Applied::Current
    }

    /// Opens and loads `(media_type, media_id)`. Never retries.
    pub async fn load(
        &mut self,
        media_type: MediaType,
        media_id: MediaId,
    ) -> Result<Applied, ControllerError> {
        let ticket = self.open(media_type, media_id);
        let result = self.fetch(&ticket).await;
        let missing_credential = matches!(result, Err(ApiError::MissingCredential));
        let applied = self.apply(ticket, result);
        if missing_credential && applied == Applied::Current {
            return Err(ApiError::MissingCredential.into());
        }
        Ok(applied)
    }
}
