use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::detail::{parse_detail, MediaDetail};
use crate::error::ApiError;
use crate::media::{parse_results, MediaId, MediaSummary, MediaType, Paginated, TrendingScope};
use crate::settings::AppSettings;

/// Local asset shown when an entry has no image path.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

const DETAIL_APPEND: &str = "credits,videos,recommendations";

/// Raw HTTP reply handed back by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpReply, ApiError>;
}

pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply, ApiError> {
        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W185,
    W300,
    W500,
    Original,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::W185 => "w185",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

/// Fixed endpoint templates of the metadata API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    SearchMulti { query: String },
    Trending { scope: TrendingScope, window: crate::media::TimeWindow },
    NowPlaying,
    UpcomingMovies,
    OnTheAir,
    Discover(MediaType),
    Detail { media_type: MediaType, id: MediaId },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::SearchMulti { .. } => String::from("/search/multi"),
            Endpoint::Trending { scope, window } => {
                format!("/trending/{}/{}", scope.as_path(), window.as_path())
            }
            Endpoint::NowPlaying => String::from("/movie/now_playing"),
            Endpoint::UpcomingMovies => String::from("/movie/upcoming"),
            Endpoint::OnTheAir => String::from("/tv/on_the_air"),
            Endpoint::Discover(media_type) => format!("/discover/{}", media_type.as_path()),
            Endpoint::Detail { media_type, id } => format!("/{}/{}", media_type.as_path(), id),
        }
    }

    /// Media type every result has when the response carries no discriminant.
    pub fn implied_media_type(&self) -> Option<MediaType> {
        match self {
            Endpoint::SearchMulti { .. } => None,
            Endpoint::Trending { scope, .. } => scope.implied_media_type(),
            Endpoint::NowPlaying | Endpoint::UpcomingMovies => Some(MediaType::Movie),
            Endpoint::OnTheAir => Some(MediaType::Tv),
            Endpoint::Discover(media_type) => Some(*media_type),
            Endpoint::Detail { media_type, .. } => Some(*media_type),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPaginatedResponse {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: String,
    include_adult: bool,
    transport: Arc<dyn Transport>,
}

impl TmdbClient {
    pub fn new(transport: Arc<dyn Transport>, settings: &AppSettings) -> Self {
        let language = if settings.language.trim().is_empty() {
            String::from(crate::settings::DEFAULT_LANGUAGE)
        } else {
            settings.language.trim().to_string()
        };
        Self {
            api_key: settings.api_key.trim().to_string(),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            image_base_url: settings.image_base_url.trim_end_matches('/').to_string(),
            language,
            include_adult: settings.include_adult,
            transport,
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(Arc::new(ReqwestTransport::new()), settings)
    }

    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => format!("{}/{}{}", self.image_base_url, size.as_str(), path),
            None => String::from(PLACEHOLDER_IMAGE),
        }
    }

    /// Fails with `MissingCredential` before anything is sent.
    pub fn build_url(&self, endpoint: &Endpoint, page: Option<u32>) -> Result<Url, ApiError> {
        if self.api_key.is_empty() {
            return Err(ApiError::MissingCredential);
        }

        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        match endpoint {
            Endpoint::SearchMulti { query } => {
                params.push(("query", query.clone()));
                params.push(("include_adult", self.include_adult.to_string()));
            }
            Endpoint::Detail { .. } => {
                params.push(("append_to_response", String::from(DETAIL_APPEND)));
            }
            _ => {}
        }
        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        let raw = format!("{}{}", self.base_url, endpoint.path());
        Url::parse_with_params(&raw, &params).map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn fetch_value(&self, url: &Url) -> Result<serde_json::Value, ApiError> {
        debug!(path = url.path(), "GET");
        let reply = self.transport.get(url).await?;

        match reply.status {
            401 => return Err(ApiError::Unauthorized),
            404 => return Err(ApiError::NotFound),
            429 => return Err(ApiError::RateLimited),
            s if !(200..300).contains(&s) => return Err(ApiError::Status { status: s }),
            _ => {}
        }

        let value: serde_json::Value = serde_json::from_str(&reply.body)
            .map_err(|e| ApiError::parse(".", e.to_string()))?;
        reject_failure_payload(&value)?;
        Ok(value)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let value = self.fetch_value(url).await?;
        serde_path_to_error::deserialize(value)
            .map_err(|e| ApiError::parse(e.path().to_string(), e.inner().to_string()))
    }

    pub async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        page: u32,
    ) -> Result<Paginated<MediaSummary>, ApiError> {
        let url = self.build_url(endpoint, Some(page))?;
        let raw: RawPaginatedResponse = self.fetch_json(&url).await.inspect_err(|e| {
            warn!(path = url.path(), page, "list fetch failed: {}", e);
        })?;
        let results = parse_results(raw.results, endpoint.implied_media_type())?;

        Ok(Paginated {
            page: raw.page,
            results,
            total_pages: raw.total_pages,
            total_results: raw.total_results,
        })
    }

    /// Primary entity plus credits, videos and recommendations in one request.
    pub async fn fetch_detail(
        &self,
        media_type: MediaType,
        id: MediaId,
    ) -> Result<MediaDetail, ApiError> {
        let url = self.build_url(&Endpoint::Detail { media_type, id }, None)?;
        let value = self.fetch_value(&url).await.inspect_err(|e| {
            warn!(%media_type, id, "detail fetch failed: {}", e);
        })?;
        parse_detail(value, media_type)
    }
}

/// Bodies carrying `success: false` are failures even with a 2xx status.
fn reject_failure_payload(value: &serde_json::Value) -> Result<(), ApiError> {
    if value.get("success").and_then(|v| v.as_bool()) != Some(false) {
        return Ok(());
    }
    // 7: invalid API key, 10: suspended API key
    match value.get("status_code").and_then(|v| v.as_u64()) {
        Some(7) | Some(10) => Err(ApiError::Unauthorized),
        _ => Err(ApiError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TimeWindow;
    use crate::testing::{page_body, test_client, FakeTransport};
    use serde_json::json;

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn endpoint_paths_follow_templates() {
        let trending = Endpoint::Trending {
            scope: TrendingScope::All,
            window: TimeWindow::Week,
        };
        assert_eq!(trending.path(), "/trending/all/week");
        assert_eq!(Endpoint::OnTheAir.path(), "/tv/on_the_air");
        assert_eq!(Endpoint::Discover(MediaType::Tv).path(), "/discover/tv");
        assert_eq!(
            Endpoint::Detail {
                media_type: MediaType::Movie,
                id: 27205
            }
            .path(),
            "/movie/27205"
        );
    }

    #[test]
    fn build_url_encodes_query_and_carries_credential() {
        let transport = FakeTransport::new();
        let client = test_client(&transport);

        let url = client
            .build_url(
                &Endpoint::SearchMulti {
                    query: String::from("the dark knight & co"),
                },
                Some(2),
            )
            .unwrap();

        assert_eq!(url.path(), "/search/multi");
        assert_eq!(query_value(&url, "api_key").as_deref(), Some("test-key"));
        assert_eq!(query_value(&url, "language").as_deref(), Some("en-US"));
        assert_eq!(
            query_value(&url, "query").as_deref(),
            Some("the dark knight & co")
        );
        assert_eq!(query_value(&url, "include_adult").as_deref(), Some("false"));
        assert_eq!(query_value(&url, "page").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let transport = FakeTransport::new();
        let settings = AppSettings {
            api_key: String::from("   "),
            ..crate::testing::test_settings()
        };
        let client = TmdbClient::new(transport.clone(), &settings);

        let result = client.fetch_page(&Endpoint::NowPlaying, 1).await;

        assert_eq!(result, Err(ApiError::MissingCredential));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn fetch_page_decodes_pagination_fields() {
        let transport = FakeTransport::new();
        transport.reply(
            "/movie/upcoming",
            200,
            page_body(MediaType::Movie, 1, 20, 1, 3, 57),
        );
        let client = test_client(&transport);

        let page = client.fetch_page(&Endpoint::UpcomingMovies, 1).await.unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.results.len(), 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_results, 57);
    }

    #[tokio::test]
    async fn missing_results_is_an_empty_page() {
        let transport = FakeTransport::new();
        transport.reply("/tv/on_the_air", 200, json!({"page": 1}));
        let client = test_client(&transport);

        let page = client.fetch_page(&Endpoint::OnTheAir, 1).await.unwrap();

        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn status_codes_map_to_error_kinds() {
        let transport = FakeTransport::new();
        transport.reply("/movie/now_playing", 401, json!({}));
        transport.reply("/movie/now_playing", 429, json!({}));
        transport.reply("/movie/now_playing", 503, json!({}));
        let client = test_client(&transport);

        assert_eq!(
            client.fetch_page(&Endpoint::NowPlaying, 1).await,
            Err(ApiError::Unauthorized)
        );
        assert_eq!(
            client.fetch_page(&Endpoint::NowPlaying, 1).await,
            Err(ApiError::RateLimited)
        );
        assert_eq!(
            client.fetch_page(&Endpoint::NowPlaying, 1).await,
            Err(ApiError::Status { status: 503 })
        );
    }

    #[tokio::test]
    async fn failure_payload_with_ok_status_is_rejected() {
        let transport = FakeTransport::new();
        transport.reply(
            "/discover/tv",
            200,
            json!({"success": false, "status_code": 7, "status_message": "Invalid API key"}),
        );
        let client = test_client(&transport);

        assert_eq!(
            client.fetch_page(&Endpoint::Discover(MediaType::Tv), 1).await,
            Err(ApiError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let transport = FakeTransport::new();
        transport.reply("/movie/now_playing", 200, json!({"results": "oops"}));
        let client = test_client(&transport);

        match client.fetch_page(&Endpoint::NowPlaying, 1).await {
            Err(ApiError::Parse { path, .. }) => assert_eq!(path, "results"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn image_url_uses_size_token_or_placeholder() {
        let transport = FakeTransport::new();
        let client = test_client(&transport);

        assert_eq!(
            client.image_url(Some("/abc.jpg"), ImageSize::W500),
            "http://img.test/t/p/w500/abc.jpg"
        );
        assert_eq!(
            client.image_url(Some("/abc.jpg"), ImageSize::Original),
            "http://img.test/t/p/original/abc.jpg"
        );
        assert_eq!(client.image_url(None, ImageSize::W185), PLACEHOLDER_IMAGE);
        assert_eq!(client.image_url(Some(""), ImageSize::W300), PLACEHOLDER_IMAGE);
    }
}
