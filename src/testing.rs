//! Scripted in-memory transport for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::media::MediaType;
use crate::settings::AppSettings;
use crate::tmdb::{HttpReply, TmdbClient, Transport};

struct Scripted {
    path: String,
    params: Vec<(String, String)>,
    reply: HttpReply,
}

/// Replies are matched by URL path plus any required query pairs, and each
/// scripted reply is consumed once, in the order it was added.
#[derive(Default)]
pub struct FakeTransport {
    scripted: Mutex<Vec<Scripted>>,
    requests: Mutex<Vec<Url>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, path: &str, status: u16, body: Value) {
        self.reply_when(path, &[], status, body);
    }

    pub fn reply_when(&self, path: &str, params: &[(&str, &str)], status: u16, body: Value) {
        self.scripted.lock().unwrap().push(Scripted {
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            reply: HttpReply {
                status,
                body: body.to_string(),
            },
        });
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply, ApiError> {
        self.requests.lock().unwrap().push(url.clone());

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut scripted = self.scripted.lock().unwrap();
        let position = scripted.iter().position(|s| {
            s.path == url.path() && s.params.iter().all(|p| pairs.contains(p))
        });
        match position {
            Some(index) => Ok(scripted.remove(index).reply),
            None => Err(ApiError::Network(format!("no scripted reply for {}", url))),
        }
    }
}

pub fn test_settings() -> AppSettings {
    AppSettings {
        api_key: String::from("test-key"),
        api_base_url: String::from("http://tmdb.test"),
        image_base_url: String::from("http://img.test/t/p"),
        ..AppSettings::default()
    }
}

pub fn test_client(transport: &Arc<FakeTransport>) -> TmdbClient {
    TmdbClient::new(transport.clone(), &test_settings())
}

/// One list page of `count` entries with ids starting at `first_id`.
pub fn page_body(
    media_type: MediaType,
    first_id: u64,
    count: u64,
    page: u32,
    total_pages: u32,
    total_results: u32,
) -> Value {
    let results: Vec<Value> = (first_id..first_id + count)
        .map(|id| match media_type {
            MediaType::Movie => json!({
                "id": id,
                "media_type": "movie",
                "title": format!("Movie {}", id),
                "overview": "",
                "poster_path": format!("/poster{}.jpg", id),
                "backdrop_path": null,
                "vote_average": 6.5,
                "release_date": "2024-05-01",
                "genre_ids": [28]
            }),
            MediaType::Tv => json!({
                "id": id,
                "media_type": "tv",
                "name": format!("Show {}", id),
                "overview": "",
                "poster_path": null,
                "backdrop_path": null,
                "vote_average": 8.0,
                "first_air_date": "2023-02-01",
                "genre_ids": [18]
            }),
        })
        .collect();
    json!({
        "page": page,
        "results": results,
        "total_pages": total_pages,
        "total_results": total_results
    })
}
