use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Failure talking to the catalog. Every variant is recovered the same way by the controller.
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("catalog returned HTTP {0}")]
  Status(StatusCode),
  #[error("catalog error {code} ({kind}): {message}")]
  Api { code: i64, kind: String, message: String },
  #[error("malformed catalog payload: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("invalid catalog URL: {0}")]
  Url(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artist {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
  pub title: String,
  #[serde(default)]
  pub cover: String,
}

/// A single catalog track. Only the fields the app displays are decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
  pub id: u64,
  pub title: String,
  pub artist: Artist,
  pub album: Album,
  /// Length in seconds.
  #[serde(default)]
  pub duration: u32,
  #[serde(default)]
  pub link: String,
}

impl Track {
  /// Duration as `m:ss`.
  pub fn duration_label(&self) -> String {
    format!("{}:{:02}", self.duration / 60, self.duration % 60)
  }
}

/// Read-only music catalog with a popularity chart and free-text search.
pub trait CatalogService: Send + Sync + 'static {
  fn chart(&self) -> impl Future<Output = Result<Vec<Track>, CatalogError>> + Send;
  fn search(&self, text: &str) -> impl Future<Output = Result<Vec<Track>, CatalogError>> + Send;
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  #[serde(default, rename = "type")]
  kind: String,
  #[serde(default)]
  message: String,
  #[serde(default)]
  code: i64,
}

/// Deezer answers API-level failures with HTTP 200 and an `error` object.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct TrackList {
  data: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
  tracks: TrackList,
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, CatalogError> {
  match serde_json::from_slice::<T>(body) {
    Ok(v) => Ok(v),
    Err(e) => match serde_json::from_slice::<ErrorEnvelope>(body) {
      Ok(ErrorEnvelope { error }) => {
        Err(CatalogError::Api { code: error.code, kind: error.kind, message: error.message })
      }
      Err(_) => Err(CatalogError::Malformed(e)),
    },
  }
}

/// Decode a `/chart` body into its track list (`tracks.data`).
pub fn parse_chart(body: &[u8]) -> Result<Vec<Track>, CatalogError> {
  decode::<ChartBody>(body).map(|b| b.tracks.data)
}

/// Decode a `/search` body into its track list (`data`).
pub fn parse_search(body: &[u8]) -> Result<Vec<Track>, CatalogError> {
  decode::<TrackList>(body).map(|b| b.data)
}

// --- HTTP client ---

/// Deezer public API client.
#[derive(Debug, Clone)]
pub struct DeezerClient {
  http: Client,
  base_url: String,
}

impl DeezerClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { http: Client::new(), base_url: base_url.into() }
  }

  fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
    let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
    let parsed = if params.is_empty() { Url::parse(&raw) } else { Url::parse_with_params(&raw, params) };
    parsed.map_err(|e| CatalogError::Url(format!("{}: {}", raw, e)))
  }

  async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, CatalogError> {
    debug!(url = %url, "catalog: GET");
    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(CatalogError::Status(status));
    }
    Ok(response.bytes().await?.to_vec())
  }
}

impl CatalogService for DeezerClient {
  async fn chart(&self) -> Result<Vec<Track>, CatalogError> {
    let url = self.endpoint("chart", &[])?;
    let body = self.get_bytes(url).await?;
    parse_chart(&body)
  }

  async fn search(&self, text: &str) -> Result<Vec<Track>, CatalogError> {
    let url = self.endpoint("search", &[("q", text)])?;
    let body = self.get_bytes(url).await?;
    parse_search(&body)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TRACK_JSON: &str = r#"{
    "id": 3135556,
    "title": "Harder, Better, Faster, Stronger",
    "duration": 224,
    "link": "https://www.deezer.com/track/3135556",
    "rank": 956167,
    "artist": { "id": 27, "name": "Daft Punk" },
    "album": { "id": 302127, "title": "Discovery", "cover": "https://api.deezer.com/album/302127/image" }
  }"#;

  fn chart_body(n: usize) -> String {
    let tracks: Vec<String> = (0..n).map(|i| TRACK_JSON.replace("3135556,", &format!("{},", i + 1))).collect();
    format!(r#"{{"tracks": {{"data": [{}], "total": {}}}, "albums": {{"data": []}}}}"#, tracks.join(","), n)
  }

  #[test]
  fn parse_chart_reads_nested_track_list() {
    let tracks = parse_chart(chart_body(3).as_bytes()).unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(tracks[0].artist.name, "Daft Punk");
    assert_eq!(tracks[0].album.title, "Discovery");
  }

  #[test]
  fn parse_search_reads_top_level_data() {
    let body =
      format!(r#"{{"data": [{}], "total": 1, "next": "https://api.deezer.com/search?q=x&index=25"}}"#, TRACK_JSON);
    let tracks = parse_search(body.as_bytes()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "Harder, Better, Faster, Stronger");
    assert_eq!(tracks[0].link, "https://www.deezer.com/track/3135556");
  }

  #[test]
  fn api_error_object_is_reported() {
    let body = br#"{"error": {"type": "DataException", "message": "no data", "code": 800}}"#;
    match parse_search(body) {
      Err(CatalogError::Api { code, kind, message }) => {
        assert_eq!(code, 800);
        assert_eq!(kind, "DataException");
        assert_eq!(message, "no data");
      }
      other => panic!("expected Api error, got {:?}", other),
    }
  }

  #[test]
  fn missing_fields_are_malformed() {
    assert!(matches!(parse_chart(br#"{"data": []}"#), Err(CatalogError::Malformed(_))));
    assert!(matches!(parse_search(br#"{"tracks": {"data": []}}"#), Err(CatalogError::Malformed(_))));
    assert!(matches!(parse_search(b"<html>oops</html>"), Err(CatalogError::Malformed(_))));
  }

  #[test]
  fn empty_search_result_is_ok() {
    assert_eq!(parse_search(br#"{"data": [], "total": 0}"#).unwrap(), Vec::new());
  }

  #[test]
  fn duration_label_pads_seconds() {
    let mut track: Track = serde_json::from_str(TRACK_JSON).unwrap();
    assert_eq!(track.duration_label(), "3:44");
    track.duration = 65;
    assert_eq!(track.duration_label(), "1:05");
    track.duration = 0;
    assert_eq!(track.duration_label(), "0:00");
  }

  #[test]
  fn endpoint_encodes_query() {
    let client = DeezerClient::new("https://api.deezer.com/");
    let url = client.endpoint("search", &[("q", "drake forever")]).unwrap();
    assert_eq!(url.as_str(), "https://api.deezer.com/search?q=drake+forever");
    let url = client.endpoint("chart", &[]).unwrap();
    assert_eq!(url.as_str(), "https://api.deezer.com/chart");
  }
}
