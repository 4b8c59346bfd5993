//! Remote data behind the marker layer.
//!
//! [`MarkerService`] is the seam the controller talks to; [`HttpMarkerService`]
//! is the production implementation speaking the JSON envelope used by the
//! map backend. Tests plug in their own implementations.

use crate::{
    core::config::EngineConfig,
    markers::record::{MarkerQuery, MarkerRecord},
    prelude::HashMap,
    MapError, Result,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};

/// Icon tag to icon URL
pub type IconTable = HashMap<String, String>;

#[async_trait]
pub trait MarkerService: Send + Sync {
    async fn search_markers(&self, query: &MarkerQuery) -> Result<Vec<MarkerRecord>>;
    async fn list_icons(&self) -> Result<IconTable>;
}

/// Surfaces transient messages to the user
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Backend response wrapper
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default, alias = "msg")]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<Option<T>> {
        match self.code {
            0 | 200 => Ok(self.data),
            code => Err(MapError::Service(format!(
                "backend returned {code}: {}",
                self.message.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IconEntry {
    tag: String,
    url: String,
}

pub struct HttpMarkerService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMarkerService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("teyvat-map/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let base = config
            .api_base_url
            .as_deref()
            .ok_or_else(|| MapError::Service("api_base_url is not configured".to_string()))?;
        Ok(Self::new(base))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>> {
        let status = response.status();
        if !status.is_success() {
            return Err(MapError::Service(format!(
                "HTTP {status} from {}",
                response.url()
            )));
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data()
    }
}

#[async_trait]
impl MarkerService for HttpMarkerService {
    async fn search_markers(&self, query: &MarkerQuery) -> Result<Vec<MarkerRecord>> {
        let url = self.url("marker/search");
        log::debug!("POST {url} for {} items", query.item_id_list.len());
        let response = self.client.post(&url).json(query).send().await?;
        Ok(Self::read(response).await?.unwrap_or_default())
    }

    async fn list_icons(&self) -> Result<IconTable> {
        let url = self.url("icon/list");
        log::debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        let entries: Vec<IconEntry> = Self::read(response).await?.unwrap_or_default();
        Ok(entries.into_iter().map(|e| (e.tag, e.url)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_and_failure() {
        let ok: Envelope<Vec<MarkerRecord>> =
            serde_json::from_str(r#"{"code": 200, "data": [{"id": 1, "position": "1,2"}]}"#)
                .unwrap();
        assert_eq!(ok.into_data().unwrap().map(|d| d.len()), Some(1));

        let empty: Envelope<Vec<MarkerRecord>> =
            serde_json::from_str(r#"{"code": 0, "data": null}"#).unwrap();
        assert_eq!(empty.into_data().unwrap(), None);

        let failed: Envelope<Vec<MarkerRecord>> =
            serde_json::from_str(r#"{"code": 500, "msg": "boom"}"#).unwrap();
        let err = failed.into_data().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_base_url_is_normalised() {
        let service = HttpMarkerService::new("https://api.example.com/");
        assert_eq!(service.url("icon/list"), "https://api.example.com/icon/list");
    }

    #[test]
    fn test_from_config_needs_base_url() {
        assert!(HttpMarkerService::from_config(&EngineConfig::default()).is_err());
        let config = EngineConfig {
            api_base_url: Some("https://api.example.com".into()),
            ..EngineConfig::default()
        };
        assert!(HttpMarkerService::from_config(&config).is_ok());
    }
}
