use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::StoreError;
use super::{ContentStore, Entry, EntryPayload, PublishOutcome};

/// REST client for the Strapi v5 document API
#[derive(Debug)]
pub struct StrapiStore {
    /// HTTP client for API requests
    client: Client,
    /// Instance base URL, e.g. "https://cms.example.com"
    base_url: Url,
    /// API token sent as a bearer credential
    api_token: String,
}

/// Envelope around single-document and collection responses
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Body of a write request
#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    data: &'a EntryPayload,
}

/// One configured locale
#[derive(Debug, Deserialize)]
struct StrapiLocale {
    code: String,
}

/// Error body returned by Strapi
#[derive(Debug, Deserialize)]
struct StrapiErrorBody {
    error: Option<StrapiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StrapiErrorDetail {
    message: Option<String>,
}

/// Title of a written entry; other fields are ignored
#[derive(Debug, Deserialize)]
struct WrittenEntry {
    #[serde(default)]
    title: Option<String>,
}

impl StrapiStore {
    /// Create a new client
    pub fn new(base_url: &str, api_token: impl Into<String>, timeout_secs: u64) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| StoreError::RequestFailed(format!("Invalid content store URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.into(),
        })
    }

    /// Build `{base}/api/{segments..}` with the given query pairs
    pub fn api_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::RequestFailed(format!("Content store URL cannot be a base: {}", self.base_url)))?;
            path.pop_if_empty().push("api");
            for segment in segments {
                path.push(segment);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Read query for draft-visible lookups
    fn read_query<'a>(locale: Option<&'a str>, populate: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("status", "draft")];
        if let Some(locale) = locale {
            query.push(("locale", locale));
        }
        if let Some(populate) = populate {
            query.push(("populate", populate));
        }
        query
    }

    async fn send_get(&self, url: Url) -> Result<Response, StoreError> {
        debug!("GET {}", url);
        self.client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(format!("Failed to send request to content store: {}", e)))
    }

    /// Turn a non-success response into an error
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        let message = serde_json::from_str::<StrapiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or(body);
        error!("Content store error ({}): {}", status, message);
        Err(StoreError::ApiError { status_code: status.as_u16(), message })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ContentStore for StrapiStore {
    async fn get_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: Option<&str>,
        populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        let url = self.api_url(&[type_id, id], &Self::read_query(locale, populate))?;
        let response = self.send_get(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: DataEnvelope<Option<Entry>> = Self::parse(Self::check(response).await?).await?;
        Ok(envelope.data)
    }

    async fn get_entry_by_slug(
        &self,
        type_id: &str,
        slug: &str,
        locale: Option<&str>,
        populate: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        let mut query = Self::read_query(locale, populate);
        query.push(("filters[slug][$eq]", slug));
        let url = self.api_url(&[type_id], &query)?;

        let response = Self::check(self.send_get(url).await?).await?;
        let envelope: DataEnvelope<Vec<Entry>> = Self::parse(response).await?;
        Ok(envelope.data.into_iter().next())
    }

    async fn publish_entry(
        &self,
        type_id: &str,
        id: &str,
        locale: &str,
        payload: &EntryPayload,
        draft: bool,
    ) -> Result<PublishOutcome, StoreError> {
        let status = if draft { "draft" } else { "published" };
        let url = self.api_url(&[type_id, id], &[("locale", locale), ("status", status)])?;
        debug!("PUT {}", url);

        let response = self.client
            .put(url)
            .bearer_auth(&self.api_token)
            .json(&WriteBody { data: payload })
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(format!("Failed to send request to content store: {}", e)))?;

        let envelope: DataEnvelope<WrittenEntry> = Self::parse(Self::check(response).await?).await?;
        Ok(PublishOutcome { title: envelope.data.title })
    }

    async fn get_all_locales(&self) -> Result<Vec<String>, StoreError> {
        let url = self.api_url(&["i18n", "locales"], &[])?;
        let response = Self::check(self.send_get(url).await?).await?;
        let locales: Vec<StrapiLocale> = Self::parse(response).await?;
        Ok(locales.into_iter().map(|l| l.code).collect())
    }
}
