use reqwest::Client;
use serde_json::Value;

use super::types::*;
use crate::core::config::SourcesConfig;
use crate::core::{FlipperError, Result};

/// Fetches raw marketplace documents. Remote sources go over HTTP with the
/// configured timeout; anything else is read from disk.
pub struct MarketplaceClient {
    client: Client,
    sources: SourcesConfig,
}

impl MarketplaceClient {
    pub fn new(sources: SourcesConfig) -> Result<Self> {
        let client = Client::builder().timeout(sources.fetch_timeout()).build()?;
        Ok(Self { client, sources })
    }

    /// Configured catalog documents, in load order.
    pub fn catalog_sources(&self) -> Vec<SourceLocation> {
        [
            (SourceKind::Scored, &self.sources.scored_items),
            (SourceKind::Amazon, &self.sources.amazon_items),
            (SourceKind::Ebay, &self.sources.ebay_items),
        ]
        .into_iter()
        .filter_map(|(kind, location)| {
            location
                .as_ref()
                .map(|location| SourceLocation::new(kind, location.clone()))
        })
        .collect()
    }

    /// Fetch a document and return its top-level array. A document that is
    /// valid JSON but not an array yields no items.
    pub async fn fetch_items(&self, source: &SourceLocation) -> Result<Vec<Value>> {
        let body = if source.is_remote() {
            self.get_text(source).await?
        } else {
            tokio::fs::read_to_string(&source.location)
                .await
                .map_err(|e| FlipperError::fetch(source.kind.name(), e.to_string()))?
        };

        let document: Value = serde_json::from_str(&body).map_err(|e| {
            FlipperError::Parse(format!("{} is not valid JSON: {}", source.kind.name(), e))
        })?;

        match document {
            Value::Array(items) => Ok(items),
            _ => {
                tracing::warn!("⚠️  {} is not a JSON array, treating as empty", source.kind.name());
                Ok(Vec::new())
            }
        }
    }

    async fn get_text(&self, source: &SourceLocation) -> Result<String> {
        let response = self
            .client
            .get(&source.location)
            .header("Cache-Control", "no-store")
            .send()
            .await
            .map_err(|e| FlipperError::fetch(source.kind.name(), e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            tracing::error!("Failed to load {}: {}", source.kind.name(), status);
            return Err(FlipperError::fetch(
                source.kind.name(),
                format!("HTTP status {}", status),
            ));
        }

        Ok(response.text().await?)
    }

    /// POST `query` as form data to the proxy search endpoint.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(&self.sources.search_endpoint)
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| FlipperError::fetch(SourceKind::Search.name(), e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Search endpoint error: {} - {}", status, error_text);
            return Err(FlipperError::fetch(
                SourceKind::Search.name(),
                format!("HTTP status {}", status),
            ));
        }

        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| FlipperError::Parse(format!("search response: {}", e)))?;

        tracing::debug!("🔎 Search '{}' returned {} results", query, results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    fn temp_file(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("flipper-client-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fetch_items_from_file() {
        let client = MarketplaceClient::new(Config::default().sources).unwrap();
        let path = temp_file(r#"[{"title": "A"}, {"title": "B"}]"#);
        let source = SourceLocation::new(SourceKind::Scored, path.to_string_lossy());

        let items = client.fetch_items(&source).await.unwrap();
        assert_eq!(items.len(), 2);
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_non_array_document_is_empty() {
        let client = MarketplaceClient::new(Config::default().sources).unwrap();
        let path = temp_file(r#"{"items": []}"#);
        let source = SourceLocation::new(SourceKind::Amazon, path.to_string_lossy());

        let items = client.fetch_items(&source).await.unwrap();
        assert!(items.is_empty());
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_failure() {
        let client = MarketplaceClient::new(Config::default().sources).unwrap();
        let source = SourceLocation::new(SourceKind::Ebay, "/nonexistent/flipper/items.json");

        let err = client.fetch_items(&source).await.unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Fetch);
    }

    #[test]
    fn test_disabled_sources_are_skipped() {
        let mut sources = Config::default().sources;
        sources.amazon_items = None;
        let client = MarketplaceClient::new(sources).unwrap();

        let kinds: Vec<SourceKind> = client.catalog_sources().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SourceKind::Scored, SourceKind::Ebay]);
    }
}
