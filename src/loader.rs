//! Document loaders.
//!
//! A [`Loader`] maps a URL to a JSON(-LD) document. Loaders are used both for
//! remote `@context`s and for resolving verification methods and controller
//! documents. They are composed with [`LoaderChain`]; a loader that does not
//! know a URL answers [`Error::DocumentNotFound`] so the chain can move on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::jsonld::{
    CREDENTIALS_V1_CONTEXT, CREDENTIALS_V2_CONTEXT, DID_V1_CONTEXT, SECURITY_V1_CONTEXT,
    SECURITY_V2_CONTEXT, W3ID_DATA_INTEGRITY_V1_CONTEXT, W3ID_DID_V1_CONTEXT,
    W3ID_MULTIKEY_V1_CONTEXT,
};

#[cfg(feature = "http")]
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A loaded document.
///
/// <https://w3c.github.io/json-ld-api/#remotedocument>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// Final URL of the document, after redirects.
    pub document_url: String,
    /// Context URL given out of band, e.g. by an HTTP Link header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_url: Option<String>,
    pub document: Value,
}

impl RemoteDocument {
    pub fn new(document_url: impl Into<String>, document: Value) -> Self {
        Self {
            document_url: document_url.into(),
            context_url: None,
            document,
        }
    }
}

/// Resolve a URL to a document.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error>;
}

#[async_trait]
impl<L: Loader + ?Sized> Loader for Arc<L> {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        (**self).load(url).await
    }
}

#[async_trait]
impl<L: Loader + ?Sized> Loader for Box<L> {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        (**self).load(url).await
    }
}

fn load_static_context(url: &'static str, content: &str) -> Option<(&'static str, RemoteDocument)> {
    match serde_json::from_str(content) {
        Ok(document) => Some((url, RemoteDocument::new(url, document))),
        Err(err) => {
            log::error!("Unable to parse built-in context {}: {}", url, err);
            None
        }
    }
}

lazy_static! {
    static ref STATIC_CONTEXTS: HashMap<&'static str, RemoteDocument> = [
        (CREDENTIALS_V1_CONTEXT, ssi_data_integrity_contexts::CREDENTIALS_V1),
        (CREDENTIALS_V2_CONTEXT, ssi_data_integrity_contexts::CREDENTIALS_V2),
        (SECURITY_V1_CONTEXT, ssi_data_integrity_contexts::SECURITY_V1),
        (SECURITY_V2_CONTEXT, ssi_data_integrity_contexts::SECURITY_V2),
        (DID_V1_CONTEXT, ssi_data_integrity_contexts::DID_V1),
        (W3ID_DID_V1_CONTEXT, ssi_data_integrity_contexts::DID_V1),
        (
            W3ID_DATA_INTEGRITY_V1_CONTEXT,
            ssi_data_integrity_contexts::W3ID_DATA_INTEGRITY_V1,
        ),
        (
            W3ID_MULTIKEY_V1_CONTEXT,
            ssi_data_integrity_contexts::W3ID_MULTIKEY_V1,
        ),
    ]
    .into_iter()
    .filter_map(|(url, content)| load_static_context(url, content))
    .collect();
}

/// Serves the contexts bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl StaticLoader {
    pub fn contains(url: &str) -> bool {
        STATIC_CONTEXTS.contains_key(url)
    }
}

#[async_trait]
impl Loader for StaticLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        match STATIC_CONTEXTS.get(url) {
            Some(document) => Ok(document.clone()),
            None => Err(Error::DocumentNotFound(url.to_string())),
        }
    }
}

/// Serves documents from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct ContextMapLoader {
    context_map: HashMap<String, RemoteDocument>,
}

impl ContextMapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from URLs mapped to their unparsed JSON content.
    pub fn with_context_map_from(
        preparsed_context_map: HashMap<String, String>,
    ) -> Result<Self, Error> {
        let context_map = preparsed_context_map
            .into_iter()
            .map(|(url, json)| -> Result<(String, RemoteDocument), Error> {
                let document = serde_json::from_str(&json)?;
                Ok((url.clone(), RemoteDocument::new(url, document)))
            })
            .collect::<Result<_, Error>>()?;
        Ok(Self { context_map })
    }

    /// Add a document, builder style.
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        let url = url.into();
        self.context_map
            .insert(url.clone(), RemoteDocument::new(url, document));
    }
}

#[async_trait]
impl Loader for ContextMapLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        self.context_map
            .get(url)
            .cloned()
            .ok_or_else(|| Error::DocumentNotFound(url.to_string()))
    }
}

/// Knows no documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLoader;

#[async_trait]
impl Loader for NoOpLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        Err(Error::DocumentNotFound(url.to_string()))
    }
}

/// Fetches documents over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpLoader {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Loader for HttpLoader {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        let network_error = |message: String| Error::NetworkConnection {
            url: url.to_string(),
            message,
        };
        log::debug!("Fetching {}", url);
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/ld+json, application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|err| network_error(format!("Error sending HTTP request: {err}")))?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(network_error(format!("HTTP status {status}")));
        }
        let document_url = resp.url().to_string();
        let document: Value = resp
            .json()
            .await
            .map_err(|err| network_error(format!("Error reading HTTP response: {err}")))?;
        Ok(RemoteDocument::new(document_url, document))
    }
}

/// Tries loaders in order, moving to the next one only when a loader does
/// not know the URL. Any other error ends the search.
#[derive(Clone)]
pub struct LoaderChain {
    loaders: Vec<Arc<dyn Loader>>,
}

impl std::fmt::Debug for LoaderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("LoaderChain")
            .field("len", &self.loaders.len())
            .finish_non_exhaustive()
    }
}

impl LoaderChain {
    /// Constructs an empty chain.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// The built-in contexts, then `loader`.
    pub fn with_fallback(loader: impl Loader + 'static) -> Self {
        Self::default().push(loader)
    }

    /// Append a loader, builder style.
    pub fn push(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }
}

/// The default chain only uses [`StaticLoader`].
impl Default for LoaderChain {
    fn default() -> Self {
        Self::empty().push(StaticLoader)
    }
}

#[async_trait]
impl Loader for LoaderChain {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        for loader in &self.loaders {
            match loader.load(url).await {
                Err(Error::DocumentNotFound(_)) => continue,
                result => return result,
            }
        }
        log::debug!("No loader knows {}", url);
        Err(Error::DocumentNotFound(url.to_string()))
    }
}

/// Fails loads that take longer than a deadline.
#[derive(Debug, Clone)]
pub struct TimeoutLoader<L> {
    inner: L,
    timeout: Duration,
}

impl<L: Loader> TimeoutLoader<L> {
    pub fn new(inner: L, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<L: Loader> Loader for TimeoutLoader<L> {
    async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
        match tokio::time::timeout(self.timeout, self.inner.load(url)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Loading {} timed out after {:?}", url, self.timeout);
                Err(Error::Timeout(url.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SlowLoader;

    #[async_trait]
    impl Loader for SlowLoader {
        async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(Error::DocumentNotFound(url.to_string()))
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl Loader for FailingLoader {
        async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
            Err(Error::Loader(format!("refused {}", url)))
        }
    }

    #[tokio::test]
    async fn static_contexts() {
        for url in [
            CREDENTIALS_V1_CONTEXT,
            CREDENTIALS_V2_CONTEXT,
            SECURITY_V1_CONTEXT,
            SECURITY_V2_CONTEXT,
            DID_V1_CONTEXT,
            W3ID_DID_V1_CONTEXT,
            W3ID_DATA_INTEGRITY_V1_CONTEXT,
            W3ID_MULTIKEY_V1_CONTEXT,
        ] {
            let remote = StaticLoader.load(url).await.unwrap();
            assert!(remote.document.get("@context").is_some(), "{}", url);
        }
        assert!(matches!(
            StaticLoader.load("https://example.org/unknown").await,
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn chain_falls_through_only_on_not_found() {
        let map = ContextMapLoader::new()
            .with_document("did:example:1", json!({"id": "did:example:1"}));
        let chain = LoaderChain::with_fallback(map.clone());
        let remote = chain.load("did:example:1").await.unwrap();
        assert_eq!(remote.document["id"], "did:example:1");
        assert!(chain.load(SECURITY_V2_CONTEXT).await.is_ok());

        let chain = LoaderChain::default().push(FailingLoader).push(map);
        assert!(matches!(
            chain.load("did:example:1").await,
            Err(Error::Loader(_))
        ));
        assert!(matches!(
            LoaderChain::empty().load("did:example:1").await,
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn context_map_from_strings() {
        let mut map = HashMap::new();
        map.insert(
            "https://example.org/ctx".to_string(),
            r#"{"@context": {"name": "https://schema.org/name"}}"#.to_string(),
        );
        let loader = ContextMapLoader::with_context_map_from(map).unwrap();
        let remote = loader.load("https://example.org/ctx").await.unwrap();
        assert_eq!(remote.document_url, "https://example.org/ctx");

        let mut bad = HashMap::new();
        bad.insert("https://example.org/bad".to_string(), "{".to_string());
        assert!(ContextMapLoader::with_context_map_from(bad).is_err());
    }

    #[tokio::test]
    async fn timeout() {
        let loader = TimeoutLoader::new(SlowLoader, Duration::from_millis(10));
        let err = loader.load("https://example.org/slow").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_transport());
        assert!(matches!(
            NoOpLoader.load("https://example.org/").await,
            Err(Error::DocumentNotFound(_))
        ));
    }
}
