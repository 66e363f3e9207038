//! Expansion through the [`json_ld`] processor.
//!
//! Remote contexts are fetched with the crate's own [`Loader`]s, wrapped in
//! [`ContextLoader`] so that `json_ld` can call them.

use iref::IriBuf;
use json_ld::expansion::Policy;
use json_ld::JsonLdProcessor;
use rdf_types::IriVocabularyMut;
use serde_json::Value;

use super::{as_vec, JsonLdOptions};
use crate::error::Error;
use crate::loader::Loader;

/// A [`Loader`] seen as a [`json_ld::Loader`].
///
/// `json_ld` only reports loading failures as its own error type, so the
/// first failure is kept here to be returned unchanged once expansion fails.
pub struct ContextLoader<'a> {
    loader: &'a dyn Loader,
    error: Option<Error>,
}

impl<'a> ContextLoader<'a> {
    pub fn new(loader: &'a dyn Loader) -> Self {
        Self {
            loader,
            error: None,
        }
    }

    /// The first error raised by the wrapped loader, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

impl<'a> json_ld::Loader<IriBuf> for ContextLoader<'a> {
    type Error = Error;

    async fn load_with<V>(
        &mut self,
        _vocabulary: &mut V,
        url: IriBuf,
    ) -> Result<json_ld::RemoteDocument<IriBuf>, Error>
    where
        V: IriVocabularyMut<Iri = IriBuf>,
    {
        match self.loader.load(url.as_str()).await {
            Ok(remote) => {
                let document_url = IriBuf::new(remote.document_url).unwrap_or(url);
                Ok(json_ld::RemoteDocument::new(
                    Some(document_url),
                    None,
                    json_syntax::Value::from_serde_json(remote.document),
                ))
            }
            Err(err) => {
                log::debug!("Unable to load context {}: {}", url.as_str(), err);
                let message = err.to_string();
                if self.error.is_none() {
                    self.error = Some(err);
                }
                Err(Error::Loader(message))
            }
        }
    }
}

fn policy(options: &JsonLdOptions) -> Policy {
    if options.strict {
        Policy::Strict
    } else {
        // Undefined terms are kept as invalid IRIs, to be reported and dropped
        // when converting to RDF.
        Policy::Relaxed
    }
}

/// <https://www.w3.org/TR/json-ld11-api/#expansion-algorithm>
///
/// Returns the expanded document as a list of top-level objects.
pub async fn expand(
    document: &Value,
    loader: &dyn Loader,
    options: &JsonLdOptions,
) -> Result<Vec<Value>, Error> {
    let base = match &options.base {
        Some(base) => Some(
            IriBuf::new(base.clone()).map_err(|_| Error::InvalidIri(base.clone()))?,
        ),
        None => None,
    };
    let remote = json_ld::RemoteDocument::new(
        base,
        None,
        json_syntax::Value::from_serde_json(document.clone()),
    );
    let json_ld_options = json_ld::Options {
        expansion_policy: policy(options),
        ..Default::default()
    };
    let mut context_loader = ContextLoader::new(loader);
    let expanded = match remote
        .expand_using(&mut context_loader, json_ld_options)
        .await
    {
        Ok(expanded) => expanded,
        Err(err) => {
            return Err(context_loader
                .take_error()
                .unwrap_or_else(|| Error::Expansion(err.to_string())))
        }
    };
    Ok(as_vec(serde_json::to_value(&expanded)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonld::{json_to_dataset, SECURITY_V2_CONTEXT};
    use crate::loader::{ContextMapLoader, LoaderChain, RemoteDocument, StaticLoader};
    use async_trait::async_trait;
    use serde_json::json;

    async fn to_nquads(document: Value, options: &JsonLdOptions) -> Result<String, Error> {
        Ok(json_to_dataset(&document, &StaticLoader, options)
            .await?
            .to_nquads())
    }

    #[tokio::test]
    async fn expand_inline_context() {
        let expanded = expand(
            &json!({
                "@context": {
                    "ex": "https://example.org/",
                    "name": "ex:name",
                    "knows": {"@id": "ex:knows", "@type": "@id"}
                },
                "@id": "https://example.org/alice",
                "@type": "ex:Person",
                "name": "Alice",
                "knows": "https://example.org/bob"
            }),
            &StaticLoader,
            &JsonLdOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0]["@id"], "https://example.org/alice");
        assert_eq!(expanded[0]["@type"], json!(["https://example.org/Person"]));
        assert_eq!(
            expanded[0]["https://example.org/knows"],
            json!([{"@id": "https://example.org/bob"}])
        );
    }

    #[tokio::test]
    async fn list_container() {
        let nquads = to_nquads(
            json!({
                "@context": {
                    "tags": {"@id": "https://example.org/tags", "@container": "@list"}
                },
                "@id": "https://example.org/s",
                "tags": ["a"]
            }),
            &JsonLdOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            nquads,
            "<https://example.org/s> <https://example.org/tags> _:b0 .\n\
             _:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"a\" .\n\
             _:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .\n"
        );
    }

    #[tokio::test]
    async fn undefined_term_strict_and_lax() {
        let document = json!({
            "@context": {"name": "https://example.org/name"},
            "@id": "https://example.org/alice",
            "name": "Alice",
            "nickname": "Al"
        });
        let err = to_nquads(document.clone(), &JsonLdOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));

        let lax = JsonLdOptions {
            strict: false,
            ..Default::default()
        };
        let nquads = to_nquads(document, &lax).await.unwrap();
        assert_eq!(
            nquads,
            "<https://example.org/alice> <https://example.org/name> \"Alice\" .\n"
        );
    }

    #[tokio::test]
    async fn protected_term_redefinition() {
        let err = expand(
            &json!({
                "@context": [
                    {"@protected": true, "name": "https://example.org/name"},
                    {"name": "https://example.org/other"}
                ],
                "name": "Alice"
            }),
            &StaticLoader,
            &JsonLdOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));
    }

    #[tokio::test]
    async fn graph_container_wraps_proof() {
        let nquads = to_nquads(
            json!({
                "@context": SECURITY_V2_CONTEXT,
                "id": "urn:example:doc",
                "proof": {
                    "type": "DataIntegrityProof",
                    "proofPurpose": "assertionMethod"
                }
            }),
            &JsonLdOptions::default(),
        )
        .await
        .unwrap();
        let lines: Vec<&str> = nquads.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "<urn:example:doc> <https://w3id.org/security#proof> _:b0 ."
        );
        assert!(nquads.contains(
            "<https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> _:b0 ."
        ));
    }

    #[tokio::test]
    async fn remote_contexts_use_the_loader() {
        let loader = LoaderChain::with_fallback(ContextMapLoader::new().with_document(
            "https://example.org/ctx",
            json!({"@context": {"name": "https://schema.org/name"}}),
        ));
        let expanded = expand(
            &json!({"@context": "https://example.org/ctx", "@id": "urn:a", "name": "A"}),
            &loader,
            &JsonLdOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            expanded[0]["https://schema.org/name"],
            json!([{"@value": "A"}])
        );

        let err = expand(
            &json!({"@context": "https://example.org/missing", "name": "A"}),
            &loader,
            &JsonLdOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, Error::DocumentNotFound(url) if url == "https://example.org/missing")
        );
    }

    struct UnreachableLoader;

    #[async_trait]
    impl Loader for UnreachableLoader {
        async fn load(&self, url: &str) -> Result<RemoteDocument, Error> {
            Err(Error::Timeout(url.to_string()))
        }
    }

    #[tokio::test]
    async fn transport_errors_are_kept() {
        let err = expand(
            &json!({"@context": "https://example.org/ctx", "name": "A"}),
            &UnreachableLoader,
            &JsonLdOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(err.is_transport());
    }
}
