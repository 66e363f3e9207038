//! RDF Dataset Canonicalization of JSON-LD documents and proof options.

use serde_json::Value;

use crate::error::Error;
use crate::jsonld::{self, JsonLdOptions, AT_CONTEXT, SECURITY_V2_CONTEXT};
use crate::loader::Loader;
use crate::urdna2015;

/// Canonicalize a document to sorted N-Quads with canonical blank node
/// labels.
///
/// With `skip_expansion`, the document must already be in expanded form.
pub async fn canonicalize_document(
    document: &Value,
    loader: &dyn Loader,
    skip_expansion: bool,
) -> Result<String, Error> {
    canonicalize_document_with(document, loader, skip_expansion, &JsonLdOptions::default()).await
}

pub async fn canonicalize_document_with(
    document: &Value,
    loader: &dyn Loader,
    skip_expansion: bool,
    options: &JsonLdOptions,
) -> Result<String, Error> {
    let dataset = if skip_expansion {
        jsonld::expanded_to_dataset(document.clone(), options.strict)?
    } else {
        jsonld::json_to_dataset(document, loader, options).await?
    };
    let dataset_normalized = urdna2015::normalize(&dataset)?;
    let normalized = dataset_normalized.to_nquads();
    log::debug!("Canonical form:\n{}", normalized);
    Ok(normalized)
}

/// Canonicalize proof options.
///
/// The options are always interpreted under the security v2 context, and
/// never carry `nonce` or `proofValue`.
pub async fn canonicalize_proof_options(
    proof: &Value,
    loader: &dyn Loader,
) -> Result<String, Error> {
    let mut options = proof
        .as_object()
        .cloned()
        .ok_or_else(|| Error::InvalidProof("Proof options must be an object".to_string()))?;
    options.insert(
        AT_CONTEXT.to_string(),
        Value::String(SECURITY_V2_CONTEXT.to_string()),
    );
    options.remove("nonce");
    options.remove("proofValue");
    canonicalize_document(&Value::Object(options), loader, false).await
}

/// Whether the document's `@context` is, or includes, the given URL.
pub fn document_declares_context(document: &Value, context_url: &str) -> bool {
    match document.get(AT_CONTEXT) {
        Some(Value::String(context)) => context == context_url,
        Some(Value::Array(contexts)) => contexts
            .iter()
            .any(|context| context.as_str() == Some(context_url)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticLoader;
    use serde_json::json;

    #[tokio::test]
    async fn blank_node_labels_are_canonical() {
        let document = json!({
            "@context": {"ex": "https://example.org/"},
            "ex:knows": {"ex:name": "Bob"}
        });
        let nquads = canonicalize_document(&document, &StaticLoader, false)
            .await
            .unwrap();
        assert_eq!(
            nquads,
            "_:c14n0 <https://example.org/knows> _:c14n1 .\n\
             _:c14n1 <https://example.org/name> \"Bob\" .\n"
        );
    }

    #[tokio::test]
    async fn expanded_input() {
        let expanded = json!([{
            "@id": "https://example.org/s",
            "https://example.org/p": [{"@value": "o"}]
        }]);
        let nquads = canonicalize_document(&expanded, &StaticLoader, true)
            .await
            .unwrap();
        assert_eq!(
            nquads,
            "<https://example.org/s> <https://example.org/p> \"o\" .\n"
        );
    }

    #[tokio::test]
    async fn proof_options_ignore_nonce_and_context() {
        let options = json!({
            "@context": "https://www.w3.org/ns/credentials/v2",
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-rdfc-2022",
            "created": "2023-02-24T23:36:38Z",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:123#key-1"
        });
        let mut with_nonce = options.clone();
        with_nonce["nonce"] = json!("123");
        with_nonce["proofValue"] = json!("zabc");
        with_nonce["@context"] = json!(SECURITY_V2_CONTEXT);
        let a = canonicalize_proof_options(&options, &StaticLoader)
            .await
            .unwrap();
        let b = canonicalize_proof_options(&with_nonce, &StaticLoader)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(a.contains("<https://w3id.org/security#cryptosuite>"));
        assert!(a.contains(
            "<https://w3id.org/security#verificationMethod> <did:example:123#key-1>"
        ));
    }

    #[test]
    fn declares_context() {
        let single = json!({"@context": "https://example.org/a"});
        let list = json!({"@context": ["https://example.org/a", {"b": "https://example.org/b"}]});
        assert!(document_declares_context(&single, "https://example.org/a"));
        assert!(document_declares_context(&list, "https://example.org/a"));
        assert!(!document_declares_context(&list, "https://example.org/b"));
        assert!(!document_declares_context(&json!({}), "https://example.org/a"));
    }
}
