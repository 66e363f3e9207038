//! Ed25519 keys in the Multikey format.

use std::fmt;

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use multibase::Base;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ExportOptions, ImportOptions, KeyFlag, Keypair, KeypairOptions, Signer};
use crate::canonicalize::document_declares_context;
use crate::controller::VerificationMethod;
use crate::error::Error;
use crate::jsonld::W3ID_MULTIKEY_V1_CONTEXT;

/// Multicodec prefix of an Ed25519 public key
pub const ED25519_PUB_PREFIX: [u8; 2] = [0xed, 0x01];
/// Multicodec prefix of an Ed25519 private key
pub const ED25519_PRIV_PREFIX: [u8; 2] = [0x80, 0x26];

pub const MULTIKEY_TYPE: &str = "Multikey";

/// Multikey document, as exported and imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultikeyDocument {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type")]
    type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    controller: Option<String>,
    public_key_multibase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key_multibase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revoked: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Ed25519Keypair {
    id: Option<String>,
    controller: Option<String>,
    revoked: Option<DateTime<Utc>>,
    public_key: VerifyingKey,
    secret_key: Option<SigningKey>,
}

impl fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("id", &self.id)
            .field("controller", &self.controller)
            .field("revoked", &self.revoked)
            .field("public_key", &self.public_key_multibase())
            .finish_non_exhaustive()
    }
}

fn encode_multikey(prefix: [u8; 2], key: &[u8; 32]) -> String {
    let mut bytes = Vec::with_capacity(34);
    bytes.extend_from_slice(&prefix);
    bytes.extend_from_slice(key);
    multibase::encode(Base::Base58Btc, bytes)
}

fn decode_multikey(prefix: [u8; 2], encoded: &str) -> Result<[u8; 32], Error> {
    let (base, bytes) = multibase::decode(encoded)?;
    if base != Base::Base58Btc {
        return Err(Error::Initialization(format!(
            "Expected base58btc multibase, found {:?}",
            base
        )));
    }
    match bytes.strip_prefix(&prefix[..]) {
        Some(key) => key.try_into().map_err(|_| {
            Error::Initialization(format!("Expected 32-byte key, found {} bytes", key.len()))
        }),
        None => Err(Error::Initialization(format!(
            "Expected multicodec prefix {}",
            hex::encode(prefix)
        ))),
    }
}

impl Ed25519Keypair {
    fn from_parts(
        public_key: VerifyingKey,
        secret_key: Option<SigningKey>,
        options: KeypairOptions,
    ) -> Self {
        let mut keypair = Self {
            id: None,
            controller: options.controller,
            revoked: options.revoked,
            public_key,
            secret_key,
        };
        keypair.id = match options.id {
            Some(id) => Some(id),
            None => keypair
                .controller
                .as_ref()
                .map(|controller| format!("{}#{}", controller, keypair.fingerprint())),
        };
        keypair
    }

    /// Public-only keypair from a `z6Mk…` fingerprint.
    pub fn from_fingerprint(fingerprint: &str) -> Result<Self, Error> {
        let public_key =
            VerifyingKey::from_bytes(&decode_multikey(ED25519_PUB_PREFIX, fingerprint)?)?;
        Ok(Self::from_parts(public_key, None, KeypairOptions::default()))
    }

    /// Public-only keypair from a resolved verification method.
    pub fn from_verification_method(method: &VerificationMethod) -> Result<Self, Error> {
        if method.type_ != MULTIKEY_TYPE {
            return Err(Error::InvalidVerificationMethod(
                method.id.clone(),
                format!("unsupported type {}", method.type_),
            ));
        }
        let public_key_multibase = method.public_key_multibase.as_deref().ok_or_else(|| {
            Error::InvalidVerificationMethod(
                method.id.clone(),
                "missing publicKeyMultibase".to_string(),
            )
        })?;
        let public_key =
            VerifyingKey::from_bytes(&decode_multikey(ED25519_PUB_PREFIX, public_key_multibase)?)?;
        Ok(Self::from_parts(
            public_key,
            None,
            KeypairOptions {
                id: Some(method.id.clone()),
                controller: method.controller.clone(),
                revoked: method.revoked,
            },
        ))
    }

    pub fn public_key_multibase(&self) -> String {
        encode_multikey(ED25519_PUB_PREFIX, self.public_key.as_bytes())
    }

    pub fn has_secret_key(&self) -> bool {
        self.secret_key.is_some()
    }

    pub fn verify_signature(&self, data: &[u8], signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            Ok(signature) => self.public_key.verify_strict(data, &signature).is_ok(),
            Err(err) => {
                log::debug!("Malformed Ed25519 signature: {}", err);
                false
            }
        }
    }
}

impl Signer for Ed25519Keypair {
    fn verification_method(&self) -> Option<String> {
        self.id.clone()
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let secret_key = self.secret_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        Ok(secret_key.sign(data).to_bytes().to_vec())
    }
}

impl Keypair for Ed25519Keypair {
    const TYPE: &'static str = MULTIKEY_TYPE;

    fn initialize(seed: Option<&[u8]>, options: KeypairOptions) -> Result<Self, Error> {
        let secret_key = match seed {
            Some(seed) => {
                let seed: [u8; 32] = seed.try_into().map_err(|_| {
                    Error::Initialization(format!(
                        "Expected 32-byte seed, found {} bytes",
                        seed.len()
                    ))
                })?;
                SigningKey::from_bytes(&seed)
            }
            None => SigningKey::generate(&mut OsRng),
        };
        Ok(Self::from_parts(
            secret_key.verifying_key(),
            Some(secret_key),
            options,
        ))
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    fn revoked(&self) -> Option<DateTime<Utc>> {
        self.revoked
    }

    fn fingerprint(&self) -> String {
        self.public_key_multibase()
    }

    fn verify_fingerprint(&self, fingerprint: &str) -> bool {
        match decode_multikey(ED25519_PUB_PREFIX, fingerprint) {
            Ok(public_key) => &public_key == self.public_key.as_bytes(),
            Err(err) => {
                log::debug!("Invalid fingerprint {}: {}", fingerprint, err);
                false
            }
        }
    }

    fn export(&self, options: &ExportOptions) -> Result<Value, Error> {
        let secret_key_multibase = match options.flag {
            KeyFlag::Public => None,
            KeyFlag::Private => {
                let secret_key = self.secret_key.as_ref().ok_or_else(|| {
                    Error::Export("No private key material to export".to_string())
                })?;
                Some(encode_multikey(ED25519_PRIV_PREFIX, &secret_key.to_bytes()))
            }
        };
        let document = MultikeyDocument {
            context: options
                .include_context
                .then(|| Value::String(W3ID_MULTIKEY_V1_CONTEXT.to_string())),
            id: self.id.clone(),
            type_: Self::TYPE.to_string(),
            controller: self.controller.clone(),
            public_key_multibase: self.public_key_multibase(),
            secret_key_multibase,
            revoked: self.revoked,
        };
        Ok(serde_json::to_value(document)?)
    }

    fn import(document: &Value, options: &ImportOptions) -> Result<Self, Error> {
        if options.check_context && !document_declares_context(document, W3ID_MULTIKEY_V1_CONTEXT) {
            return Err(Error::ContextMismatch(W3ID_MULTIKEY_V1_CONTEXT.to_string()));
        }
        let document: MultikeyDocument = serde_json::from_value(document.clone())?;
        if document.type_ != Self::TYPE {
            return Err(Error::Initialization(format!(
                "Expected key type {}, found {}",
                Self::TYPE,
                document.type_
            )));
        }
        let public_key = VerifyingKey::from_bytes(&decode_multikey(
            ED25519_PUB_PREFIX,
            &document.public_key_multibase,
        )?)?;
        let secret_key = match &document.secret_key_multibase {
            Some(encoded) => {
                let secret_key =
                    SigningKey::from_bytes(&decode_multikey(ED25519_PRIV_PREFIX, encoded)?);
                if secret_key.verifying_key() != public_key {
                    return Err(Error::Initialization(
                        "Secret key does not match public key".to_string(),
                    ));
                }
                Some(secret_key)
            }
            None => None,
        };
        let keypair = Self::from_parts(
            public_key,
            secret_key,
            KeypairOptions {
                id: document.id,
                controller: document.controller,
                revoked: document.revoked,
            },
        );
        if options.check_revoked && keypair.is_revoked_at(Utc::now()) {
            return Err(Error::RevokedKey(
                keypair.id.clone().unwrap_or_else(|| keypair.fingerprint()),
            ));
        }
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SEED: [u8; 32] = [
        0x9b, 0x93, 0x7b, 0x81, 0x32, 0x2d, 0x81, 0x6c, 0xfa, 0xb9, 0xd5, 0xa3, 0xba, 0xac, 0xc9,
        0xb2, 0xa5, 0xfe, 0xbe, 0x4b, 0x14, 0x9f, 0x12, 0x6b, 0x36, 0x30, 0xf9, 0x3a, 0x29, 0x52,
        0x70, 0x17,
    ];

    fn keypair() -> Ed25519Keypair {
        Ed25519Keypair::initialize(
            Some(&SEED),
            KeypairOptions {
                controller: Some("did:example:123".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn seed_length() {
        let err = Ed25519Keypair::initialize(Some(&[0u8; 31]), KeypairOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
        let generated = Ed25519Keypair::initialize(None, KeypairOptions::default()).unwrap();
        assert!(generated.has_secret_key());
        assert!(generated.id().is_none());
    }

    #[test]
    fn fingerprint() {
        let keypair = keypair();
        let fingerprint = keypair.fingerprint();
        assert!(fingerprint.starts_with("z6Mk"));
        assert!(keypair.verify_fingerprint(&fingerprint));
        assert!(!keypair.verify_fingerprint("z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH"));
        assert!(!keypair.verify_fingerprint("not multibase"));
        assert_eq!(
            keypair.id(),
            Some(format!("did:example:123#{}", fingerprint).as_str())
        );
        let public = Ed25519Keypair::from_fingerprint(&fingerprint).unwrap();
        assert!(!public.has_secret_key());
        assert_eq!(public.fingerprint(), fingerprint);
    }

    #[test]
    fn export_import() {
        let keypair = keypair();
        let public = keypair.export(&ExportOptions::default()).unwrap();
        assert_eq!(public["@context"], W3ID_MULTIKEY_V1_CONTEXT);
        assert_eq!(public["type"], "Multikey");
        assert!(public.get("secretKeyMultibase").is_none());

        let private = keypair.export(&ExportOptions::private()).unwrap();
        let secret = private["secretKeyMultibase"].as_str().unwrap();
        assert!(secret.starts_with("z3u2"));
        let imported = Ed25519Keypair::import(&private, &ImportOptions::default()).unwrap();
        assert_eq!(imported.id(), keypair.id());
        assert_eq!(
            imported.sign(b"data").unwrap(),
            keypair.sign(b"data").unwrap()
        );

        let public_only = Ed25519Keypair::import(&public, &ImportOptions::default()).unwrap();
        assert!(matches!(
            public_only.export(&ExportOptions::private()),
            Err(Error::Export(_))
        ));
        assert!(matches!(public_only.sign(b"data"), Err(Error::MissingPrivateKey)));
    }

    #[test]
    fn import_checks() {
        let mut document = keypair().export(&ExportOptions::default()).unwrap();
        document["@context"] = json!("https://w3id.org/security/v2");
        let err = Ed25519Keypair::import(&document, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ContextMismatch(_)));
        let lenient = ImportOptions {
            check_context: false,
            ..Default::default()
        };
        assert!(Ed25519Keypair::import(&document, &lenient).is_ok());

        let mut revoked = keypair().export(&ExportOptions::default()).unwrap();
        revoked["revoked"] = json!("2020-01-01T00:00:00Z");
        let err = Ed25519Keypair::import(&revoked, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::RevokedKey(_)));
        let unchecked = ImportOptions {
            check_revoked: false,
            ..Default::default()
        };
        assert!(Ed25519Keypair::import(&revoked, &unchecked).is_ok());
    }

    #[test]
    fn sign_and_verify() {
        let keypair = keypair();
        let signature = keypair.sign(b"hello").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(keypair.verify_signature(b"hello", &signature));
        assert!(!keypair.verify_signature(b"hullo", &signature));
        assert!(!keypair.verify_signature(b"hello", &signature[..10]));
    }
}
