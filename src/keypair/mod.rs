//! Keypairs: key material bound to an identifier and a controller.

pub mod ed25519;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

pub use ed25519::Ed25519Keypair;

/// Which key material to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum KeyFlag {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub flag: KeyFlag,
    pub include_context: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            flag: KeyFlag::Public,
            include_context: true,
        }
    }
}

impl ExportOptions {
    pub fn private() -> Self {
        Self {
            flag: KeyFlag::Private,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Require the document to declare the key type's context.
    pub check_context: bool,
    /// Refuse keys whose revocation date has passed.
    pub check_revoked: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            check_context: true,
            check_revoked: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeypairOptions {
    /// Defaults to the controller followed by `#` and the fingerprint.
    pub id: Option<String>,
    pub controller: Option<String>,
    pub revoked: Option<DateTime<Utc>>,
}

/// Produces signatures for a proof. Object-safe so suites can take any key
/// source, local or remote.
pub trait Signer: Send + Sync {
    /// Id of the verification method the signatures verify against.
    fn verification_method(&self) -> Option<String>;

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Key material of one key type.
pub trait Keypair: Signer + Sized {
    /// Key type, as written in exported documents.
    const TYPE: &'static str;

    /// Derive key material from a seed, or generate fresh material.
    fn initialize(seed: Option<&[u8]>, options: KeypairOptions) -> Result<Self, Error>;

    fn id(&self) -> Option<&str>;

    fn controller(&self) -> Option<&str>;

    fn revoked(&self) -> Option<DateTime<Utc>>;

    /// Multibase fingerprint of the public key.
    fn fingerprint(&self) -> String;

    fn verify_fingerprint(&self, fingerprint: &str) -> bool;

    fn export(&self, options: &ExportOptions) -> Result<Value, Error>;

    fn import(document: &Value, options: &ImportOptions) -> Result<Self, Error>;

    fn key_type(&self) -> &'static str {
        Self::TYPE
    }

    fn is_revoked_at(&self, date: DateTime<Utc>) -> bool {
        self.revoked().map_or(false, |revoked| revoked <= date)
    }
}
