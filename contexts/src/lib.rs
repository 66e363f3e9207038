//! JSON-LD context documents served by the static loader of
//! `ssi-data-integrity` without a network round-trip.

/// <https://w3id.org/security/v1>
pub const SECURITY_V1: &str = include_str!("../w3id-security-v1.jsonld");
/// <https://w3id.org/security/v2>
pub const SECURITY_V2: &str = include_str!("../w3id-security-v2.jsonld");
/// <https://www.w3.org/2018/credentials/v1>
pub const CREDENTIALS_V1: &str = include_str!("../w3c-2018-credentials-v1.jsonld");
/// <https://www.w3.org/ns/credentials/v2>
pub const CREDENTIALS_V2: &str = include_str!("../w3c-credentials-v2.jsonld");
/// <https://www.w3.org/ns/did/v1>
pub const DID_V1: &str = include_str!("../w3c-did-v1.jsonld");
/// <https://w3id.org/security/data-integrity/v1>
pub const W3ID_DATA_INTEGRITY_V1: &str = include_str!("../w3id-data-integrity-v1.jsonld");
/// <https://w3id.org/security/multikey/v1>
pub const W3ID_MULTIKEY_V1: &str = include_str!("../w3id-multikey-v1.jsonld");
