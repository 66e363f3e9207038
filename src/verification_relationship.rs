use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A [verification relationship](https://w3c.github.io/did-core/#dfn-verification-relationship).
///
/// The relationship between a verification method and its controller; a
/// proof's `proofPurpose` names the relationship the controller must grant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "String", into = "String")]
pub enum VerificationRelationship {
    #[default]
    AssertionMethod,
    Authentication,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl FromStr for VerificationRelationship {
    type Err = Error;
    fn from_str(purpose: &str) -> Result<Self, Self::Err> {
        match purpose {
            "authentication" => Ok(Self::Authentication),
            "assertionMethod" => Ok(Self::AssertionMethod),
            "keyAgreement" => Ok(Self::KeyAgreement),
            "capabilityInvocation" => Ok(Self::CapabilityInvocation),
            "capabilityDelegation" => Ok(Self::CapabilityDelegation),
            _ => Err(Error::InvalidProof(format!(
                "Unsupported proof purpose {}",
                purpose
            ))),
        }
    }
}

impl TryFrom<String> for VerificationRelationship {
    type Error = Error;
    fn try_from(purpose: String) -> Result<Self, Self::Error> {
        Self::from_str(&purpose)
    }
}

impl From<VerificationRelationship> for String {
    fn from(purpose: VerificationRelationship) -> String {
        purpose.as_str().to_string()
    }
}

impl fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VerificationRelationship {
    /// The JSON-LD term, as used in `proofPurpose` and controller documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationRelationship::Authentication => "authentication",
            VerificationRelationship::AssertionMethod => "assertionMethod",
            VerificationRelationship::KeyAgreement => "keyAgreement",
            VerificationRelationship::CapabilityInvocation => "capabilityInvocation",
            VerificationRelationship::CapabilityDelegation => "capabilityDelegation",
        }
    }

    /// The IRI the term expands to.
    pub fn to_iri(&self) -> &'static str {
        match self {
            VerificationRelationship::Authentication => {
                "https://w3id.org/security#authenticationMethod"
            }
            VerificationRelationship::AssertionMethod => {
                "https://w3id.org/security#assertionMethod"
            }
            VerificationRelationship::KeyAgreement => {
                "https://w3id.org/security#keyAgreementMethod"
            }
            VerificationRelationship::CapabilityInvocation => {
                "https://w3id.org/security#capabilityInvocationMethod"
            }
            VerificationRelationship::CapabilityDelegation => {
                "https://w3id.org/security#capabilityDelegationMethod"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_expand() {
        let purpose: VerificationRelationship = "authentication".parse().unwrap();
        assert_eq!(purpose, VerificationRelationship::Authentication);
        assert_eq!(
            purpose.to_iri(),
            "https://w3id.org/security#authenticationMethod"
        );
        assert_eq!(purpose.to_string(), "authentication");
        assert!("contractAgreement".parse::<VerificationRelationship>().is_err());
        let purpose: VerificationRelationship =
            serde_json::from_value(serde_json::json!("capabilityDelegation")).unwrap();
        assert_eq!(purpose, VerificationRelationship::CapabilityDelegation);
    }
}
