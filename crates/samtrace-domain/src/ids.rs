//! Record identifiers - deterministic UUIDv5 values (per ADR-007)
//!
//! Every record id is derived from the record's identity (case, claim key,
//! document pair, ...) under a fixed project namespace. Re-running a phase
//! over identical inputs therefore mints identical ids, which is what makes
//! phase idempotence observable byte-for-byte.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project namespace under which all record ids are minted.
pub const SAMTRACE_NAMESPACE: Uuid = Uuid::from_u128(0x7c9a54e4_93bb_4a34_8f2e_0b6c3d1e5a77);

/// Unit separator between name parts, so ("ab", "c") and ("a", "bc")
/// never mint the same id.
const SEP: char = '\u{1f}';

fn mint(parts: &[&str]) -> Uuid {
    let mut name = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            name.push(SEP);
        }
        name.push_str(part);
    }
    Uuid::new_v5(&SAMTRACE_NAMESPACE, name.as_bytes())
}

macro_rules! record_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create from a raw u128 value (storage layer deserialization).
            pub fn from_value(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            /// Parse from a UUID string.
            pub fn from_string(s: &str) -> Result<Self, String> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| format!("Invalid UUID string: {}", e))
            }

            /// Get the raw u128 value.
            pub fn value(&self) -> u128 {
                self.0.as_u128()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id! {
    /// Identifier of a [`crate::ClaimOrigin`], derived from the case and the
    /// normalized claim key.
    OriginId
}

record_id! {
    /// Identifier of a [`crate::ClaimPropagation`], derived from the claim
    /// and the ordered document pair.
    PropagationId
}

record_id! {
    /// Identifier of an [`crate::AuthorityMarker`], derived from the claim,
    /// the invoking document, and the authority type.
    MarkerId
}

record_id! {
    /// Identifier of a [`crate::SamOutcome`], derived from the case, the
    /// root claim, and the outcome description.
    OutcomeId
}

record_id! {
    /// Identifier of a [`crate::Finding`], derived from the case, the
    /// finding kind, and its subject.
    FindingId
}

impl OriginId {
    /// Mint the id for a claim's origin record.
    pub fn derive(case_id: &str, claim_key: &str) -> Self {
        Self(mint(&["origin", case_id, claim_key]))
    }
}

impl PropagationId {
    /// Mint the id for a propagation edge.
    pub fn derive(claim_id: OriginId, source_document_id: &str, target_document_id: &str) -> Self {
        let claim = claim_id.to_string();
        Self(mint(&[
            "propagation",
            &claim,
            source_document_id,
            target_document_id,
        ]))
    }
}

impl MarkerId {
    /// Mint the id for an authority marker.
    pub fn derive(claim_id: OriginId, document_id: &str, authority_type: &str) -> Self {
        let claim = claim_id.to_string();
        Self(mint(&["marker", &claim, document_id, authority_type]))
    }
}

impl OutcomeId {
    /// Mint the id for an outcome record.
    pub fn derive(case_id: &str, root_claim_id: OriginId, description: &str) -> Self {
        let claim = root_claim_id.to_string();
        Self(mint(&["outcome", case_id, &claim, description]))
    }
}

impl FindingId {
    /// Mint the id for a finding.
    pub fn derive(case_id: &str, kind: &str, subject: &str) -> Self {
        Self(mint(&["finding", case_id, kind, subject]))
    }
}
