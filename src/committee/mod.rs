//! Committee Attestation Module
//!
//! Implements the DACert protocol: a fixed validator committee quorum-signs a
//! canonical result-hash payload, and anyone holding the committee's public
//! keys can verify that at least `quorum` members endorsed the exact bytes.
//!
//! ## Responsibilities
//! - **Canonical serialization**: stable key ordering for payloads and outputs
//!   so signatures are reproducible byte-for-byte.
//! - **Signing**: selecting a member subset and collecting signatures.
//! - **Verification**: counting valid signatures against the quorum threshold,
//!   degrading gracefully on malformed entries.

pub mod signer;
pub mod types;


pub use signer::{default_selection, first_m_selection, Committee, CommitteeMember};
pub use types::{CertPayload, DaCert};
