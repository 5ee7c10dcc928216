//! Committee Signer / Verifier
//!
//! Holds the simulated validator committee: `N` ed25519 keypairs and a fixed
//! quorum threshold `M <= N`. Signing selects an arbitrary subset of at least
//! `M` members (the protocol only depends on *how many* valid signatures
//! accumulate, never on *which* subset), so the subset policy is injectable
//! and deterministic in tests.
//!
//! Private keys never leave this module; only hex-encoded public keys are
//! published.

use super::types::{now_secs, CertPayload, DaCert};
use crate::error::ClusterError;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// Picks which member indices sign a payload: `(committee_size, quorum) -> indices`.
pub type SelectionFn = Arc<dyn Fn(usize, usize) -> Vec<usize> + Send + Sync>;

/// One validator keypair. The signing half stays private to the committee.
pub struct CommitteeMember {
    signing_key: SigningKey,
}

impl CommitteeMember {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }
}

/// The fixed validator set used for DACert signing and verification.
pub struct Committee {
    members: Vec<CommitteeMember>,
    quorum: usize,
    selection: SelectionFn,
}

impl Committee {
    /// Creates a committee of `size` fresh keypairs with a random signing
    /// subset policy. Requires `1 <= quorum <= size`.
    pub fn new(size: usize, quorum: usize) -> Arc<Self> {
        Self::with_selection(size, quorum, default_selection())
    }

    pub fn with_selection(size: usize, quorum: usize, selection: SelectionFn) -> Arc<Self> {
        assert!(
            quorum >= 1 && quorum <= size,
            "committee quorum must satisfy 1 <= M <= N"
        );
        let members = (0..size).map(|_| CommitteeMember::generate()).collect();
        Arc::new(Self {
            members,
            quorum,
            selection,
        })
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Hex-encoded public keys of every member, index-aligned with the
    /// internal member list.
    pub fn public_keys(&self) -> Vec<String> {
        self.members.iter().map(|m| m.public_key_hex()).collect()
    }

    /// Builds and quorum-signs a DACert for an inference output.
    pub fn sign_result(
        &self,
        task_id: &str,
        model_id: &str,
        output: &serde_json::Value,
    ) -> Result<DaCert, ClusterError> {
        let payload = CertPayload {
            model_id: model_id.to_string(),
            output_hash: hash_output(output),
            task_id: task_id.to_string(),
            timestamp: now_secs(),
        };
        let message = payload.canonical_bytes();

        let indices = (self.selection)(self.members.len(), self.quorum);
        let mut signatures = Vec::with_capacity(indices.len());
        let mut signers = Vec::with_capacity(indices.len());
        for idx in indices {
            let member = self.members.get(idx).ok_or_else(|| {
                ClusterError::Signature(format!("selection returned invalid member index {}", idx))
            })?;
            signatures.push(member.sign_hex(&message));
            signers.push(member.public_key_hex());
        }

        if signatures.len() < self.quorum {
            return Err(ClusterError::Signature(format!(
                "selection produced {} signatures, quorum is {}",
                signatures.len(),
                self.quorum
            )));
        }

        tracing::info!(
            "Collected {}/{} committee signatures for task {}",
            signatures.len(),
            self.members.len(),
            task_id
        );

        Ok(DaCert {
            cert_payload: payload,
            signatures,
            signers,
            quorum: self.quorum,
        })
    }

    /// Verifies a DACert against this committee.
    ///
    /// Re-serializes the payload canonically and checks each
    /// `(signature, signer)` pair against the exact byte string. Malformed
    /// hex, wrong key or signature lengths, and failed verifications all
    /// count as one invalid pair rather than aborting the whole check.
    /// Signers outside the committee and duplicate signers never count
    /// toward the quorum, and a certificate claiming a weaker quorum than
    /// this committee's threshold is rejected outright.
    pub fn verify_dacert(&self, dacert: &DaCert) -> bool {
        if dacert.quorum < self.quorum {
            tracing::warn!(
                "DACert claims quorum {} below committee threshold {}",
                dacert.quorum,
                self.quorum
            );
            return false;
        }

        let message = dacert.cert_payload.canonical_bytes();
        let known: HashSet<String> = self.public_keys().into_iter().collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut valid = 0usize;

        for (sig_hex, pk_hex) in dacert.signatures.iter().zip(dacert.signers.iter()) {
            if !known.contains(pk_hex) {
                tracing::debug!("Signature from non-committee key ignored");
                continue;
            }
            if !seen.insert(pk_hex.as_str()) {
                tracing::debug!("Duplicate signer ignored");
                continue;
            }
            if verify_signature(&message, sig_hex, pk_hex) {
                valid += 1;
            }
        }

        if valid >= dacert.quorum {
            tracing::debug!(
                "DACert for task {} verified with {} valid signatures",
                dacert.cert_payload.task_id,
                valid
            );
            true
        } else {
            tracing::warn!(
                "DACert for task {} rejected: {} valid signatures, quorum {}",
                dacert.cert_payload.task_id,
                valid,
                dacert.quorum
            );
            false
        }
    }
}

/// SHA-256 over the canonical serialization of an output value.
///
/// `serde_json::Value` objects keep keys sorted, so semantically identical
/// outputs hash identically regardless of in-memory field order.
pub fn hash_output(output: &serde_json::Value) -> String {
    let canonical = serde_json::to_vec(output).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}

fn verify_signature(message: &[u8], sig_hex: &str, pk_hex: &str) -> bool {
    let pk_bytes: [u8; 32] = match hex::decode(pk_hex).ok().and_then(|b| b.try_into().ok()) {
        Some(bytes) => bytes,
        None => return false,
    };
    let verifying_key = match VerifyingKey::from_bytes(&pk_bytes) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = match hex::decode(sig_hex)
        .ok()
        .and_then(|b| Signature::from_slice(&b).ok())
    {
        Some(sig) => sig,
        None => return false,
    };
    verifying_key.verify(message, &signature).is_ok()
}

/// Production policy: a uniformly random subset of exactly `quorum` members.
pub fn default_selection() -> SelectionFn {
    Arc::new(|size, quorum| {
        let take = quorum.min(size);
        rand::seq::index::sample(&mut rand::thread_rng(), size, take).into_vec()
    })
}

/// Deterministic policy for tests and reproducible runs: the first `quorum`
/// members in index order.
pub fn first_m_selection() -> SelectionFn {
    Arc::new(|size, quorum| (0..quorum.min(size)).collect())
}
