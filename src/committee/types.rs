use serde::{Deserialize, Serialize};

/// The statement a DACert attests to: which task produced which output hash
/// under which model, and when.
///
/// Signatures are computed over `canonical_bytes`, never over an ad-hoc
/// serialization, so verification is reproducible on any process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertPayload {
    pub model_id: String,
    pub output_hash: String,
    pub task_id: String,
    pub timestamp: u64,
}

impl CertPayload {
    /// Serializes the payload with stable key ordering.
    ///
    /// Round-trips through `serde_json::Value`, whose object map keeps keys
    /// sorted, so the byte string is independent of field declaration order.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match serde_json::to_value(self).and_then(|value| serde_json::to_vec(&value)) {
            Ok(bytes) => bytes,
            // Unreachable for a plain string/int struct; an empty message
            // would simply fail verification.
            Err(_) => Vec::new(),
        }
    }
}

/// Decentralized Attestation Certificate.
///
/// `signatures` and `signers` are index-aligned: `signatures[i]` is member
/// `signers[i]`'s ed25519 signature (hex) over the canonical payload bytes.
/// The certificate is valid iff at least `quorum` of those pairs verify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaCert {
    pub cert_payload: CertPayload,
    pub signatures: Vec<String>,
    pub signers: Vec<String>,
    pub quorum: usize,
}

/// Current unix time in seconds, used for certificate timestamps.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
