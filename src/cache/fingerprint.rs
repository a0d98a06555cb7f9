//! Stable request fingerprinting for cache keys.

use sha2::{Digest, Sha256};

use crate::backend::InferenceRequest;

/// SHA-256 over the normalized request parameters plus the selected backend
/// identity. Two identical requests routed to the same backend always share
/// a fingerprint; the same request on different backends never does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    pub fn compute(request: &InferenceRequest, backend: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.prompt.as_bytes());
        hasher.update([0u8]);
        // BTreeMap iteration is sorted, so parameter order in the caller
        // cannot change the digest.
        for (key, value) in &request.params {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(backend.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_requests_share_fingerprint() {
        let a = InferenceRequest::new("prompt").with_param("temperature", "0.7");
        let b = InferenceRequest::new("prompt").with_param("temperature", "0.7");
        // Request ids differ; the fingerprint must not include them.
        assert_eq!(
            RequestFingerprint::compute(&a, "cloud-a"),
            RequestFingerprint::compute(&b, "cloud-a")
        );
    }

    #[test]
    fn test_param_insertion_order_is_irrelevant() {
        let a = InferenceRequest::new("prompt")
            .with_param("temperature", "0.7")
            .with_param("max_tokens", "64");
        let b = InferenceRequest::new("prompt")
            .with_param("max_tokens", "64")
            .with_param("temperature", "0.7");
        assert_eq!(
            RequestFingerprint::compute(&a, "cloud-a"),
            RequestFingerprint::compute(&b, "cloud-a")
        );
    }

    #[test]
    fn test_backend_identity_separates_keys() {
        let request = InferenceRequest::new("prompt");
        assert_ne!(
            RequestFingerprint::compute(&request, "cloud-a"),
            RequestFingerprint::compute(&request, "local-b")
        );
    }

    #[test]
    fn test_distinct_params_distinct_fingerprints() {
        let a = InferenceRequest::new("prompt").with_param("temperature", "0.7");
        let b = InferenceRequest::new("prompt").with_param("temperature", "0.8");
        assert_ne!(
            RequestFingerprint::compute(&a, "cloud-a"),
            RequestFingerprint::compute(&b, "cloud-a")
        );
    }
}
