//! Identity verification gate.
//!
//! In the wallet-payment flow a session must present a zero-knowledge
//! identity proof and have it verified by the external developer portal
//! before payment initiation is allowed. Verification success is
//! session-scoped and held only in process memory; it is never persisted.

use crate::error::{MarketError, MarketResult};
use crate::types::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// An identity proof submitted by the wallet client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationProof {
    /// The zero-knowledge proof blob
    pub proof: String,
    /// Merkle root of the identity set
    pub merkle_root: String,
    /// Nullifier preventing proof reuse across actions
    pub nullifier_hash: String,
    /// Proof strength requested by the client (e.g. `orb`, `device`)
    pub verification_level: String,
}

/// Abstraction over the external proof verifier.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Submits a proof for `action` and reports whether it verified.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the verifier cannot be
    /// reached or times out. A timeout is a failure, never a pass.
    async fn verify(&self, proof: &VerificationProof, action: &str) -> MarketResult<bool>;
}

#[derive(Debug, Serialize)]
struct VerifyWireRequest<'a> {
    #[serde(flatten)]
    proof: &'a VerificationProof,
    action: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyWireResponse {
    success: bool,
}

/// HTTP verifier backed by the developer portal's verify endpoint.
pub struct PortalIdentityVerifier {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl PortalIdentityVerifier {
    /// Creates a verifier for `app_id` against the portal at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ExternalService`] when the HTTP client cannot
    /// be constructed.
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        timeout: Duration,
    ) -> MarketResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketError::external("identity-verifier", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            app_id: app_id.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for PortalIdentityVerifier {
    async fn verify(&self, proof: &VerificationProof, action: &str) -> MarketResult<bool> {
        let url = format!("{}/api/v2/verify/{}", self.base_url, self.app_id);
        let response = self
            .client
            .post(&url)
            .json(&VerifyWireRequest { proof, action })
            .send()
            .await
            .map_err(|e| MarketError::external("identity-verifier", e.to_string()))?;

        if !response.status().is_success() {
            // The portal answers 4xx for proofs it rejects; that is a
            // definitive "not verified", not a service failure.
            tracing::info!(status = %response.status(), action, "Identity proof rejected");
            return Ok(false);
        }

        let body: VerifyWireResponse = response
            .json()
            .await
            .map_err(|e| MarketError::external("identity-verifier", e.to_string()))?;
        Ok(body.success)
    }
}

/// Mock verifier for development and testing.
#[derive(Clone, Copy, Debug)]
pub struct MockIdentityVerifier {
    accept: bool,
}

impl MockIdentityVerifier {
    /// A verifier that accepts every proof.
    #[must_use]
    pub const fn accepting() -> Self {
        Self { accept: true }
    }

    /// A verifier that rejects every proof.
    #[must_use]
    pub const fn rejecting() -> Self {
        Self { accept: false }
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, _proof: &VerificationProof, _action: &str) -> MarketResult<bool> {
        Ok(self.accept)
    }
}

/// Session-scoped record of verification successes.
///
/// The gate's only obligation: payment initiation must not proceed for a
/// session until a proof has verified during this process's lifetime.
#[derive(Debug, Default)]
pub struct VerificationGate {
    verified: RwLock<HashMap<SessionId, DateTime<Utc>>>,
}

impl VerificationGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session as verified.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] when the gate's lock is poisoned.
    pub fn mark_verified(&self, session: SessionId) -> MarketResult<()> {
        let mut verified = self
            .verified
            .write()
            .map_err(|_| MarketError::Storage("verification gate lock poisoned".to_string()))?;
        verified.insert(session, Utc::now());
        Ok(())
    }

    /// Whether a session has verified during this process's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`] when the gate's lock is poisoned.
    pub fn is_verified(&self, session: &SessionId) -> MarketResult<bool> {
        let verified = self
            .verified
            .read()
            .map_err(|_| MarketError::Storage("verification gate lock poisoned".to_string()))?;
        Ok(verified.contains_key(session))
    }

    /// Rejects unverified sessions.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::VerificationRequired`] for sessions that have
    /// not verified, [`MarketError::Storage`] when the gate's lock is
    /// poisoned.
    pub fn require(&self, session: &SessionId) -> MarketResult<()> {
        if self.is_verified(session)? {
            Ok(())
        } else {
            Err(MarketError::VerificationRequired)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(token: &str) -> SessionId {
        SessionId::new(token).unwrap()
    }

    #[test]
    fn test_gate_requires_verification() {
        let gate = VerificationGate::new();
        let alice = session("alice");

        assert_eq!(
            gate.require(&alice).unwrap_err(),
            MarketError::VerificationRequired
        );

        gate.mark_verified(alice.clone()).unwrap();
        gate.require(&alice).unwrap();

        // Other sessions are unaffected.
        assert!(!gate.is_verified(&session("bob")).unwrap());
    }

    #[tokio::test]
    async fn test_mock_verifier() {
        let proof = VerificationProof {
            proof: "zk".to_string(),
            merkle_root: "root".to_string(),
            nullifier_hash: "nullifier".to_string(),
            verification_level: "orb".to_string(),
        };
        assert!(MockIdentityVerifier::accepting()
            .verify(&proof, "buy-ticket")
            .await
            .unwrap());
        assert!(!MockIdentityVerifier::rejecting()
            .verify(&proof, "buy-ticket")
            .await
            .unwrap());
    }
}
