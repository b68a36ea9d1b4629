// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token Authority: issues, verifies, rotates and revokes credentials.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::store::{AuditRecord, CredentialStore, RefreshRecord, SessionRecord, SweepOutcome};
use crate::auth::token::{generate_refresh_token, AccessSigner};
use crate::auth::{epoch_secs, AccessClaims, AuthError, ClientMeta, Identity, Role, TokenPair};

/// Issues and validates access/refresh credentials.
pub struct TokenAuthority {
    signer: AccessSigner,
    store: Arc<dyn CredentialStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenAuthority {
    pub fn new(
        signer: AccessSigner,
        store: Arc<dyn CredentialStore>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self { signer, store, access_ttl, refresh_ttl }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mint an access token and persist a fresh refresh credential.
    pub async fn issue_token_pair(
        &self,
        subject: &str,
        external_id: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let identity = Identity {
            subject: subject.to_owned(),
            external_id: external_id.to_owned(),
            role,
        };
        self.issue_for(&identity, None).await
    }

    async fn issue_for(
        &self,
        identity: &Identity,
        session_id: Option<String>,
    ) -> Result<TokenPair, AuthError> {
        let access_ttl = self.access_ttl.as_secs();
        let access_token = self.signer.sign(identity, access_ttl)?;

        let now = epoch_secs();
        let record = RefreshRecord {
            token: generate_refresh_token(),
            subject: identity.subject.clone(),
            external_id: identity.external_id.clone(),
            role: identity.role,
            session_id,
            issued_at: now,
            expires_at: now.saturating_add(self.refresh_ttl.as_secs()),
        };
        let refresh_token = record.token.clone();
        self.store.insert_refresh(record).await.map_err(AuthError::Persistence)?;

        Ok(TokenPair { access_token, refresh_token, expires_in: access_ttl })
    }

    /// Redeem a refresh credential for a new pair.
    ///
    /// The store's atomic take is the serialization point: of any number of
    /// concurrent redemptions of one value, exactly one sees the record.
    /// An expired record is consumed by the same take, so a retry reports
    /// not-found rather than expired.
    pub async fn redeem_refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let record = self
            .store
            .take_refresh(refresh_token)
            .await
            .map_err(AuthError::Persistence)?
            .ok_or(AuthError::CredentialNotFound)?;

        if record.is_expired(epoch_secs()) {
            tracing::debug!(subject = %record.subject, "expired refresh credential presented");
            return Err(AuthError::CredentialExpired);
        }

        let identity = Identity {
            subject: record.subject.clone(),
            external_id: record.external_id.clone(),
            role: record.role,
        };
        let pair = self.issue_for(&identity, record.session_id.clone()).await?;

        self.audit(AuditRecord {
            actor: record.subject,
            action: "refresh".to_owned(),
            target: record.session_id.unwrap_or_default(),
            detail: String::new(),
            source: None,
            at: epoch_secs(),
        })
        .await;
        Ok(pair)
    }

    /// Check signature and expiry. Does not consult the store.
    pub fn verify_access(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.signer.verify(access_token)
    }

    /// Revoke every refresh credential of `subject`. Absent is not an error.
    pub async fn revoke_all_for(&self, subject: &str) -> Result<usize, AuthError> {
        self.store.delete_refresh_for(subject).await.map_err(AuthError::Persistence)
    }

    /// Revoke a single refresh credential. Returns the revoked record, if any.
    pub async fn revoke_one(&self, refresh_token: &str) -> Result<Option<RefreshRecord>, AuthError> {
        self.store.take_refresh(refresh_token).await.map_err(AuthError::Persistence)
    }

    /// Start a session for an identity verified by the external login flow.
    pub async fn login(
        &self,
        identity: &Identity,
        meta: &ClientMeta,
    ) -> Result<TokenPair, AuthError> {
        let now = epoch_secs();
        let session = SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            subject: identity.subject.clone(),
            created_at: now,
            expires_at: now.saturating_add(self.refresh_ttl.as_secs()),
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
        };
        let session_id = session.id.clone();
        self.store.insert_session(session).await.map_err(AuthError::Persistence)?;

        let pair = self.issue_for(identity, Some(session_id.clone())).await?;
        tracing::info!(subject = %identity.subject, role = %identity.role, "login");

        self.audit(AuditRecord {
            actor: identity.subject.clone(),
            action: "login".to_owned(),
            target: session_id,
            detail: format!("role={}", identity.role),
            source: meta.ip.clone(),
            at: now,
        })
        .await;
        Ok(pair)
    }

    /// End the caller's session.
    ///
    /// With a refresh credential, only that credential and its session go.
    /// Without one, every credential and session of the subject is revoked.
    pub async fn logout(
        &self,
        claims: &AccessClaims,
        refresh_token: Option<&str>,
        meta: &ClientMeta,
    ) -> Result<(), AuthError> {
        let detail = match refresh_token {
            Some(token) => {
                // A credential belonging to someone else is never removed.
                let revoked = self
                    .store
                    .take_refresh_owned(token, &claims.sub)
                    .await
                    .map_err(AuthError::Persistence)?;
                match revoked {
                    Some(record) => {
                        if let Some(ref session_id) = record.session_id {
                            self.store
                                .delete_session(session_id)
                                .await
                                .map_err(AuthError::Persistence)?;
                        }
                        "single".to_owned()
                    }
                    None => "not revoked (absent or foreign)".to_owned(),
                }
            }
            None => {
                let count = self.revoke_all_for(&claims.sub).await?;
                self.store
                    .delete_sessions_for(&claims.sub)
                    .await
                    .map_err(AuthError::Persistence)?;
                format!("all ({count})")
            }
        };
        tracing::info!(subject = %claims.sub, detail = %detail, "logout");

        self.audit(AuditRecord {
            actor: claims.sub.clone(),
            action: "logout".to_owned(),
            target: claims.eid.clone(),
            detail,
            source: meta.ip.clone(),
            at: epoch_secs(),
        })
        .await;
        Ok(())
    }

    /// Remove expired refresh credentials and sessions.
    pub async fn sweep_expired(&self) -> Result<SweepOutcome, AuthError> {
        self.store.sweep_expired(epoch_secs()).await.map_err(AuthError::Persistence)
    }

    /// Best-effort audit append; failures are logged, never propagated.
    async fn audit(&self, record: AuditRecord) {
        let action = record.action.clone();
        if let Err(e) = self.store.append_audit(record).await {
            tracing::warn!(action = %action, err = %e, "audit write failed");
        }
    }
}

/// Build a signer from a configured secret, or a random one.
pub fn signer_from_secret(secret: Option<&str>) -> AccessSigner {
    match secret {
        Some(s) if !s.is_empty() => AccessSigner::new(s.as_bytes()),
        _ => {
            tracing::warn!("no token secret configured; access tokens will not survive a restart");
            AccessSigner::random()
        }
    }
}

#[cfg(test)]
#[path = "authority_tests.rs"]
mod tests;
