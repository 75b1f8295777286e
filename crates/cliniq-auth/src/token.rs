//! Session token minting, validation, refresh, and revocation.
//!
//! Tokens are self-contained HMAC-SHA-256 JWTs; no session state is
//! persisted. Logout is advisory for stateless tokens, so the service
//! keeps a short-lived in-memory denylist of revoked `jti`s that the
//! periodic sweep prunes once the tokens would have expired anyway.

use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cliniq_core::models::principal::Principal;
use cliniq_core::models::role::Role;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Minimum signing-key length in bytes.
const MIN_KEY_LEN: usize = 32;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — principal ID (UUID string).
    pub sub: String,
    /// Role tag at mint time.
    pub role: String,
    /// Clinic ID at mint time. Informational: the access guard
    /// re-resolves the tenant from the identity store on each request.
    pub cid: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID; revocation denylists it.
    pub jti: String,
}

impl SessionClaims {
    pub fn principal_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenMalformed)
    }

    pub fn role_tag(&self) -> Result<Role, AuthError> {
        Role::parse(&self.role).ok_or(AuthError::TokenMalformed)
    }

    pub fn clinic_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.cid).map_err(|_| AuthError::TokenMalformed)
    }
}

/// Stateless session token service.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
    refresh_window_secs: u64,
    issuer: String,
    /// jti → exp of revoked tokens.
    revoked: DashMap<String, i64>,
}

impl TokenService {
    /// Fails when the signing key is shorter than 32 bytes — a short
    /// key is a deployment error, caught at startup.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.signing_key.len() < MIN_KEY_LEN {
            return Err(AuthError::Crypto(format!(
                "signing key must be at least {MIN_KEY_LEN} bytes, got {}",
                config.signing_key.len()
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(&config.signing_key),
            decoding: DecodingKey::from_secret(&config.signing_key),
            ttl_secs: config.token_ttl_secs,
            refresh_window_secs: config.refresh_window_secs,
            issuer: config.issuer.clone(),
            revoked: DashMap::new(),
        })
    }

    /// Issue a signed token for a principal. The clinic claim equals
    /// the principal's clinic id at mint time.
    pub fn mint(&self, principal: &Principal) -> Result<String, AuthError> {
        self.mint_claims(
            principal.id(),
            principal.role(),
            principal.clinic_id(),
        )
    }

    fn mint_claims(&self, sub: Uuid, role: Role, cid: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: sub.to_string(),
            role: role.as_str().to_string(),
            cid: cid.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs as i64,
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        jsonwebtoken::encode(&header, &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
    }

    /// Verify signature, expiry, issuer, and the revocation denylist.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let claims = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            })?;

        if self.revoked.contains_key(&claims.jti) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    /// Re-mint a token that is inside the final refresh window of its
    /// life. The old token's jti is revoked so each token refreshes at
    /// most once.
    pub fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.validate(token)?;

        let remaining = claims.exp - Utc::now().timestamp();
        if remaining > self.refresh_window_secs as i64 {
            return Err(AuthError::RefreshDenied);
        }

        let sub = claims.principal_id()?;
        let role = claims.role_tag()?;
        let cid = claims.clinic_id()?;

        self.revoke(&claims);
        self.mint_claims(sub, role, cid)
    }

    /// Denylist a token's jti until its natural expiry.
    pub fn revoke(&self, claims: &SessionClaims) {
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    /// Drop denylist entries whose tokens have expired on their own.
    pub fn prune_revoked(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }
}
