use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::keys::JwtKeyMaterial;
use crate::types::{AuthError, Claims, ResetClaims, User};

/// Default `iss` claim of issued tokens.
pub const DEFAULT_ISSUER: &str = "retail-tractors-users-service";
/// Default `aud` claim of issued tokens.
pub const DEFAULT_AUDIENCE: &str = "retail-tractors-users";

/// Token lifetimes and identities
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Value of the `iss` claim
    pub issuer: String,
    /// Value of the `aud` claim
    pub audience: String,
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of password reset tokens
    pub reset_ttl: Duration,
    /// HMAC secret for password reset tokens
    pub reset_secret: String,
}

impl JwtSettings {
    /// Settings with the default issuer, audience and lifetimes (1 hour, 15 minutes).
    pub fn new(reset_secret: impl Into<String>) -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_ttl: Duration::hours(1),
            reset_ttl: Duration::minutes(15),
            reset_secret: reset_secret.into(),
        }
    }
}

/// Issues RS256 access tokens and HS256 password reset tokens.
#[derive(Clone)]
pub struct JwtService {
    keys: Arc<JwtKeyMaterial>,
    reset_encoding_key: EncodingKey,
    reset_decoding_key: DecodingKey,
    settings: JwtSettings,
}

impl JwtService {
    /// Creates the service from loaded key material and settings.
    pub fn new(keys: JwtKeyMaterial, settings: JwtSettings) -> Self {
        Self {
            keys: Arc::new(keys),
            reset_encoding_key: EncodingKey::from_secret(settings.reset_secret.as_bytes()),
            reset_decoding_key: DecodingKey::from_secret(settings.reset_secret.as_bytes()),
            settings,
        }
    }

    /// Key material backing the access tokens.
    pub fn keys(&self) -> &JwtKeyMaterial {
        &self.keys
    }

    /// Lifetime of password reset tokens.
    pub fn reset_ttl(&self) -> Duration {
        self.settings.reset_ttl
    }

    /// Signs an access token for `user`, with the key id in the header.
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.settings.access_ttl).timestamp() as usize,
            aud: self.settings.audience.clone(),
            iss: self.settings.issuer.clone(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.keys.kid().to_string());

        let token = encode(&header, &claims, self.keys.encoding_key())?;
        Ok(token)
    }

    /// Verifies signature, expiry, audience and issuer of an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = self.validation(Algorithm::RS256);

        decode::<Claims>(token, self.keys.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Signs a password reset token for `user` and returns it with its expiry.
    pub fn generate_reset_token(&self, user: &User) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + self.settings.reset_ttl;

        let claims = ResetClaims {
            id: user.id,
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            aud: self.settings.audience.clone(),
            iss: self.settings.issuer.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.reset_encoding_key,
        )?;
        Ok((token, expires_at))
    }

    /// Decodes a reset token signed with the reset secret.
    pub fn verify_reset_token(&self, token: &str) -> Result<ResetClaims, AuthError> {
        let validation = self.validation(Algorithm::HS256);

        decode::<ResetClaims>(token, &self.reset_decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidResetToken)
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[&self.settings.audience]);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.leeway = 0;
        validation
    }
}
