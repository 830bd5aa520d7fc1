//! JWT token generation and validation
//! Implements access token + refresh token pattern; tokens carry only the
//! admin id as subject claim.

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (admin ID)
    pub sub: String,

    /// Token type (access or refresh)
    pub token_type: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// Token pair response
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // seconds until access token expires
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // HS256 密钥至少 32 字节
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
            refresh_token_exp_secs: config.security.refresh_token_exp_secs,
        })
    }

    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    pub fn refresh_token_exp_secs(&self) -> u64 {
        self.refresh_token_exp_secs
    }

    fn generate_token(&self, admin_id: &Uuid, token_type: &str, exp_secs: u64) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(exp_secs as i64);

        let claims = Claims {
            sub: admin_id.to_string(),
            token_type: token_type.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode {} token: {:?}", token_type, e);
            AppError::Internal(format!("Failed to encode {} token: {}", token_type, e))
        })
    }

    /// Generate access token
    pub fn generate_access_token(&self, admin_id: &Uuid) -> Result<String, AppError> {
        self.generate_token(admin_id, "access", self.access_token_exp_secs)
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, admin_id: &Uuid) -> Result<String, AppError> {
        self.generate_token(admin_id, "refresh", self.refresh_token_exp_secs)
    }

    /// Generate token pair
    pub fn generate_token_pair(&self, admin_id: &Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(admin_id)?,
            refresh_token: self.generate_refresh_token(admin_id)?,
            expires_in: self.access_token_exp_secs,
        })
    }

    /// Validate and decode token.
    /// Expiry is reported distinctly so clients know to refresh instead of
    /// re-authenticating.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    tracing::debug!("Token validation failed: {:?}", e);
                    AppError::unauthorized("Invalid token.")
                }
            })?
            .claims)
    }

    /// Validate access token specifically, returning the admin id
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "access" {
            tracing::debug!("Token type mismatch: expected 'access', got '{}'", claims.token_type);
            return Err(AppError::unauthorized("Invalid token."));
        }

        Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized("Invalid token."))
    }

    /// Validate refresh token specifically, returning the admin id
    pub fn validate_refresh_token(&self, token: &str) -> Result<Uuid, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "refresh" {
            tracing::debug!("Token type mismatch: expected 'refresh', got '{}'", claims.token_type);
            return Err(AppError::unauthorized("Invalid token."));
        }

        Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized("Invalid token."))
    }
}
