use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{effective_roles, AuthError, AuthSettings, Role};

/// The prefix used for bearer tokens in authorization headers.
pub const BEARER_PREFIX: &str = "Bearer";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the authenticated user.
    pub sub: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Whether any held role satisfies `required`.
    pub fn has_role(&self, required: Role) -> bool {
        self.roles.iter().any(|role| role.grants(required))
    }
}

/// HS256 token issuer and validator.
pub struct JwtAuthenticator {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    ttl_secs: i64,
}

impl Clone for JwtAuthenticator {
    fn clone(&self) -> Self {
        Self {
            encoding_key: Arc::clone(&self.encoding_key),
            decoding_key: Arc::clone(&self.decoding_key),
            validation: Arc::clone(&self.validation),
            ttl_secs: self.ttl_secs,
        }
    }
}

impl Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl JwtAuthenticator {
    /// Creates an authenticator that validates token expiration.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_ref())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_ref())),
            validation: Arc::new({
                let mut validation = Validation::new(Algorithm::HS256);
                validation.validate_exp = true;
                validation.leeway = 0;
                validation
            }),
            ttl_secs,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl_secs)
    }

    /// Issue a signed token for `subject` holding `roles`.
    pub fn issue(&self, subject: &str, roles: &[Role]) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            roles: effective_roles(roles),
            iat: now,
            exp: now + self.ttl_secs,
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|err| AuthError::Issue(err.to_string()))
    }

    /// Validate a raw token and return its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))
    }

    /// Validate an `Authorization` header value of the form `Bearer <token>`.
    pub fn authenticate_bearer(&self, bearer: &str) -> Result<Claims, AuthError> {
        let (scheme, token) = bearer
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;
        if scheme != BEARER_PREFIX || token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }
        self.authenticate(token.trim())
    }
}
