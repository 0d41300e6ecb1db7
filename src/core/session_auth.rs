use actix_web::{dev::Payload, web, Error as ActixWebError};
use actix_web::{error::ErrorUnauthorized, http, FromRequest, HttpRequest};
use core::fmt;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::SessionAuthConfig;
use crate::core::AppError;

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

pub const ROLE_FACTORY: &str = "factory";
pub const ROLE_ENTREPRENEUR: &str = "entrepreneur";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String, // account email
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
}

impl SessionClaims {
    pub fn new(email: &str, role: &str, name: Option<&str>, ttl_seconds: i64) -> Self {
        let exp = (chrono::Utc::now() + chrono::Duration::seconds(ttl_seconds)).timestamp();
        SessionClaims {
            sub: email.to_string(),
            role: role.to_string(),
            name: name.map(|n| n.to_string()),
            exp: exp as usize,
        }
    }
}

pub fn generate_session_token(
    claims: &SessionClaims,
    secret: &Secret<String>,
) -> Result<String, AppError> {
    let header = Header::default();
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_ref());

    encode(&header, claims, &encoding_key)
        .map_err(|_| AppError::internal_error("Failed to generate session token"))
}

/// The resolved session identity. The factory owner's implicit full access to
/// its own submissions is decided downstream by comparing the factory email
/// against the submission's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Factory { email: String },
    Entrepreneur { email: String, name: Option<String> },
    Admin { email: String },
}

impl Identity {
    fn from_claims(claims: SessionClaims) -> Option<Identity> {
        match claims.role.as_str() {
            ROLE_FACTORY => Some(Identity::Factory { email: claims.sub }),
            ROLE_ENTREPRENEUR => Some(Identity::Entrepreneur {
                email: claims.sub,
                name: claims.name,
            }),
            ROLE_ADMIN => Some(Identity::Admin { email: claims.sub }),
            _ => None,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Factory { email } => email,
            Identity::Entrepreneur { email, .. } => email,
            Identity::Admin { email } => email,
        }
    }

    pub fn require_factory(&self) -> Result<&str, AppError> {
        match self {
            Identity::Factory { email } => Ok(email),
            _ => Err(AppError::forbidden_error(
                "A factory account is required for this operation",
            )),
        }
    }

    pub fn require_entrepreneur(&self) -> Result<(&str, Option<&str>), AppError> {
        match self {
            Identity::Entrepreneur { email, name } => Ok((email, name.as_deref())),
            _ => Err(AppError::forbidden_error(
                "An entrepreneur account is required for this operation",
            )),
        }
    }
}

fn decode_identity(req: &HttpRequest) -> Result<Identity, ActixWebError> {
    let auth_config = req
        .app_data::<web::Data<SessionAuthConfig>>()
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("Session configuration is missing")
        })?;

    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    let Some(token) = token else {
        let error = ErrorResponse {
            message: "No authentication token found".to_string(),
            success: false,
        };
        return Err(ErrorUnauthorized(error));
    };

    let claims = decode::<SessionClaims>(
        &token,
        &DecodingKey::from_secret(auth_config.secret.expose_secret().as_ref()),
        &Validation::default(),
    )
    .map_err(|_| {
        let error = ErrorResponse {
            message: "Invalid session token".to_string(),
            success: false,
        };
        ErrorUnauthorized(error)
    })?
    .claims;

    Identity::from_claims(claims).ok_or_else(|| {
        let error = ErrorResponse {
            message: "Unrecognized session role".to_string(),
            success: false,
        };
        ErrorUnauthorized(error)
    })
}

impl FromRequest for Identity {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(decode_identity(req))
    }
}

/// Optional-identity extractor for surfaces that are readable anonymously.
/// A missing or invalid token degrades to no identity instead of a 401.
#[derive(Debug)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequest for MaybeIdentity {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeIdentity(decode_identity(req).ok())))
    }
}
