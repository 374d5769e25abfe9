//! Error taxonomy for BoxCast API access

use serde_json::Value;
use thiserror::Error;

/// Errors that occurred accessing BoxCast API resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoxCastError {
    /// The request could not be understood due to malformed syntax.
    #[error("bad request")]
    BadRequest,
    /// The request requires user authentication.
    #[error("unauthorized")]
    Unauthorized,
    /// The access token is expired, revoked, malformed or otherwise invalid.
    #[error("invalid token")]
    InvalidToken,
    #[error("payment required")]
    PaymentRequired,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    /// The request conflicts with the current state of the resource.
    #[error("conflict")]
    Conflict,
    /// The resource is no longer available.
    #[error("gone")]
    Gone,
    #[error("unprocessable entity")]
    UnprocessableEntity,
    #[error("too many requests")]
    TooManyRequests,
    #[error("internal server error")]
    InternalServerError,
    #[error("not implemented")]
    NotImplemented,
    /// An upstream server returned an invalid response to the gateway.
    #[error("bad gateway")]
    BadGateway,
    #[error("service unavailable")]
    ServiceUnavailable,
    /// An upstream server did not respond to the gateway in time.
    #[error("gateway timeout")]
    GatewayTimeout,
    /// The request is missing a required parameter or is otherwise malformed.
    #[error("invalid request")]
    InvalidRequest,
    /// Client authentication failed.
    #[error("invalid client")]
    InvalidClient,
    /// The authorization grant is invalid, expired or revoked.
    #[error("invalid grant")]
    InvalidGrant,
    #[error("unauthorized client")]
    UnauthorizedClient,
    #[error("unsupported grant type")]
    UnsupportedGrantType,
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    /// A request or response body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid URL")]
    InvalidUrl,
    #[error("unknown error")]
    Unknown,
}

impl BoxCastError {
    /// Map a server error code to its typed error. Unrecognized codes map to `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "bad_request" => BoxCastError::BadRequest,
            "unauthorized" => BoxCastError::Unauthorized,
            "invalid_token" => BoxCastError::InvalidToken,
            "payment_required" => BoxCastError::PaymentRequired,
            "forbidden" => BoxCastError::Forbidden,
            "not_found" => BoxCastError::NotFound,
            "conflict" => BoxCastError::Conflict,
            "gone" => BoxCastError::Gone,
            "unprocessable_entity" => BoxCastError::UnprocessableEntity,
            "too_many_requests" => BoxCastError::TooManyRequests,
            "internal_server_error" => BoxCastError::InternalServerError,
            "not_implemented" => BoxCastError::NotImplemented,
            "bad_gateway" => BoxCastError::BadGateway,
            "service_unavailable" => BoxCastError::ServiceUnavailable,
            "gateway_timeout" => BoxCastError::GatewayTimeout,
            "invalid_request" => BoxCastError::InvalidRequest,
            "invalid_client" => BoxCastError::InvalidClient,
            "invalid_grant" => BoxCastError::InvalidGrant,
            "unauthorized_client" => BoxCastError::UnauthorizedClient,
            "unsupported_grant_type" => BoxCastError::UnsupportedGrantType,
            _ => BoxCastError::Unknown,
        }
    }

    /// Decode a `{"error": "<code>"}` response body.
    pub fn from_response_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(json) => json
                .get("error")
                .and_then(Value::as_str)
                .map(Self::from_code)
                .unwrap_or(BoxCastError::Unknown),
            Err(_) => BoxCastError::Unknown,
        }
    }
}

impl From<serde_json::Error> for BoxCastError {
    fn from(e: serde_json::Error) -> Self {
        BoxCastError::Serialization(e.to_string())
    }
}
