//! LINE webhook signature middleware
//!
//! Rejects any request whose `X-Line-Signature` header is not the base64
//! HMAC-SHA256 of the raw body under the channel secret.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::error::AppError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Largest webhook body accepted for verification
const MAX_WEBHOOK_BODY: usize = 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing x-line-signature header")]
    MissingHeader,

    #[error("Signature is not valid base64")]
    Malformed,

    #[error("Invalid channel secret")]
    InvalidKey,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Compute the signature LINE sends for a body
#[cfg(test)]
pub(crate) fn sign(channel_secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Verify a LINE webhook signature in constant time
pub fn verify_line_signature(
    channel_secret: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    let expected = BASE64
        .decode(signature.trim())
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Middleware guarding the webhook route
pub async fn require_line_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let signature = match parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(signature) => signature.to_string(),
        None => {
            tracing::warn!(
                "LINE webhook signature verification failed: {}",
                SignatureError::MissingHeader
            );
            return AppError::InvalidSignature.into_response();
        }
    };

    let bytes = match to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::BadRequest(format!("Failed to read request body: {}", e))
                .into_response();
        }
    };

    if let Err(e) = verify_line_signature(&state.config.line.channel_secret, &bytes, &signature) {
        tracing::warn!("LINE webhook signature verification failed: {}", e);
        return AppError::InvalidSignature.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
