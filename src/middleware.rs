//! Middlewares for routes.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::ratelimiter::Decision;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const UNKNOWN_CLIENT: &str = "unknown";
const BEARER: &str = "bearer ";

/// Identify the client sending `req`.
///
/// Forwarded headers are only read when `trust_forwarded` is set, since any
/// client can write them.
pub fn client_id(req: &Request, trust_forwarded: bool) -> String {
    if trust_forwarded {
        if let Some(ip) = forwarded_ip(req.headers()) {
            return ip;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(',').next().unwrap_or_default().trim())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    header(X_FORWARDED_FOR).or_else(|| header(X_REAL_IP))
}

/// Whole seconds to wait, never less than one.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

/// Reject clients exceeding their request budget.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let client = client_id(&req, state.config.rate_limit.trust_forwarded_headers);

    match state.limiter.check(&client) {
        Decision::Allowed => Ok(next.run(req).await),
        Decision::Rejected { retry_after } => {
            metrics::counter!(crate::telemetry::RATE_LIMITED).increment(1);
            tracing::warn!(client_id = %client, ?retry_after, "rate limit exceeded");

            Err(ServerError::TooManyRequests {
                retry_after: retry_after_secs(retry_after),
            })
        },
    }
}

/// Check `Authorization: Bearer <token>` and expose claims to handlers.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(ServerError::Unauthorized("Authorization header is required"))?
        .to_str()
        .map_err(|_| ServerError::Unauthorized("Invalid authorization header format"))?;

    let token = value
        .get(..BEARER.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(BEARER))
        .map(|_| value[BEARER.len()..].trim())
        .filter(|token| !token.is_empty())
        .ok_or(ServerError::Unauthorized("Invalid authorization header format"))?;

    let claims = state.auth.tokens().decode(token).map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        ServerError::Unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
