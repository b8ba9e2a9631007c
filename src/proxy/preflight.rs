//! `OPTIONS` handling. Never contacts the upstream target.

use axum::http::{header, HeaderMap, StatusCode};

use crate::proxy::cors::CorsPolicy;
use crate::proxy::response::{ProxyBody, ProxyResponse};

/// Whether the headers describe a CORS preflight rather than a bare probe.
pub fn is_cors_preflight(headers: &HeaderMap) -> bool {
    headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_HEADERS)
}

/// Answer an inbound `OPTIONS` request.
///
/// A full preflight gets `204 No Content` with the CORS policy. A bare probe
/// gets `200 OK` with `Allow`; CORS headers are included there as well.
pub fn respond(headers: &HeaderMap, cors: &CorsPolicy) -> ProxyResponse {
    let mut out = HeaderMap::new();
    cors.apply(&mut out);

    let status = if is_cors_preflight(headers) {
        StatusCode::NO_CONTENT
    } else {
        out.insert(header::ALLOW, cors.allow_methods().clone());
        StatusCode::OK
    };

    ProxyResponse {
        status,
        headers: out,
        body: ProxyBody::Empty,
    }
}
