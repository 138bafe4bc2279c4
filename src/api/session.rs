//! Cookie-backed session identification

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};

use crate::session::SessionId;

/// Name of the cookie carrying the session identifier
pub const SESSION_COOKIE: &str = "minssem_session";

/// Find a well-formed session identifier in the `Cookie` headers
fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}

/// `Set-Cookie` value for a freshly issued session
fn session_cookie(id: &SessionId) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

/// Middleware attaching a [`SessionId`] to every request
///
/// Requests without a valid cookie get a new identifier, returned to the
/// browser on the response.
pub async fn session_middleware(mut req: Request, next: Next) -> Response {
    let (id, fresh) = match session_from_headers(req.headers()) {
        Some(id) => (id, false),
        None => (SessionId::generate(), true),
    };

    req.extensions_mut().insert(id.clone());
    let mut response = next.run(req).await;

    if fresh {
        tracing::debug!(session = %id, "issued new session");
        if let Some(cookie) = session_cookie(&id) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_headers() {
        let id = SessionId::generate();
        let mut headers = HeaderMap::new();

        // No header
        assert_eq!(session_from_headers(&headers), None);

        // Among other cookies
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=ko")).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(id));
    }

    #[test]
    fn malformed_session_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("minssem_session=../../etc/passwd"),
        );
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let id = SessionId::generate();
        let cookie = session_cookie(&id).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}={id};")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
