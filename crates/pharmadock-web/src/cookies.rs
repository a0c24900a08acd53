//! Session and CSRF cookies.
//!
//! Every page response issues a `csrftoken` cookie; state-changing requests
//! must echo it in the `X-CSRFToken` header (double-submit). The
//! `sessionid` cookie keys the user's conversation.

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const SESSION_COOKIE: &str = "sessionid";
pub const CSRF_HEADER: &str = "x-csrftoken";

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn cookie(name: &'static str, value: String, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(http_only)
        .build()
}

fn present<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(|c| c.value()).filter(|v| !v.is_empty())
}

/// Add whichever of the CSRF and session cookies the client lacks.
pub fn ensure_cookies(jar: CookieJar) -> CookieJar {
    let jar = match present(&jar, CSRF_COOKIE) {
        Some(_) => jar,
        None => jar.add(cookie(CSRF_COOKIE, new_token(), false)),
    };
    ensure_session(jar).0
}

/// The session id, minting one (and its cookie) when absent.
pub fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(id) = present(&jar, SESSION_COOKIE) {
        let id = id.to_string();
        return (jar, id);
    }
    let id = Uuid::new_v4().to_string();
    (jar.add(cookie(SESSION_COOKIE, id.clone(), true)), id)
}

pub fn session_id(jar: &CookieJar) -> Option<String> {
    present(jar, SESSION_COOKIE).map(str::to_string)
}

/// Reject POSTs whose `X-CSRFToken` header does not match the cookie.
pub async fn csrf_protect(jar: CookieJar, request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        let header = request.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        let valid = matches!((header, present(&jar, CSRF_COOKIE)), (Some(h), Some(c)) if h == c);
        if !valid {
            warn!(path = %request.uri().path(), "CSRF verification failed");
            return (StatusCode::FORBIDDEN, "CSRF verification failed").into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_cookies_issues_both() {
        let jar = ensure_cookies(CookieJar::new());
        assert!(jar.get(CSRF_COOKIE).is_some());
        let session = jar.get(SESSION_COOKIE).unwrap();
        assert!(Uuid::parse_str(session.value()).is_ok());
        assert_eq!(session.http_only(), Some(true));
    }

    #[test]
    fn test_existing_cookies_are_kept() {
        let jar = CookieJar::new()
            .add(Cookie::new(CSRF_COOKIE, "tok"))
            .add(Cookie::new(SESSION_COOKIE, "abc"));
        let jar = ensure_cookies(jar);
        assert_eq!(jar.get(CSRF_COOKIE).unwrap().value(), "tok");
        assert_eq!(session_id(&jar).as_deref(), Some("abc"));
    }

    #[test]
    fn test_ensure_session_mints_once() {
        let (jar, first) = ensure_session(CookieJar::new());
        let (_, second) = ensure_session(jar);
        assert_eq!(first, second);
    }
}
