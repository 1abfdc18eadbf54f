/// Token cookie handling
///
/// Tokens travel two ways: the JSON body (for API clients holding them in
/// memory) and http-only cookies (for the browser frontend). Cookies are
/// `HttpOnly` and `SameSite=Lax`; the `Secure` attribute is added in
/// production. Lifetimes mirror the token expiries: 1 hour for access,
/// 7 days for refresh.

use axum::http::HeaderMap;

/// Name of the access-token cookie
pub const ACCESS_COOKIE: &str = "access_token";

/// Name of the refresh-token cookie
pub const REFRESH_COOKIE: &str = "refresh_token";

const ACCESS_MAX_AGE_SECS: i64 = 3600;
const REFRESH_MAX_AGE_SECS: i64 = 604_800;

fn build(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value carrying the access token
pub fn access_cookie(token: &str, secure: bool) -> String {
    build(ACCESS_COOKIE, token, ACCESS_MAX_AGE_SECS, secure)
}

/// Set-Cookie value carrying the refresh token
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    build(REFRESH_COOKIE, token, REFRESH_MAX_AGE_SECS, secure)
}

/// Set-Cookie value that expires a cookie immediately (logout)
pub fn clear_cookie(name: &str, secure: bool) -> String {
    build(name, "", 0, secure)
}

/// Extracts a named cookie's value from the request headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    header.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = access_cookie("tok", false);
        assert!(cookie.starts_with("access_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_production_adds_secure() {
        assert!(access_cookie("tok", true).ends_with("; Secure"));
        assert!(refresh_cookie("tok", true).ends_with("; Secure"));
    }

    #[test]
    fn test_refresh_cookie_lives_seven_days() {
        assert!(refresh_cookie("tok", false).contains("Max-Age=604800"));
    }

    #[test]
    fn test_clear_cookie_expires_now() {
        let cookie = clear_cookie(ACCESS_COOKIE, false);
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_parses_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "refresh_token=abc; access_token=xyz; theme=dark".parse().unwrap(),
        );

        assert_eq!(cookie_value(&headers, ACCESS_COOKIE), Some("xyz"));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), Some("abc"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_without_header() {
        let headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE), None);
    }
}
