#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcd1234efgh5678"), "abcd...5678");
        assert_eq!(mask_token("short"), "****");
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer tok_456"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok_456"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_static("theme=dark; session_token=cookie_tok"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("cookie_tok"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer header_tok"));
        headers.insert("Cookie", HeaderValue::from_static("session_token=cookie_tok"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("header_tok"));
    }

    #[test]
    fn test_missing_or_blank_token() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("Cookie", HeaderValue::from_static("session_token="));
        assert!(extract_session_token(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn test_protected_pages() {
        assert!(is_protected_page("/dashboard"));
        assert!(is_protected_page("/portfolio/123"));
        assert!(is_protected_page("/settings/profile"));
        assert!(!is_protected_page("/dashboards"));
        assert!(!is_protected_page("/api/portfolio"));
        assert!(!is_protected_page("/articles"));
    }

    #[test]
    fn test_signin_redirect_encodes_callback() {
        assert_eq!(signin_redirect("/watchlist"), "/auth/signin?callbackUrl=%2Fwatchlist");
        assert_eq!(
            signin_redirect("/portfolio/a&b=1%20"),
            "/auth/signin?callbackUrl=%2Fportfolio%2Fa%26b%3D1%2520"
        );
    }
}
