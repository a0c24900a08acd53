//! CSRF token lookup in a `Cookie` header string.

pub const CSRF_COOKIE: &str = "csrftoken";

/// Value of the `csrftoken` entry of `name=value; name=value` cookie text.
pub fn read_csrf_token(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_token_among_other_cookies() {
        assert_eq!(read_csrf_token("foo=bar; csrftoken=xyz; baz=qux").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_absent_token() {
        assert_eq!(read_csrf_token("foo=bar; baz=qux"), None);
        assert_eq!(read_csrf_token(""), None);
        assert_eq!(read_csrf_token("xcsrftoken=nope"), None);
    }

    #[test]
    fn test_first_entry_and_values_with_equals() {
        assert_eq!(read_csrf_token("csrftoken=a=b").as_deref(), Some("a=b"));
    }
}
