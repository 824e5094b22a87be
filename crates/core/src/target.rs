use crate::types::{PathPrefix, Token};

/// A request URI split into the prefix it was addressed to and the token it
/// carries: `<prefix>/<token>[?query]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub prefix: PathPrefix,
    pub token: Token,
}

impl RequestTarget {
    /// Parse a raw request path (optionally with a query string).
    ///
    /// The query is dropped first, then the path is split on its last `/`.
    /// Returns `None` when that slash is the leading one (or there is none),
    /// i.e. when the prefix would be empty.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let path = uri.split_once('?').map_or(uri, |(path, _)| path);
        let split = path.rfind('/')?;
        if split == 0 {
            return None;
        }
        Some(Self {
            prefix: PathPrefix::new(&path[..split]),
            token: Token::new(&path[split + 1..]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &str) -> Option<(String, String)> {
        RequestTarget::parse(uri).map(|t| (t.prefix.to_string(), t.token.to_string()))
    }

    #[test]
    fn splits_on_last_slash() {
        assert_eq!(
            parts("/download/abc123"),
            Some(("/download".into(), "abc123".into()))
        );
        assert_eq!(
            parts("/assets/e-books/630a184616ba0"),
            Some(("/assets/e-books".into(), "630a184616ba0".into()))
        );
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(
            parts("/download/abc123?utm_source=mail"),
            Some(("/download".into(), "abc123".into()))
        );
        assert_eq!(
            parts("/download/abc123?next=/other/place"),
            Some(("/download".into(), "abc123".into()))
        );
    }

    #[test]
    fn trailing_slash_yields_empty_token() {
        assert_eq!(parts("/download/"), Some(("/download".into(), String::new())));
    }

    #[test]
    fn root_level_paths_do_not_engage() {
        assert_eq!(parts("/"), None);
        assert_eq!(parts("/abc123"), None);
        assert_eq!(parts("abc123"), None);
        assert_eq!(parts(""), None);
        assert_eq!(parts("/?x=/y/z"), None);
    }

    #[test]
    fn unrelated_paths_still_parse() {
        assert_eq!(parts("/about/page"), Some(("/about".into(), "page".into())));
    }
}
