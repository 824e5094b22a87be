use dropgate_state::{KeyKind, StateKey};

/// Render a [`StateKey`] into a Redis key string with the given prefix.
///
/// The format is `prefix:kind:id`.
pub fn render_key(prefix: &str, key: &StateKey) -> String {
    format!("{}:{}:{}", prefix, key.kind, key.id)
}

/// The part of a rendered key that precedes the id for a given kind.
pub fn kind_prefix(prefix: &str, kind: &KeyKind) -> String {
    format!("{prefix}:{kind}:")
}

/// `SCAN MATCH` pattern selecting every key of a kind.
///
/// Glob metacharacters in the configured prefix are escaped so they match
/// literally.
pub fn scan_pattern(prefix: &str, kind: &KeyKind) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 16);
    for c in kind_prefix(prefix, kind).chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_token_key() {
        let key = StateKey::new(KeyKind::Token, "abc123");
        assert_eq!(render_key("dropgate", &key), "dropgate:token:abc123");
    }

    #[test]
    fn renders_path_key_with_slashes() {
        let key = StateKey::new(KeyKind::Path, "/assets/e-books");
        assert_eq!(render_key("dg", &key), "dg:path:/assets/e-books");
    }

    #[test]
    fn scan_pattern_escapes_prefix() {
        assert_eq!(scan_pattern("dropgate", &KeyKind::Token), "dropgate:token:*");
        assert_eq!(scan_pattern("a*b", &KeyKind::Path), "a\\*b:path:*");
    }

    #[test]
    fn id_is_recoverable_from_rendered_key() {
        let key = StateKey::new(KeyKind::Token, "with:colon");
        let rendered = render_key("p", &key);
        let id = rendered.strip_prefix(&kind_prefix("p", &KeyKind::Token));
        assert_eq!(id, Some("with:colon"));
    }
}
