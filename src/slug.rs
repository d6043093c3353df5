//! Helpers for dot-delimited slugs.

/// Separator between slug segments.
pub const SEPARATOR: char = '.';

/// Prefix marking a name relative to the current namespace.
pub const RELATIVE_MARKER: &str = "./";

/// Joins a namespace prefix and a local name, skipping empty parts.
pub fn join(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}{SEPARATOR}{name}"),
    }
}

/// Everything before the last segment, or `""` for a single-segment slug.
pub fn parent(slug: &str) -> &str {
    slug.rsplit_once(SEPARATOR).map_or("", |(parent, _)| parent)
}

/// Resolves a relative name against `namespace`; absolute names pass through.
pub fn qualify(namespace: &str, name: &str) -> String {
    match name.strip_prefix(RELATIVE_MARKER) {
        Some(local) => join(namespace, local),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        assert_eq!(join("", "moduleA"), "moduleA");
        assert_eq!(join("moduleA", "subModule"), "moduleA.subModule");
        assert_eq!(join("moduleA", ""), "moduleA");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("moduleA.subModule.a"), "moduleA.subModule");
        assert_eq!(parent("moduleA.a"), "moduleA");
        assert_eq!(parent("a"), "");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("moduleA", "./b"), "moduleA.b");
        assert_eq!(qualify("", "./b"), "b");
        assert_eq!(qualify("moduleA", "other.b"), "other.b");
    }
}
