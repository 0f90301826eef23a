//! Go identifiers for graph names
//!
//! Node and channel names are free text. They are mapped to Go identifiers
//! with an injective escaping: ASCII letters and digits are kept, `_` becomes
//! `__` and every other byte becomes `_xHH`. A mangled name therefore never
//! contains a `_` followed by anything other than `_` or `x`, which leaves
//! suffixes such as `_w0` free for derived identifiers.

/// Escape `name` into identifier characters
pub fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => out.push(b as char),
            b'_' => out.push_str("__"),
            other => out.push_str(&format!("_x{:02X}", other)),
        }
    }
    out
}

/// Go function name for a node
pub fn node_ident(name: &str) -> String {
    format!("node_{}", mangle(name))
}

/// Go variable name for a channel
pub fn channel_ident(name: &str) -> String {
    format!("chan_{}", mangle(name))
}

/// Go variable name for the private channel of one writer on a fan-in channel
pub fn writer_ident(channel: &str, writer: usize) -> String {
    format!("{}_w{}", channel_ident(channel), writer)
}

/// Go package name derived from the last segment of an import path
pub fn package_name(package_path: &str) -> String {
    let last = package_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let mut name: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "pipeline");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("A", "A")]
    #[case("my node", "my_x20node")]
    #[case("a_b", "a__b")]
    #[case("a-b", "a_x2Db")]
    #[case("é", "_xC3_xA9")]
    fn test_mangle(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(mangle(input), expected);
    }

    #[test]
    fn test_mangle_is_injective_on_tricky_names() {
        let names = ["a_b", "a b", "a__b", "a_x20b", "a-b", "a_", "a", "_a"];
        let mangled: HashSet<_> = names.iter().map(|n| mangle(n)).collect();
        assert_eq!(mangled.len(), names.len());
    }

    #[test]
    fn test_writer_idents_do_not_collide_with_channels() {
        assert_eq!(writer_ident("c", 0), "chan_c_w0");
        assert_ne!(writer_ident("c", 0), channel_ident("c_w0"));
        assert_eq!(channel_ident("c_w0"), "chan_c__w0");
    }

    #[rstest]
    #[case("example.com/pipes/demo", "demo")]
    #[case("example.com/my-pipeline/", "my_pipeline")]
    #[case("Demo", "demo")]
    #[case("", "pipeline")]
    #[case("example.com/2fa", "pipeline2fa")]
    fn test_package_name(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(package_name(path), expected);
    }
}
