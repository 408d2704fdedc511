//! Rule compiler: turns one raw blocklist line into a normalized host.
//!
//! Recognized line forms and the normalization steps are the ones in the
//! component design for the Rule Compiler: comments, exceptions and
//! cosmetic rules are discarded outright; everything else is reduced to a
//! bare lowercase host name by stripping a scheme, a `||` anchor, any
//! trailing path/anchor/option text, a leading dot, a port, and wildcards.

/// True for `!` or `#` prefixed comment lines.
pub fn is_comment(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('#')
}

/// True for `@@`-prefixed exception lines (no allowlist semantics here).
pub fn is_exception(line: &str) -> bool {
    line.starts_with("@@")
}

/// True for lines carrying a cosmetic (element-hiding) rule.
pub fn is_cosmetic(line: &str) -> bool {
    line.contains("##")
}

/// Reduce a single blocklist line to a normalized host, or `None` if the
/// line is a comment/exception/cosmetic rule or normalizes to nothing
/// usable (empty, or missing a `.` label separator).
pub fn normalize_host(line: &str) -> Option<String> {
    if line.trim().is_empty() || is_comment(line) || is_exception(line) || is_cosmetic(line) {
        return None;
    }

    let mut s = line.to_ascii_lowercase();

    if let Some(idx) = s.find("://") {
        s = s[idx + 3..].to_string();
    }

    if let Some(stripped) = s.strip_prefix("||") {
        s = stripped.to_string();
    }

    if let Some(idx) = s.find(['/', '^', '$']) {
        s.truncate(idx);
    }

    if let Some(stripped) = s.strip_prefix('.') {
        s = stripped.to_string();
    }

    if let Some(idx) = s.find(':') {
        s.truncate(idx);
    }

    s.retain(|c| c != '*');

    if s.is_empty() || s.len() > 253 || !s.contains('.') {
        return None;
    }

    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discards_comments_exceptions_and_cosmetics() {
        assert_eq!(normalize_host("! a comment"), None);
        assert_eq!(normalize_host("# also a comment"), None);
        assert_eq!(normalize_host("@@||example.com^"), None);
        assert_eq!(normalize_host("example.com##.ad-banner"), None);
        assert_eq!(normalize_host(""), None);
    }

    #[test]
    fn network_anchor_yields_host() {
        assert_eq!(normalize_host("||ads.example.com^"), Some("ads.example.com".into()));
    }

    #[test]
    fn url_yields_host() {
        assert_eq!(
            normalize_host("https://Tracker.IO:8443/collect?x=1"),
            Some("tracker.io".into())
        );
    }

    #[test]
    fn bare_host_yields_host() {
        assert_eq!(normalize_host("ads.example.com"), Some("ads.example.com".into()));
    }

    #[test]
    fn strips_leading_dot_and_wildcards() {
        assert_eq!(normalize_host(".*ads.example.com"), Some("ads.example.com".into()));
    }

    #[test]
    fn bare_host_without_dot_is_rejected() {
        assert_eq!(normalize_host("localhost"), None);
    }

    #[test]
    fn host_over_253_octets_is_rejected() {
        let label = "a".repeat(60);
        let long_host = format!("{label}.{label}.{label}.{label}.com");
        assert!(long_host.len() > 253);
        assert_eq!(normalize_host(&long_host), None);
    }
}
