//! Redirect URI matcher: pure function deciding whether a given redirect
//! URI is permitted by a provider's configured allow-list.

use regex::Regex;
use url::Url;

use super::model::{RedirectUriEntry, RedirectUriMatchMode, FORBIDDEN_URI_SCHEMES};

/// Result of matching a redirect_uri against a provider's allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    NoMatch,
    ForbiddenScheme,
}

/// `(uri, [(mode, pattern)]) -> bool`, anchored full-string regex match.
/// Malformed regex entries are skipped (logged by the caller), not fatal.
pub fn matches(uri: &str, allowed: &[RedirectUriEntry]) -> MatchOutcome {
    let mut matched = false;
    for entry in allowed {
        match entry.mode {
            RedirectUriMatchMode::Strict => {
                if uri == entry.pattern {
                    matched = true;
                    break;
                }
            }
            RedirectUriMatchMode::Regex => match anchored(&entry.pattern) {
                Ok(re) => {
                    if re.is_match(uri) {
                        matched = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(pattern = %entry.pattern, error = %e, "failed to parse redirect_uri regex entry");
                }
            },
        }
    }

    if !matched {
        return MatchOutcome::NoMatch;
    }

    if has_forbidden_scheme(uri) {
        return MatchOutcome::ForbiddenScheme;
    }

    MatchOutcome::Matched
}

/// Rust's `regex` crate `is_match` is unanchored; Python's `re.fullmatch`
/// requires the whole string to match, so wrap the pattern accordingly.
fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

fn has_forbidden_scheme(uri: &str) -> bool {
    match Url::parse(uri) {
        Ok(parsed) => FORBIDDEN_URI_SCHEMES.contains(&parsed.scheme()),
        // A scheme-only malformed URI (e.g. "javascript:alert(1)") may not
        // parse as a full URL; fall back to a manual scheme extraction.
        Err(_) => uri
            .split_once(':')
            .map(|(scheme, _)| FORBIDDEN_URI_SCHEMES.contains(&scheme))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_exact_match() {
        let allowed = vec![RedirectUriEntry::strict("https://rp.example/cb")];
        assert_eq!(
            matches("https://rp.example/cb", &allowed),
            MatchOutcome::Matched
        );
        assert_eq!(
            matches("https://rp.example/cb/", &allowed),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn regex_fullmatch_anchors_whole_string() {
        let allowed = vec![RedirectUriEntry::regex(r"https://.*\.rp\.example/cb")];
        assert_eq!(
            matches("https://us.rp.example/cb", &allowed),
            MatchOutcome::Matched
        );
        // fullmatch semantics: trailing garbage must not match
        assert_eq!(
            matches("https://us.rp.example/cb/extra", &allowed),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn forbidden_scheme_rejected_even_if_allow_listed() {
        let allowed = vec![RedirectUriEntry::strict("javascript:alert(1)")];
        assert_eq!(
            matches("javascript:alert(1)", &allowed),
            MatchOutcome::ForbiddenScheme
        );
    }

    #[test]
    fn malformed_regex_is_skipped_not_fatal() {
        let allowed = vec![
            RedirectUriEntry::regex("("), // invalid regex
            RedirectUriEntry::strict("https://rp.example/cb"),
        ];
        assert_eq!(
            matches("https://rp.example/cb", &allowed),
            MatchOutcome::Matched
        );
    }

    #[test]
    fn no_entries_never_matches() {
        assert_eq!(matches("https://rp.example/cb", &[]), MatchOutcome::NoMatch);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Invariant 5, at the matcher level: a forbidden scheme is rejected
        // even when it is the only entry on the allow-list.
        #[test]
        fn forbidden_scheme_rejected_under_any_allow_list(
            scheme in "javascript|data|vbscript",
            suffix in "[a-zA-Z0-9():,;%]{0,20}",
        ) {
            let uri = format!("{scheme}:{suffix}");
            let allowed = vec![RedirectUriEntry::strict(uri.clone())];
            prop_assert_eq!(matches(&uri, &allowed), MatchOutcome::ForbiddenScheme);
        }
    }
}
