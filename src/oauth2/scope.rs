//! Scope policy: resolves the requested scope set against a provider's
//! configured scope mappings.

use std::collections::HashSet;

/// GitHub-compat pseudo-scopes excluded from the subset check when the
/// route variant requests `github_compat` handling.
const SCOPE_GITHUB: &[&str] = &["user", "read:user", "user:email"];

/// External seam standing in for the out-of-scope consent UI: given a set
/// of resolved scope identifiers, returns human-readable descriptions.
pub trait ScopeDescriptions {
    fn describe(&self, scopes: &HashSet<String>) -> Vec<(String, String)>;
}

/// Default descriptions: falls back to the scope identifier itself when no
/// richer description is registered, so callers always get a full list.
pub struct DefaultScopeDescriptions {
    pub known: Vec<(String, String)>,
}

impl ScopeDescriptions for DefaultScopeDescriptions {
    fn describe(&self, scopes: &HashSet<String>) -> Vec<(String, String)> {
        scopes
            .iter()
            .map(|s| {
                let desc = self
                    .known
                    .iter()
                    .find(|(code, _)| code == s)
                    .map(|(_, d)| d.clone())
                    .unwrap_or_else(|| s.clone());
                (s.clone(), desc)
            })
            .collect()
    }
}

/// Resolve the requested scope set against the provider's configured
/// scopes. Returns the resolved set (never failing on an over-broad
/// request; those are silently intersected).
pub fn resolve_scopes(
    requested: &HashSet<String>,
    configured: &HashSet<String>,
    github_compat: bool,
) -> HashSet<String> {
    if requested.is_empty() {
        return configured.clone();
    }

    let scopes_to_check: HashSet<String> = if github_compat {
        requested
            .iter()
            .filter(|s| !SCOPE_GITHUB.contains(&s.as_str()))
            .cloned()
            .collect()
    } else {
        requested.clone()
    };

    if scopes_to_check.is_subset(configured) {
        requested.clone()
    } else {
        requested.intersection(configured).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_request_adopts_all_configured() {
        let configured = set(&["openid", "profile", "email"]);
        let resolved = resolve_scopes(&HashSet::new(), &configured, false);
        assert_eq!(resolved, configured);
    }

    #[test]
    fn subset_request_is_kept_as_is() {
        let configured = set(&["openid", "profile", "email"]);
        let requested = set(&["openid"]);
        assert_eq!(resolve_scopes(&requested, &configured, false), requested);
    }

    #[test]
    fn over_broad_request_is_silently_intersected() {
        let configured = set(&["openid", "profile"]);
        let requested = set(&["openid", "profile", "drive"]);
        let resolved = resolve_scopes(&requested, &configured, false);
        assert_eq!(resolved, set(&["openid", "profile"]));
    }

    #[test]
    fn github_compat_excludes_pseudo_scopes_from_subset_check() {
        let configured = set(&["openid", "profile"]);
        let requested = set(&["openid", "profile", "user"]);
        // "user" would normally fail the subset check and trigger an
        // intersection, dropping "user" too; github_compat exempts it.
        let resolved = resolve_scopes(&requested, &configured, true);
        assert_eq!(resolved, requested);
    }

    #[test]
    fn default_descriptions_fall_back_to_identifier() {
        let descriptions = DefaultScopeDescriptions {
            known: vec![("openid".into(), "Verify your identity".into())],
        };
        let scopes = set(&["openid", "custom.scope"]);
        let described = descriptions.describe(&scopes);
        assert!(described.contains(&("openid".to_string(), "Verify your identity".to_string())));
        assert!(described.contains(&("custom.scope".to_string(), "custom.scope".to_string())));
    }
}
