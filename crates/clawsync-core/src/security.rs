//! Security policy evaluation for upstream URLs
//!
//! Pure, side-effect-free checks deciding whether a URL may be trusted.
//! Evaluation order is deterministic so user-facing reasons are stable:
//! scheme, then host allowlist, then repository allowlist.

use url::Url;

use crate::types::{SecurityEvaluation, SecurityPolicy};

/// Evaluate a URL against a security policy
///
/// Safe to call repeatedly; used both to gate sync actions and to report
/// status to the user.
pub fn evaluate_url(raw_url: &str, policy: &SecurityPolicy) -> SecurityEvaluation {
    let parsed = match Url::parse(raw_url) {
        Ok(parsed) => parsed,
        Err(_) => {
            return SecurityEvaluation {
                allowed: false,
                reason: format!("Invalid URL: {raw_url}"),
                host: None,
                repository: None,
            };
        }
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();

    if policy.require_https && parsed.scheme() != "https" {
        return SecurityEvaluation {
            allowed: false,
            reason: "Only https URLs are allowed by security policy.".to_string(),
            host: Some(host),
            repository: None,
        };
    }

    if !policy.allowed_hosts.contains(&host) {
        return SecurityEvaluation {
            allowed: false,
            reason: format!("Host is not allowlisted: {host}"),
            host: Some(host),
            repository: None,
        };
    }

    let repository = extract_repository(&parsed);
    if !policy.allows_any_repository() {
        let Some(repository) = repository else {
            return SecurityEvaluation {
                allowed: false,
                reason: "Repository could not be inferred from URL path.".to_string(),
                host: Some(host),
                repository: None,
            };
        };
        if !policy.allowed_repositories.contains(&repository) {
            return SecurityEvaluation {
                allowed: false,
                reason: format!("Repository is not allowlisted: {repository}"),
                host: Some(host),
                repository: Some(repository),
            };
        }
        return SecurityEvaluation {
            allowed: true,
            reason: "URL passed strict allowlist policy.".to_string(),
            host: Some(host),
            repository: Some(repository),
        };
    }

    SecurityEvaluation {
        allowed: true,
        reason: "URL passed strict allowlist policy.".to_string(),
        host: Some(host),
        repository,
    }
}

/// Derive a lower-cased `owner/repo` identifier from the first two
/// non-empty path segments of a URL
pub fn extract_repository(url: &Url) -> Option<String> {
    let mut segments = url
        .path_segments()?
        .map(str::trim)
        .filter(|segment| !segment.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    Some(format!("{owner}/{repo}").to_lowercase())
}
