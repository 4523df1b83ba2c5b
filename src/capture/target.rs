//! Capture target validation

use url::Url;

use crate::{Error, Result};

/// URL schemes a capture may run against
pub const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ftp", "file"];

/// Hosts that never allow capture (extension store pages)
pub const DENIED_HOSTS: [&str; 2] = ["chrome.google.com", "chromewebstore.google.com"];

/// Check that `target` is a page the capture session may run on.
///
/// `extra_denied` hosts match exactly or as a parent domain.
pub fn validate_target(target: &str, extra_denied: &[String]) -> Result<Url> {
    let url = Url::parse(target)
        .map_err(|e| Error::invalid_target(format!("{target}: {e}")))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::invalid_target(format!(
            "{target}: scheme '{}' cannot be captured",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        let denied = DENIED_HOSTS
            .iter()
            .any(|d| host == *d && matches!(url.scheme(), "http" | "https"))
            || extra_denied.iter().any(|d| host_matches(&host, d));
        if denied {
            return Err(Error::invalid_target(format!("{target}: host '{host}' is not capturable")));
        }
    }

    Ok(url)
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().trim_start_matches('.').to_ascii_lowercase();
    if pattern.is_empty() {
        return false;
    }
    host == pattern || host.ends_with(&format!(".{pattern}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_capturable_schemes() {
        for target in [
            "https://example.com/",
            "http://localhost:8080/index.html",
            "ftp://ftp.example.org/pub/",
            "file:///tmp/report.html",
        ] {
            assert!(validate_target(target, &[]).is_ok(), "{target} should be capturable");
        }
    }

    #[test]
    fn test_rejects_browser_internal_schemes() {
        for target in ["chrome://settings", "about:blank", "chrome-extension://abc/popup.html", "data:text/html,hi"] {
            let err = validate_target(target, &[]).unwrap_err();
            assert!(matches!(err, Error::InvalidTarget(_)), "{target}");
        }
    }

    #[test]
    fn test_rejects_extension_store() {
        let err = validate_target("https://chrome.google.com/webstore/detail/x", &[]).unwrap_err();
        assert!(err.to_string().contains("chrome.google.com"));
        assert!(validate_target("https://chromewebstore.google.com/", &[]).is_err());
        assert!(validate_target("https://google.com/", &[]).is_ok());
    }

    #[test]
    fn test_extra_denied_hosts_match_subdomains() {
        let denied = vec!["intranet.corp".to_string()];
        assert!(validate_target("https://wiki.intranet.corp/page", &denied).is_err());
        assert!(validate_target("https://intranet.corp/", &denied).is_err());
        assert!(validate_target("https://notintranet.corp/", &denied).is_ok());
    }

    #[test]
    fn test_unparsable_target() {
        assert!(matches!(validate_target("not a url", &[]), Err(Error::InvalidTarget(_))));
    }
}
