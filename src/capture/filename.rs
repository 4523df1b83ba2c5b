//! Suggested output file names

use std::sync::atomic::{AtomicI64, Ordering};

/// Prefix used when no other prefix is configured
pub const DEFAULT_PREFIX: &str = "chaser-shot";

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Build `<prefix>-<slug>-<timestamp>.png` for a page URL.
///
/// The timestamp is epoch milliseconds, bumped when needed so that two
/// calls in the same process never return the same name.
pub fn build_filename(url: &str, prefix: &str) -> String {
    build_filename_at(url, prefix, next_timestamp())
}

/// Same as [`build_filename`] with an explicit timestamp
pub fn build_filename_at(url: &str, prefix: &str, timestamp: i64) -> String {
    let name = slug(url);
    if name.is_empty() {
        format!("{prefix}-{timestamp}.png")
    } else {
        format!("{prefix}-{name}-{timestamp}.png")
    }
}

/// Reduce a URL to a file-name-safe slug.
///
/// Query and fragment are dropped, an `http(s)://` scheme is removed and
/// every run of non-alphanumeric characters becomes a single `-`.
pub fn slug(url: &str) -> String {
    let base = url.split(['?', '#']).next().unwrap_or_default();

    let lower = base.to_ascii_lowercase();
    let base = ["https://", "http://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
        .map_or(base, |scheme| &base[scheme.len()..]);

    let mut out = String::with_capacity(base.len());
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

fn next_timestamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}
