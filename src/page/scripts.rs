//! JavaScript snippets evaluated in the captured page
//!
//! Every snippet is a single expression so it can go straight into
//! `Runtime.evaluate` with `returnByValue`.

use crate::capture::SessionState;

/// Visible viewport size
pub const VIEWPORT_SCRIPT: &str = "({ width: window.innerWidth, height: window.innerHeight })";

/// Current scroll offset
pub const SCROLL_POSITION_SCRIPT: &str = "({ x: window.scrollX, y: window.scrollY })";

/// Size probes for the scrollable content; the largest one wins
pub const PAGE_EXTENT_SCRIPT: &str = r#"(() => {
    const d = document.documentElement;
    const b = document.body || d;
    return {
        widths: [d.clientWidth, b.scrollWidth, d.scrollWidth, b.offsetWidth, d.offsetWidth],
        heights: [d.clientHeight, b.scrollHeight, d.scrollHeight, b.offsetHeight, d.offsetHeight]
    };
})()"#;

/// Scroll offset and overflow styling the session is about to change
pub const SNAPSHOT_STATE_SCRIPT: &str = r#"(() => ({
    scrollX: window.scrollX,
    scrollY: window.scrollY,
    overflow: document.documentElement.style.overflow,
    bodyOverflowY: document.body ? document.body.style.overflowY : null
}))()"#;

/// Hide the scrollbars so they never end up in a capture
pub const DISABLE_SCROLLBARS_SCRIPT: &str = r#"(() => {
    document.documentElement.style.overflow = 'hidden';
    if (document.body) { document.body.style.overflowY = 'visible'; }
    return true;
})()"#;

/// Puts a [`SessionState`] back; called with the state as its argument
pub const RESTORE_STATE_FN: &str = r#"function (s) {
    document.documentElement.style.overflow = s.overflow;
    if (document.body && s.bodyOverflowY !== null) { document.body.style.overflowY = s.bodyOverflowY; }
    window.scrollTo(s.scrollX, s.scrollY);
    return true;
}"#;

pub const TITLE_SCRIPT: &str = "document.title";

pub const LOCATION_SCRIPT: &str = "window.location.href";

pub const READY_STATE_SCRIPT: &str = "document.readyState";

/// Prefix shared by every [`scroll_to_script`] expression
pub const SCROLL_TO_PREFIX: &str = "window.scrollTo(";

/// Prefix shared by every [`set_title_script`] expression
pub const SET_TITLE_PREFIX: &str = "document.title = ";

pub fn scroll_to_script(x: f64, y: f64) -> String {
    format!("{}{}, {})", SCROLL_TO_PREFIX, x, y)
}

/// Invoke [`RESTORE_STATE_FN`] on `state`
pub fn restore_state_script(state: &SessionState) -> Result<String, crate::Error> {
    Ok(format!("({})({})", RESTORE_STATE_FN, serde_json::to_string(state)?))
}

/// Assign `document.title`, with the title JSON-quoted
pub fn set_title_script(title: &str) -> Result<String, crate::Error> {
    Ok(format!("{}{}", SET_TITLE_PREFIX, serde_json::to_string(title)?))
}
