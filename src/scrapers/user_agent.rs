//! User agent shared by the browser session and the image fetcher.

/// Desktop Chrome on Windows.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// The configured override, or [`USER_AGENT`] when it is unset or blank.
pub fn resolve_user_agent(custom: Option<&str>) -> &str {
    custom
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .unwrap_or(USER_AGENT)
}
