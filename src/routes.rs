//! Single source of truth for routing.
//! Path-based: `/` (landing), `/portfolio`, `/portfolio/experience`.
//! Everything in here is pure string work; no I/O.

use crate::config::AppConfig;

/// Root route, the landing page.
pub const ROUTE_LANDING: &str = "/";

/// Portfolio route, the full CV/portfolio view.
pub const ROUTE_PORTFOLIO: &str = "/portfolio";

/// Portfolio section path prefix (e.g. `/portfolio/experience`).
pub const ROUTE_PORTFOLIO_SECTION: &str = "/portfolio/";

/// Internal 404 route, shown in-app; never a served path.
pub const ROUTE_404: &str = "/404";

/// Segments that can never name a real route, regardless of casing.
const INVALID_SEGMENTS: &[&str] = &["undefined", "null", ""];

/// Normalize a path: trim, collapse repeated slashes, strip the
/// trailing slash (except for the root), ensure a leading slash.
/// Empty input maps to the landing route. Idempotent.
pub fn normalize_path(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.trim().chars() {
        if ch == '/' {
            if !prev_slash {
                collapsed.push('/');
            }
            prev_slash = true;
        } else {
            collapsed.push(ch);
            prev_slash = false;
        }
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    if collapsed.is_empty() || collapsed == "/" {
        return ROUTE_LANDING.to_string();
    }
    if collapsed.starts_with('/') {
        collapsed
    } else {
        format!("/{}", collapsed)
    }
}

/// Whether the path is valid: landing, portfolio, or portfolio section.
pub fn is_valid_route(path: &str) -> bool {
    let normalized = normalize_path(path);
    normalized == ROUTE_LANDING
        || normalized == ROUTE_PORTFOLIO
        || normalized.starts_with(ROUTE_PORTFOLIO_SECTION)
}

/// Whether the given path denotes the portfolio view.
pub fn is_portfolio_path(path: &str) -> bool {
    let normalized = normalize_path(path);
    normalized == ROUTE_PORTFOLIO || normalized.starts_with(ROUTE_PORTFOLIO_SECTION)
}

/// Whether a hash segment (the part after `#`) represents a valid route.
/// Empty is valid (landing); any `/`-delimited part equal to
/// "undefined"/"null" (case-insensitive) or blank is not.
pub fn is_valid_hash_segment(segment: &str) -> bool {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return true;
    }
    for part in trimmed.split('/') {
        let part = part.trim().to_lowercase();
        if INVALID_SEGMENTS.contains(&part.as_str()) {
            return false;
        }
    }
    is_valid_route(&hash_segment_to_path(trimmed))
}

/// Convert a route to its hash segment (no `#` or leading `/`).
pub fn path_to_hash_segment(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == ROUTE_LANDING {
        return String::new();
    }
    normalized.trim_start_matches('/').to_string()
}

/// Parse a hash segment back to a normalized path.
pub fn hash_segment_to_path(segment: &str) -> String {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return ROUTE_LANDING.to_string();
    }
    normalize_path(trimmed)
}

/// Build a portfolio route, optionally pointing at one section.
pub fn to_portfolio_route(section: Option<&str>) -> String {
    let seg = section.unwrap_or("").trim().trim_matches('/');
    if seg.is_empty() {
        ROUTE_PORTFOLIO.to_string()
    } else {
        format!("{}{}", ROUTE_PORTFOLIO_SECTION, seg)
    }
}

/// Build the landing route.
pub fn to_landing_route() -> String {
    ROUTE_LANDING.to_string()
}

/// Build the full pathname for a route, honoring the deployment base.
pub fn to_full_path(config: &AppConfig, route: &str) -> String {
    let r = route.trim_matches('/');
    let base = config.base_prefix();
    if base.is_empty() {
        if r.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", r)
        }
    } else if r.is_empty() {
        base
    } else {
        format!("{}/{}", base, r)
    }
}

/// Whether the document pathname is one the app serves:
/// the base itself, `base/index.html`, or `base/portfolio[/...]`.
pub fn is_valid_pathname(config: &AppConfig, pathname: &str) -> bool {
    let path = collapse_pathname(pathname);
    let base = config.base_prefix();

    if base.is_empty() {
        return path == "/"
            || path == "/index.html"
            || path == ROUTE_PORTFOLIO
            || path.starts_with(ROUTE_PORTFOLIO_SECTION);
    }
    path == base
        || path == format!("{}/index.html", base)
        || path == format!("{}/portfolio", base)
        || path.starts_with(&format!("{}/portfolio/", base))
}

/// Whether the pathname should show the in-app 404 (no `.html` redirect).
pub fn is_pathname_invalid(config: &AppConfig, pathname: &str) -> bool {
    !is_valid_pathname(config, pathname)
}

/// Collapse duplicate slashes and strip the trailing slash; empty → `/`.
pub(crate) fn collapse_pathname(pathname: &str) -> String {
    let mut out = String::with_capacity(pathname.len());
    let mut prev_slash = false;
    for ch in pathname.chars() {
        if ch == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(ch);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
