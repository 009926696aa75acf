/// Deployment configuration shared by every path-aware component.
///
/// Constructed once at startup and passed by reference into the router,
/// history adapter, data loader, and i18n bootstrap, so all of them
/// agree on the same base-path prefix. A site served from the domain
/// root uses `"/"`; a site served from a sub-path (e.g. GitHub Pages)
/// uses something like `"/portfolio/"`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_path: String,
}

/// Languages the site ships content for.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "pt-PT"];

/// Language used when no preference is stored and the browser
/// language does not match a supported one.
pub const DEFAULT_LANGUAGE: &str = "en";

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_path: "/".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new(base_path: &str) -> Self {
        AppConfig {
            base_path: base_path.to_string(),
        }
    }

    /// Normalized base prefix for path comparisons: `""` when serving
    /// from the root, otherwise `/<base>` with no trailing slash.
    pub fn base_prefix(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Base with a guaranteed trailing slash, for URL joining.
    pub fn base_with_slash(&self) -> String {
        let prefix = self.base_prefix();
        if prefix.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", prefix)
        }
    }

    pub fn is_root_base(&self) -> bool {
        self.base_prefix().is_empty()
    }
}
