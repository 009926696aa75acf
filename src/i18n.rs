//! Language preference and UI translation bootstrap.
//!
//! Translations ship inside the consolidated per-language data file
//! (`<base>/data/portfolio-<lang>.json`, top-level `portfolio` and `ui`
//! keys); only the `ui` table is held here. A failed translation fetch
//! degrades to an empty table — UI strings fall back to their keys.

use std::sync::{Arc, Mutex};

use log::warn;
use serde_json::Value;

use crate::config::{AppConfig, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};
use crate::fetch::Fetch;
use crate::storage::Storage;

const LANGUAGE_KEY: &str = "i18nextLng";

/// URL of the consolidated data file for one language.
pub fn consolidated_data_url(config: &AppConfig, language: &str) -> String {
    let joined = format!(
        "{}data/portfolio-{}.json",
        config.base_with_slash(),
        language
    );
    crate::routes::collapse_pathname(&joined)
}

/// Pick the initial language: saved preference first, then the browser
/// language (any `pt*` locale maps to `pt-PT`), then the default.
pub fn resolve_initial_language(saved: Option<&str>, browser: Option<&str>) -> String {
    if let Some(lang) = saved {
        if SUPPORTED_LANGUAGES.contains(&lang) {
            return lang.to_string();
        }
    }
    if let Some(browser) = browser {
        if browser.starts_with("pt") {
            return "pt-PT".to_string();
        }
    }
    DEFAULT_LANGUAGE.to_string()
}

pub struct I18n {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn Fetch>,
    config: AppConfig,
    language: Mutex<String>,
    translations: Mutex<Value>,
}

impl I18n {
    /// Initialise from the saved preference (falling back to the given
    /// browser language) and load that language's translations.
    pub fn new(
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn Fetch>,
        config: AppConfig,
        browser_language: Option<&str>,
    ) -> Self {
        let saved = storage.get_item(LANGUAGE_KEY).ok().flatten();
        let language = resolve_initial_language(saved.as_deref(), browser_language);
        let i18n = I18n {
            storage,
            fetcher,
            config,
            language: Mutex::new(language),
            translations: Mutex::new(Value::Null),
        };
        i18n.load_translations();
        i18n
    }

    /// Fetch the `ui` table for the current language. Silent on
    /// failure: the table stays empty and `t()` falls back.
    pub fn load_translations(&self) {
        let language = self.current_language();
        let url = consolidated_data_url(&self.config, &language);
        let ui = match self.fetcher.fetch(&url) {
            Ok(response) if response.ok() => match response.json() {
                Ok(data) => data.get("ui").cloned().unwrap_or(Value::Null),
                Err(e) => {
                    warn!("Translations for {} are not valid JSON: {}", language, e);
                    Value::Null
                }
            },
            Ok(response) => {
                warn!(
                    "Failed to load translations for {}: status {}",
                    language, response.status
                );
                Value::Null
            }
            Err(e) => {
                warn!("Failed to load translations for {}: {}", language, e);
                Value::Null
            }
        };
        *self.translations.lock().unwrap() = ui;
    }

    pub fn current_language(&self) -> String {
        self.language.lock().unwrap().clone()
    }

    /// Switch language, persist the preference, and reload the table.
    pub fn change_language(&self, language: &str) {
        *self.language.lock().unwrap() = language.to_string();
        if let Err(e) = self.storage.set_item(LANGUAGE_KEY, language) {
            warn!("Failed to save language preference: {}", e);
        }
        self.load_translations();
    }

    /// Dot-path lookup into the `ui` table. Missing keys fall back to
    /// the supplied default, then the key itself.
    pub fn t(&self, key: &str, default: Option<&str>) -> String {
        let table = self.translations.lock().unwrap();
        let mut value: &Value = &table;
        for part in key.split('.') {
            match value.get(part) {
                Some(next) => value = next,
                None => return default.unwrap_or(key).to_string(),
            }
        }
        match value.as_str() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => default.unwrap_or(key).to_string(),
        }
    }

    pub fn is_english(&self) -> bool {
        self.current_language() == "en"
    }

    pub fn is_portuguese(&self) -> bool {
        self.current_language() == "pt-PT"
    }

    pub fn supported_languages(&self) -> &'static [&'static str] {
        SUPPORTED_LANGUAGES
    }
}
