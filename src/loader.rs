//! Bilingual, section-partitioned portfolio data loading.
//!
//! Content is split into one JSON file per section per language under
//! `<base>/data/<lang>/<section>.json`. Critical sections must load or
//! the whole language fails; non-critical sections degrade to an empty
//! list. Loaded languages are cached for the life of the loader, and an
//! in-flight load for a language is never duplicated: a second caller
//! waits on the first instead of refetching.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};
use serde_json::Value;

use crate::config::{AppConfig, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};
use crate::fetch::Fetch;

/// Sections the initial render cannot do without.
pub const CRITICAL_SECTIONS: &[&str] =
    &["personal", "social", "experience", "education", "skills", "meta"];

/// List sections that tolerate a failed fetch (substituted empty).
pub const NON_CRITICAL_SECTIONS: &[&str] =
    &["projects", "certifications", "interests", "awards", "testimonials"];

/// URL for one data file, honoring the deployment base.
pub fn data_url(config: &AppConfig, language: &str, filename: &str) -> String {
    let joined = format!("{}data/{}/{}", config.base_with_slash(), language, filename);
    crate::routes::collapse_pathname(&joined)
}

type SectionMap = HashMap<String, Value>;

/// The assembled per-language content. Object sections stay opaque
/// JSON; list sections are materialized so they can be sliced.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioData {
    pub personal: Value,
    pub social: Value,
    pub experience: Value,
    pub education: Value,
    pub skills: Value,
    pub meta: Value,
    pub projects: Vec<Value>,
    pub certifications: Vec<Value>,
    pub interests: Vec<Value>,
    pub awards: Vec<Value>,
    pub testimonials: Vec<Value>,
}

fn object_section(map: &SectionMap, name: &str) -> Value {
    map.get(name).cloned().unwrap_or(Value::Null)
}

fn list_section(map: &SectionMap, name: &str) -> Vec<Value> {
    map.get(name)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
}

fn assemble(map: &SectionMap) -> PortfolioData {
    PortfolioData {
        personal: object_section(map, "personal"),
        social: object_section(map, "social"),
        experience: object_section(map, "experience"),
        education: object_section(map, "education"),
        skills: object_section(map, "skills"),
        meta: object_section(map, "meta"),
        projects: list_section(map, "projects"),
        certifications: list_section(map, "certifications"),
        interests: list_section(map, "interests"),
        awards: list_section(map, "awards"),
        testimonials: list_section(map, "testimonials"),
    }
}

/// Truncate the non-critical lists for the fast first paint.
fn truncate_for_critical(mut data: PortfolioData) -> PortfolioData {
    data.projects.truncate(2);
    data.certifications.truncate(1);
    data.interests.truncate(3);
    data.awards.truncate(1);
    data.testimonials.truncate(1);
    data
}

#[derive(Default)]
struct LangSlot {
    data: Mutex<Option<Arc<SectionMap>>>,
}

/// Fetches and caches per-language section maps.
pub struct DataLoader {
    fetcher: Arc<dyn Fetch>,
    config: AppConfig,
    cache: Mutex<HashMap<String, Arc<LangSlot>>>,
}

impl DataLoader {
    pub fn new(fetcher: Arc<dyn Fetch>, config: AppConfig) -> Self {
        DataLoader {
            fetcher,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load (or return cached) section data for one language. Failures
    /// are not cached, so a retry after a transient error refetches.
    pub fn load_language_data(&self, language: &str) -> Result<Arc<SectionMap>, String> {
        let slot = {
            let mut cache = self.cache.lock().unwrap();
            cache
                .entry(language.to_string())
                .or_insert_with(|| Arc::new(LangSlot::default()))
                .clone()
        };

        // Holding the slot lock across the fetch is what keeps a second
        // concurrent call for the same language from duplicating work.
        let mut data = slot.data.lock().unwrap();
        if let Some(map) = data.as_ref() {
            debug!("Language {} served from cache", language);
            return Ok(map.clone());
        }

        let map = Arc::new(self.fetch_sections(language)?);
        *data = Some(map.clone());
        Ok(map)
    }

    /// Fetch all eleven sections concurrently and assemble the map.
    fn fetch_sections(&self, language: &str) -> Result<SectionMap, String> {
        let sections: Vec<&str> = CRITICAL_SECTIONS
            .iter()
            .chain(NON_CRITICAL_SECTIONS.iter())
            .copied()
            .collect();

        let results: Vec<(&str, Result<Value, String>)> = thread::scope(|scope| {
            let handles: Vec<_> = sections
                .iter()
                .map(|&section| {
                    scope.spawn(move || (section, self.fetch_section(language, section)))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(pair) => pair,
                    Err(_) => ("", Err("section load thread panicked".to_string())),
                })
                .collect()
        });

        let mut map = SectionMap::new();
        for (section, result) in results {
            match result {
                Ok(value) => {
                    map.insert(section.to_string(), value);
                }
                Err(e) if NON_CRITICAL_SECTIONS.contains(&section) => {
                    warn!("Failed to load {} for {}: {}", section, language, e);
                    map.insert(section.to_string(), Value::Array(Vec::new()));
                }
                Err(e) => {
                    return Err(format!("Failed to load {} for {}: {}", section, language, e));
                }
            }
        }
        Ok(map)
    }

    fn fetch_section(&self, language: &str, section: &str) -> Result<Value, String> {
        let url = data_url(&self.config, language, &format!("{}.json", section));
        let response = self.fetcher.fetch(&url)?;
        if !response.ok() {
            return Err(format!("{}: status {}", url, response.status));
        }
        response.json()
    }

    /// Critical view: all critical sections plus bounded slices of the
    /// non-critical lists.
    pub fn critical_data(&self, language: &str) -> Result<PortfolioData, String> {
        let map = self.load_language_data(language)?;
        Ok(truncate_for_critical(assemble(&map)))
    }

    /// Full, untruncated view.
    pub fn full_data(&self, language: &str) -> Result<PortfolioData, String> {
        let map = self.load_language_data(language)?;
        Ok(assemble(&map))
    }

    /// Whether a language is already resident (a sync switch).
    pub fn is_cached(&self, language: &str) -> bool {
        let cache = self.cache.lock().unwrap();
        cache
            .get(language)
            .map(|slot| slot.data.lock().unwrap().is_some())
            .unwrap_or(false)
    }

    /// Drop every cached language. Test teardown hook.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }
}

/// What the UI observes. `Loading`, `Failed`, and `Ready` are mutually
/// exclusive by construction.
#[derive(Debug, Clone)]
pub enum SessionState {
    Loading,
    Failed(String),
    Ready(PortfolioData),
}

/// Stateful view over the loader: current language, two-phase
/// critical/full exposure, and on-demand section merging.
pub struct PortfolioSession {
    loader: Arc<DataLoader>,
    language: Mutex<String>,
    state: Mutex<SessionState>,
    loaded_sections: Mutex<HashSet<String>>,
}

fn critical_section_set() -> HashSet<String> {
    CRITICAL_SECTIONS.iter().map(|s| s.to_string()).collect()
}

fn all_section_set() -> HashSet<String> {
    CRITICAL_SECTIONS
        .iter()
        .chain(NON_CRITICAL_SECTIONS.iter())
        .map(|s| s.to_string())
        .collect()
}

impl PortfolioSession {
    pub fn new(loader: Arc<DataLoader>, language: &str) -> Self {
        PortfolioSession {
            loader,
            language: Mutex::new(language.to_string()),
            state: Mutex::new(SessionState::Loading),
            loaded_sections: Mutex::new(critical_section_set()),
        }
    }

    /// Preload every supported language in parallel, then expose the
    /// critical view for the current language. Any critical-section
    /// failure fails the whole start.
    pub fn start(&self) {
        let results: Vec<Result<(), String>> = thread::scope(|scope| {
            let handles: Vec<_> = SUPPORTED_LANGUAGES
                .iter()
                .map(|&lang| {
                    let loader = self.loader.clone();
                    scope.spawn(move || loader.load_language_data(lang).map(|_| ()))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(r) => r,
                    Err(_) => Err("language load thread panicked".to_string()),
                })
                .collect()
        });

        for result in results {
            if let Err(e) = result {
                *self.state.lock().unwrap() = SessionState::Failed(e);
                return;
            }
        }

        let language = self.current_language();
        let lang = if self.loader.is_cached(&language) {
            language
        } else {
            DEFAULT_LANGUAGE.to_string()
        };
        match self.loader.critical_data(&lang) {
            Ok(data) => {
                *self.state.lock().unwrap() = SessionState::Ready(data);
                *self.loaded_sections.lock().unwrap() = critical_section_set();
            }
            Err(e) => *self.state.lock().unwrap() = SessionState::Failed(e),
        }
    }

    pub fn current_language(&self) -> String {
        self.language.lock().unwrap().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state(), SessionState::Loading)
    }

    pub fn error(&self) -> Option<String> {
        match self.state() {
            SessionState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<PortfolioData> {
        match self.state() {
            SessionState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn loaded_sections(&self) -> HashSet<String> {
        self.loaded_sections.lock().unwrap().clone()
    }

    /// Switch the displayed language. A cached language switches
    /// synchronously (no loading state); an uncached one runs the full
    /// load pipeline.
    pub fn switch_language(&self, language: &str) {
        *self.language.lock().unwrap() = language.to_string();

        if !self.loader.is_cached(language) {
            *self.state.lock().unwrap() = SessionState::Loading;
        }
        match self.loader.critical_data(language) {
            Ok(data) => {
                *self.state.lock().unwrap() = SessionState::Ready(data);
                *self.loaded_sections.lock().unwrap() = critical_section_set();
            }
            Err(e) => *self.state.lock().unwrap() = SessionState::Failed(e),
        }
    }

    /// Merge one full (untruncated) section into the current view.
    /// No-op when the section is already loaded or no data is shown.
    pub fn load_section(&self, section: &str) {
        {
            let loaded = self.loaded_sections.lock().unwrap();
            if loaded.contains(section) {
                return;
            }
        }
        let language = self.current_language();
        let map = match self.loader.load_language_data(&language) {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to load {} section: {}", section, e);
                return;
            }
        };
        let mut state = self.state.lock().unwrap();
        if let SessionState::Ready(data) = &mut *state {
            match section {
                "projects" => data.projects = list_section(&map, "projects"),
                "certifications" => data.certifications = list_section(&map, "certifications"),
                "interests" => data.interests = list_section(&map, "interests"),
                "awards" => data.awards = list_section(&map, "awards"),
                "testimonials" => data.testimonials = list_section(&map, "testimonials"),
                _ => return,
            }
            self.loaded_sections
                .lock()
                .unwrap()
                .insert(section.to_string());
        }
    }

    /// Replace the view with the full, untruncated dataset.
    pub fn load_all_sections(&self) {
        let language = self.current_language();
        match self.loader.full_data(&language) {
            Ok(data) => {
                *self.state.lock().unwrap() = SessionState::Ready(data);
                *self.loaded_sections.lock().unwrap() = all_section_set();
            }
            Err(e) => warn!("Failed to load all sections: {}", e),
        }
    }
}
