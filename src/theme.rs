//! Dark-mode store.
//!
//! Presentation is derived from state on every change and handed to
//! subscribers; there is no timer re-asserting attributes. The host
//! applies [`ThemePresentation`] to its document and is done.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

use crate::storage::Storage;

const THEME_KEY: &str = "darkMode";

/// What the host should render for the current theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePresentation {
    pub is_dark_mode: bool,
    /// Value for the document theme attribute.
    pub theme_attr: &'static str,
    /// Class the document body should carry.
    pub body_class: &'static str,
}

fn presentation_for(is_dark_mode: bool) -> ThemePresentation {
    if is_dark_mode {
        ThemePresentation {
            is_dark_mode: true,
            theme_attr: "dark",
            body_class: "dark-theme",
        }
    } else {
        ThemePresentation {
            is_dark_mode: false,
            theme_attr: "light",
            body_class: "light-theme",
        }
    }
}

pub type SubscriptionId = u64;

type ThemeListener = Arc<dyn Fn(&ThemePresentation) + Send + Sync>;

pub struct ThemeStore {
    storage: Arc<dyn Storage>,
    dark: Mutex<bool>,
    listeners: Mutex<Vec<(SubscriptionId, ThemeListener)>>,
    next_id: AtomicU64,
}

impl ThemeStore {
    /// Reads the saved preference; an unreadable or absent value means
    /// light mode.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let dark = match storage.get_item(THEME_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read theme preference: {}", e);
                false
            }
        };
        ThemeStore {
            storage,
            dark: Mutex::new(dark),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn is_dark_mode(&self) -> bool {
        *self.dark.lock().unwrap()
    }

    pub fn presentation(&self) -> ThemePresentation {
        presentation_for(self.is_dark_mode())
    }

    pub fn toggle(&self) {
        let next = !self.is_dark_mode();
        self.set_dark_mode(next);
    }

    pub fn set_dark_mode(&self, dark: bool) {
        *self.dark.lock().unwrap() = dark;
        if let Err(e) = self.storage.set_item(THEME_KEY, if dark { "true" } else { "false" }) {
            warn!("Failed to save theme preference: {}", e);
        }
        let presentation = presentation_for(dark);
        // Callbacks run outside the lock; they may unsubscribe themselves.
        let snapshot: Vec<ThemeListener> = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for callback in snapshot {
            callback(&presentation);
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ThemePresentation) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }
}
