//! GDPR cookie-consent store.
//!
//! Replaces the old banner script's ad hoc DOM listeners with an
//! explicit store: hosts subscribe for preference changes and get an
//! unsubscribe handle back. Consent state lives under two storage keys,
//! a timestamp recording when consent was given and the preference set
//! itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

const CONSENT_KEY: &str = "portfolio_cookie_consent";
const PREFERENCES_KEY: &str = "portfolio_cookie_preferences";

/// Cookie categories a visitor can opt in to. `necessary` is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiePreferences {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub preferences: bool,
}

impl Default for CookiePreferences {
    fn default() -> Self {
        CookiePreferences {
            necessary: true,
            analytics: false,
            marketing: false,
            preferences: false,
        }
    }
}

impl CookiePreferences {
    pub fn all_accepted() -> Self {
        CookiePreferences {
            necessary: true,
            analytics: true,
            marketing: true,
            preferences: true,
        }
    }
}

pub type SubscriptionId = u64;

type ConsentListener = Arc<dyn Fn(&CookiePreferences) + Send + Sync>;

pub struct ConsentStore {
    storage: Arc<dyn Storage>,
    listeners: Mutex<Vec<(SubscriptionId, ConsentListener)>>,
    next_id: AtomicU64,
}

impl ConsentStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ConsentStore {
            storage,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Whether the visitor has answered the consent banner at all.
    pub fn has_consent(&self) -> bool {
        match self.storage.get_item(CONSENT_KEY) {
            Ok(v) => v.is_some(),
            Err(e) => {
                warn!("Error reading consent state: {}", e);
                false
            }
        }
    }

    /// When consent was last recorded.
    pub fn consent_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.storage.get_item(CONSENT_KEY).ok()??;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    /// Stored preferences, or the defaults when nothing was saved.
    pub fn preferences(&self) -> CookiePreferences {
        let raw = match self.storage.get_item(PREFERENCES_KEY) {
            Ok(Some(v)) => v,
            Ok(None) => return CookiePreferences::default(),
            Err(e) => {
                warn!("Error reading cookie preferences: {}", e);
                return CookiePreferences::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    pub fn accept_all(&self) {
        self.save_consent(CookiePreferences::all_accepted());
    }

    /// Persist exactly the categories the visitor ticked. `necessary`
    /// is forced on regardless of input.
    pub fn accept_selected(&self, mut prefs: CookiePreferences) {
        prefs.necessary = true;
        self.save_consent(prefs);
    }

    pub fn reject_all(&self) {
        self.save_consent(CookiePreferences::default());
    }

    /// Forget the consent answer entirely; the banner shows again.
    pub fn withdraw_consent(&self) {
        if let Err(e) = self.storage.remove_item(CONSENT_KEY) {
            warn!("Error withdrawing consent: {}", e);
        }
        if let Err(e) = self.storage.remove_item(PREFERENCES_KEY) {
            warn!("Error clearing cookie preferences: {}", e);
        }
        self.notify(&CookiePreferences::default());
    }

    fn save_consent(&self, prefs: CookiePreferences) {
        if let Err(e) = self
            .storage
            .set_item(CONSENT_KEY, &Utc::now().to_rfc3339())
        {
            warn!("Error saving consent timestamp: {}", e);
        }
        match serde_json::to_string(&prefs) {
            Ok(raw) => {
                if let Err(e) = self.storage.set_item(PREFERENCES_KEY, &raw) {
                    warn!("Error saving cookie preferences: {}", e);
                }
            }
            Err(e) => warn!("Error encoding cookie preferences: {}", e),
        }
        self.notify(&prefs);
    }

    /// Subscribe to preference changes. Returns a handle for
    /// [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CookiePreferences) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, Arc::new(callback)));
        id
    }

    /// Idempotent; unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }

    // Callbacks run outside the lock; they may unsubscribe themselves.
    fn notify(&self, prefs: &CookiePreferences) {
        let snapshot: Vec<ConsentListener> = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for callback in snapshot {
            callback(prefs);
        }
    }
}
