//! Contact privacy gate: the consent form in front of contact details.
//!
//! Composes the unlock store with form validation and a subscription
//! API. Gate state is derived from the store on every read; nothing
//! polls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;

use crate::unlock::UnlockStore;

/// Fields the unlock form collects. `phone` and `company` are optional.
#[derive(Debug, Clone, Default)]
pub struct ContactUnlockForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked { days_remaining: i64 },
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap())
}

/// Email address format check.
pub fn validate_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// E.164 phone check, ignoring embedded spaces.
pub fn validate_phone(phone: &str) -> bool {
    let clean: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    phone_re().is_match(&clean)
}

/// Full name: at least two characters and at least two words.
pub fn validate_full_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.len() >= 2 && trimmed.split_whitespace().count() >= 2
}

/// Validate the whole form, collecting every field error rather than
/// stopping at the first.
pub fn validate_form(form: &ContactUnlockForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !validate_full_name(&form.full_name) {
        errors.push(FieldError {
            field: "full_name",
            message: "Please provide your full name.",
        });
    }
    if !validate_email(&form.email) {
        errors.push(FieldError {
            field: "email",
            message: "Please provide a valid email address.",
        });
    }
    if !form.phone.trim().is_empty() && !validate_phone(&form.phone) {
        errors.push(FieldError {
            field: "phone",
            message: "Please enter a valid phone number.",
        });
    }
    if form.reason.trim().is_empty() {
        errors.push(FieldError {
            field: "reason",
            message: "Please select a purpose.",
        });
    }
    errors
}

pub type SubscriptionId = u64;

type GateListener = Arc<dyn Fn(GateState) + Send + Sync>;

pub struct PrivacyGate {
    unlock: UnlockStore,
    listeners: Mutex<Vec<(SubscriptionId, GateListener)>>,
    next_id: AtomicU64,
}

impl PrivacyGate {
    pub fn new(unlock: UnlockStore) -> Self {
        PrivacyGate {
            unlock,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current gate state, derived from the unlock record.
    pub fn state(&self) -> GateState {
        if !self.unlock.is_contact_unlocked() {
            return GateState::Locked;
        }
        let days_remaining = self
            .unlock
            .get_unlock_expiry_info()
            .map(|info| info.days_remaining)
            .unwrap_or(0);
        GateState::Unlocked { days_remaining }
    }

    /// Validate and, on success, unlock. Field errors come back to the
    /// form; the record is only written when validation passes.
    pub fn submit(&self, form: &ContactUnlockForm) -> Result<(), Vec<FieldError>> {
        let errors = validate_form(form);
        if !errors.is_empty() {
            return Err(errors);
        }
        self.unlock
            .set_contact_unlocked(form.full_name.trim(), form.email.trim());
        self.notify();
        Ok(())
    }

    /// Manually re-lock contact details.
    pub fn lock(&self) {
        self.unlock.clear_contact_unlock();
        self.notify();
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(GateState) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }

    // Callbacks run outside the lock; they may unsubscribe themselves.
    fn notify(&self) {
        let state = self.state();
        let snapshot: Vec<GateListener> = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for callback in snapshot {
            callback(state);
        }
    }
}
