//! Path-based history bridge between the platform navigation primitive
//! and the route table. Only valid routes are ever visible in the
//! address bar: anything else is replaced (not pushed) with the
//! internal 404 path, so back/forward history never holds an invalid
//! entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

use crate::config::AppConfig;
use crate::routes::{self, ROUTE_404, ROUTE_LANDING};

/// Seam over the platform history API (pushState/replaceState plus the
/// current URL). Hosts embedding the crate implement this against the
/// real browser; [`MemoryBackend`] is a self-contained stand-in.
pub trait HistoryBackend: Send + Sync {
    fn pathname(&self) -> String;
    fn push_state(&self, pathname: &str);
    fn replace_state(&self, pathname: &str);
}

/// Current location as the router sees it. Pathname-only: query
/// strings never survive route validation, so none is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
}

pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&Location) + Send + Sync>;

/// In-memory backend with a real entry stack and cursor, so
/// back/forward behave like the platform's.
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

struct BackendState {
    entries: Vec<String>,
    cursor: usize,
}

impl MemoryBackend {
    pub fn new(initial_pathname: &str) -> Self {
        MemoryBackend {
            state: Mutex::new(BackendState {
                entries: vec![initial_pathname.to_string()],
                cursor: 0,
            }),
        }
    }

    /// Move the cursor back one entry, like the browser back button.
    /// Returns false at the start of the stack.
    pub fn back(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.cursor == 0 {
            return false;
        }
        state.cursor -= 1;
        true
    }

    /// Move the cursor forward one entry. Returns false at the end.
    pub fn forward(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.cursor + 1 >= state.entries.len() {
            return false;
        }
        state.cursor += 1;
        true
    }

    pub fn entry_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.entries.len()
    }
}

impl HistoryBackend for MemoryBackend {
    fn pathname(&self) -> String {
        let state = self.state.lock().unwrap();
        state.entries[state.cursor].clone()
    }

    fn push_state(&self, pathname: &str) {
        let mut state = self.state.lock().unwrap();
        let cursor = state.cursor;
        state.entries.truncate(cursor + 1);
        state.entries.push(pathname.to_string());
        state.cursor += 1;
    }

    fn replace_state(&self, pathname: &str) {
        let mut state = self.state.lock().unwrap();
        let cursor = state.cursor;
        state.entries[cursor] = pathname.to_string();
    }
}

/// The history adapter consumed by the router.
pub struct BrowserHistory {
    backend: Arc<dyn HistoryBackend>,
    config: AppConfig,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl BrowserHistory {
    pub fn new(backend: Arc<dyn HistoryBackend>, config: AppConfig) -> Self {
        BrowserHistory {
            backend,
            config,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Map the platform pathname to an app route, stripping the
    /// deployment base.
    fn pathname_to_route(&self, pathname: &str) -> String {
        let path = routes::collapse_pathname(pathname);
        let base = self.config.base_prefix();
        if base.is_empty() {
            return path;
        }
        if path == base {
            return ROUTE_LANDING.to_string();
        }
        if let Some(rest) = path.strip_prefix(&format!("{}/", base)) {
            return if rest.is_empty() {
                ROUTE_LANDING.to_string()
            } else {
                format!("/{}", rest)
            };
        }
        path
    }

    /// Replace the current URL with the based 404 path. Replacement,
    /// never a push: invalid entries must not pollute history.
    fn replace_with_404(&self) {
        let url = routes::to_full_path(&self.config, ROUTE_404);
        self.backend.replace_state(&url);
    }

    /// Current route from the platform pathname. Invalid pathnames are
    /// rewritten to the 404 path as a side effect.
    pub fn get_path_from_location(&self) -> String {
        let route = self.pathname_to_route(&self.backend.pathname());
        if route == ROUTE_404 {
            return ROUTE_404.to_string();
        }
        if !routes::is_valid_route(&route) {
            warn!("Invalid pathname resolved to {}; showing 404", route);
            self.replace_with_404();
            return ROUTE_404.to_string();
        }
        route
    }

    pub fn location(&self) -> Location {
        Location {
            pathname: self.get_path_from_location(),
        }
    }

    /// Navigate forward. An unknown path degrades to the 404 replacement
    /// rather than an error.
    pub fn push(&self, path: &str) {
        if path == ROUTE_404 || !routes::is_valid_route(path) {
            self.replace_with_404();
            self.notify();
            return;
        }
        let pathname = routes::to_full_path(&self.config, &routes::normalize_path(path));
        self.backend.push_state(&pathname);
        self.notify();
    }

    /// Replace the current entry. Same invalid-path policy as `push`.
    pub fn replace(&self, path: &str) {
        if path == ROUTE_404 || !routes::is_valid_route(path) {
            self.replace_with_404();
            self.notify();
            return;
        }
        let pathname = routes::to_full_path(&self.config, &routes::normalize_path(path));
        self.backend.replace_state(&pathname);
        self.notify();
    }

    /// Entry point for native back/forward events: the host calls this
    /// when the platform fires its popstate equivalent.
    pub fn on_pop_state(&self) {
        self.notify();
    }

    /// Register a navigation listener. Each registered listener is
    /// notified exactly once per navigation, in registration order.
    pub fn listen<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Location) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut listeners = self.listeners.lock().unwrap();
        listeners.push((id, Arc::new(callback)));
        id
    }

    /// Remove one listener. Idempotent: unknown ids are ignored.
    pub fn unlisten(&self, id: ListenerId) {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|(lid, _)| *lid != id);
    }

    // Snapshot under the lock, invoke outside it: a callback may
    // re-enter this object (unlisten itself, trigger a navigation).
    fn notify(&self) {
        let location = self.location();
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap();
            listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for callback in snapshot {
            callback(&location);
        }
    }
}
