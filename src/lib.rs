//! Client-side core for a bilingual portfolio SPA.
//!
//! Everything here runs on the host's side of the wire: route
//! classification, history bridging, contact-unlock persistence,
//! cookie consent, theming, per-language data loading, and the
//! service-worker cache dispatcher. There is no server component;
//! the only I/O is HTTP GETs of static JSON behind the [`fetch::Fetch`]
//! seam and key/value persistence behind the [`storage::Storage`] seam.

pub mod config;
pub mod consent;
pub mod fetch;
pub mod gate;
pub mod history;
pub mod i18n;
pub mod loader;
pub mod routes;
pub mod storage;
pub mod sw;
pub mod theme;
pub mod unlock;


pub use config::AppConfig;
