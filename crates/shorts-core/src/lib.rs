//! Shorts Blocker Core - settings, statistics, messaging and page filtering.
//!
//! This crate holds everything the browser extension does, expressed against
//! injected platform capabilities so the same logic runs inside a real
//! extension host or against in-memory doubles:
//!
//! - [`settings`]: the canonical [`Settings`] type and its normalizer
//! - [`store`]: settings and statistics persistence over a [`PersistenceCapability`]
//! - [`bridge`]: the background-side message handler and tab fan-out
//! - [`engine`]: the per-page content filter (hide, block, URL guard)
//! - [`remote`]: HTTP client mirroring local state to the backend
//!
//! # Example
//!
//! ```
//! use shorts_core::platform::MemoryPersistence;
//! use shorts_core::settings::SettingsPatch;
//! use shorts_core::store::SettingsStore;
//!
//! let store = SettingsStore::new(MemoryPersistence::new());
//! assert!(store.get().hide_shorts);
//!
//! let settings = store
//!     .set(SettingsPatch {
//!         hide_shorts: Some(false),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert!(!settings.hide_shorts);
//! ```

pub mod api;
pub mod bridge;
pub mod engine;
pub mod error;
pub mod installation;
pub mod platform;
pub mod remote;
pub mod settings;
pub mod statistics;
pub mod store;

pub use bridge::{Background, Badge, Message, Response};
pub use engine::{ClickDecision, ContentFilter, SelectorCatalog, SiteConfig};
pub use error::{CoreError, Result};
pub use platform::{
    MemoryPersistence, MessagingCapability, NodeId, ObserverKind, PageCapability,
    PersistenceCapability, StorageArea, TabId, TabsCapability,
};
pub use remote::{ClientConfig, RemoteClient, SettingsSync};
pub use settings::{FilterRule, Settings, SettingsPatch};
pub use statistics::{StatKind, Statistics};
pub use store::{SettingsStore, StatisticsCounter};
