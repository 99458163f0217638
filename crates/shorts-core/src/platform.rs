//! Platform capabilities injected into the extension logic.
//!
//! The browser exposes storage, runtime messaging, tabs and the page DOM as
//! ambient globals. Here each surface is a trait, so the settings store,
//! background handler and content filter receive them explicitly and tests
//! can substitute in-memory doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;

use crate::bridge::{Badge, Message, Response};
use crate::error::{CoreError, Result};

/// Browser storage partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Synced across the user's browsers; settings and installation id.
    Sync,
    /// Device-local; statistics, kept out of the sync quota.
    Local,
}

impl StorageArea {
    /// Returns the area as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Sync => "sync",
            StorageArea::Local => "local",
        }
    }
}

/// Key-value persistence over JSON values.
pub trait PersistenceCapability {
    /// Reads `key`, returning `None` if it was never written.
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>>;

    /// Writes `key`.
    fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<()>;

    /// Deletes `key`. Missing keys are not an error.
    fn remove(&self, area: StorageArea, key: &str) -> Result<()>;
}

/// Page → background request/response channel.
pub trait MessagingCapability {
    /// Sends `message` and waits for the reply.
    fn send(&self, message: Message) -> Result<Response>;
}

impl<T: MessagingCapability + ?Sized> MessagingCapability for &T {
    fn send(&self, message: Message) -> Result<Response> {
        (**self).send(message)
    }
}

impl<T: MessagingCapability + ?Sized> MessagingCapability for Arc<T> {
    fn send(&self, message: Message) -> Result<Response> {
        (**self).send(message)
    }
}

/// Browser tab identifier.
pub type TabId = i64;

/// Background → page push channel plus extension action surface.
pub trait TabsCapability {
    /// Returns the tabs whose URL matches `url_pattern`.
    fn query(&self, url_pattern: &str) -> Result<Vec<TabId>>;

    /// Pushes `message` to the content script in `tab`.
    fn send(&self, tab: TabId, message: &Message) -> Result<()>;

    /// Injects the content script into `tab`.
    fn inject_content_script(&self, tab: TabId) -> Result<()>;

    /// Updates the toolbar badge.
    fn set_badge(&self, badge: &Badge);
}

/// Opaque handle to a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Mutation observers owned by the content filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    /// Watches the document to detect in-app URL changes.
    Navigation,
    /// Watches for newly inserted Shorts links while block mode is on.
    Block,
}

/// The page DOM as seen by the content filter.
///
/// Every method must tolerate missing elements; DOM drift is a no-op, not
/// an error.
pub trait PageCapability {
    /// Current `location.href`.
    fn location(&self) -> String;

    /// Navigates to `url` after `delay`.
    fn navigate(&self, url: &str, delay: Duration);

    /// Returns true if an element with `id` exists.
    fn has_element(&self, id: &str) -> bool;

    /// Appends a `<style id=id>` element to the document head.
    fn insert_style(&self, id: &str, css: &str) -> Result<()>;

    /// Removes the element with `id`. Returns false if absent.
    fn remove_element(&self, id: &str) -> bool;

    /// Returns all nodes matching `selector`.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Lower-case tag name of `node`.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// Attribute value of `node`.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Sets an attribute on `node`.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Parent element of `node`.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Replaces `node` with a deep clone lacking `drop_attribute`.
    ///
    /// The clone carries no event listeners.
    fn replace_with_clone(&self, node: NodeId, drop_attribute: &str) -> Option<NodeId>;

    /// Shows a transient notice, removed after `duration`.
    fn show_notice(&self, text: &str, duration: Duration);

    /// Installs the document-level capturing click listener.
    fn install_click_interceptor(&self);

    /// Removes the document-level click listener.
    fn remove_click_interceptor(&self);

    /// Starts a subtree mutation observer of `kind`.
    fn observe(&self, kind: ObserverKind);

    /// Disconnects the observer of `kind`.
    fn disconnect(&self, kind: ObserverKind);
}

/// In-memory persistence with both partitions.
///
/// Clones share the same backing maps. [`set_available`](Self::set_available)
/// simulates a missing or throwing storage API.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    data: Arc<RwLock<HashMap<(StorageArea, String), Value>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryPersistence {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles the simulated storage failure.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of stored keys in `area`.
    pub fn len(&self, area: StorageArea) -> usize {
        self.data.read().keys().filter(|(a, _)| *a == area).count()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::StorageUnavailable(
                "storage API not available".to_string(),
            ));
        }
        Ok(())
    }
}

impl PersistenceCapability for MemoryPersistence {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>> {
        self.check()?;
        Ok(self.data.read().get(&(area, key.to_string())).cloned())
    }

    fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<()> {
        self.check()?;
        self.data.write().insert((area, key.to_string()), value);
        Ok(())
    }

    fn remove(&self, area: StorageArea, key: &str) -> Result<()> {
        self.check()?;
        self.data.write().remove(&(area, key.to_string()));
        Ok(())
    }
}
