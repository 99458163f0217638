//! In-memory page used by engine tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use crate::error::Result;
use crate::platform::{NodeId, ObserverKind, PageCapability};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: HashMap<String, String>,
    parent: Option<NodeId>,
    attached: bool,
}

/// A flat DOM supporting `tag`, `[attr="v"]` and `tag[attr*="v"]` queries.
#[derive(Debug, Default)]
pub(crate) struct FakePage {
    url: RefCell<String>,
    nodes: RefCell<BTreeMap<NodeId, Node>>,
    next_id: Cell<u64>,
    pub styles: RefCell<Vec<(String, String)>>,
    pub notices: RefCell<Vec<(String, Duration)>>,
    pub navigations: RefCell<Vec<(String, Duration)>>,
    pub intercepting: Cell<bool>,
    pub observers: RefCell<HashSet<ObserverKind>>,
}

impl FakePage {
    pub fn at(url: &str) -> Self {
        let page = Self::default();
        page.set_url(url);
        page
    }

    pub fn set_url(&self, url: &str) {
        *self.url.borrow_mut() = url.to_string();
    }

    pub fn add(&self, tag: &str, attrs: &[(&str, &str)], parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.nodes.borrow_mut().insert(
            id,
            Node {
                tag: tag.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent,
                attached: true,
            },
        );
        id
    }

    /// Adds `<div><a href=/shorts/id><span/></a></div>`, returning (link, span).
    pub fn add_shorts_link(&self, shorts_id: &str) -> (NodeId, NodeId) {
        let href = format!("/shorts/{shorts_id}");
        let card = self.add("div", &[], None);
        let link = self.add("a", &[("href", &href)], Some(card));
        let label = self.add("span", &[], Some(link));
        (link, label)
    }

    pub fn style_count(&self, id: &str) -> usize {
        self.styles.borrow().iter().filter(|(s, _)| s == id).count()
    }

    pub fn style(&self, id: &str) -> Option<String> {
        self.styles
            .borrow()
            .iter()
            .find(|(s, _)| s == id)
            .map(|(_, css)| css.clone())
    }

    pub fn observing(&self, kind: ObserverKind) -> bool {
        self.observers.borrow().contains(&kind)
    }

    fn matches(node: &Node, selector: &str) -> bool {
        let (tag, condition) = match selector.find('[') {
            Some(i) => (&selector[..i], Some(&selector[i + 1..selector.len() - 1])),
            None => (selector, None),
        };
        if !tag.is_empty() && node.tag != tag {
            return false;
        }
        let Some(condition) = condition else {
            return true;
        };
        let (name, value, contains) = match condition.split_once("*=") {
            Some((n, v)) => (n, v, true),
            None => match condition.split_once('=') {
                Some((n, v)) => (n, v, false),
                None => return node.attrs.contains_key(condition),
            },
        };
        let value = value.trim_matches('"');
        match node.attrs.get(name) {
            Some(actual) if contains => actual.contains(value),
            Some(actual) => actual == value,
            None => false,
        }
    }
}

impl PageCapability for FakePage {
    fn location(&self) -> String {
        self.url.borrow().clone()
    }

    fn navigate(&self, url: &str, delay: Duration) {
        self.navigations.borrow_mut().push((url.to_string(), delay));
    }

    fn has_element(&self, id: &str) -> bool {
        self.style_count(id) > 0
    }

    fn insert_style(&self, id: &str, css: &str) -> Result<()> {
        self.styles
            .borrow_mut()
            .push((id.to_string(), css.to_string()));
        Ok(())
    }

    fn remove_element(&self, id: &str) -> bool {
        let mut styles = self.styles.borrow_mut();
        match styles.iter().position(|(s, _)| s == id) {
            Some(i) => {
                styles.remove(i);
                true
            }
            None => false,
        }
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .filter(|(_, n)| n.attached && Self::matches(n, selector))
            .map(|(id, _)| *id)
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(&node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(&node)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(&node).and_then(|n| n.parent)
    }

    fn replace_with_clone(&self, node: NodeId, drop_attribute: &str) -> Option<NodeId> {
        let mut clone = self.nodes.borrow().get(&node)?.clone();
        clone.attrs.remove(drop_attribute);

        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let mut nodes = self.nodes.borrow_mut();
        if let Some(old) = nodes.get_mut(&node) {
            old.attached = false;
        }
        for child in nodes.values_mut() {
            if child.parent == Some(node) {
                child.parent = Some(id);
            }
        }
        nodes.insert(id, clone);
        Some(id)
    }

    fn show_notice(&self, text: &str, duration: Duration) {
        self.notices
            .borrow_mut()
            .push((text.to_string(), duration));
    }

    fn install_click_interceptor(&self) {
        self.intercepting.set(true);
    }

    fn remove_click_interceptor(&self) {
        self.intercepting.set(false);
    }

    fn observe(&self, kind: ObserverKind) {
        self.observers.borrow_mut().insert(kind);
    }

    fn disconnect(&self, kind: ObserverKind) {
        self.observers.borrow_mut().remove(&kind);
    }
}
