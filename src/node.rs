//! The document tree: `Element` and `Text` nodes with parent pointers.
//!
//! Children are owned (`Rc<RefCell<Node>>`), the parent back-reference is a
//! `Weak` handle into the same arena so the tree does not leak itself —
//! spec.md's design notes allow either an arena-with-indices or "owning
//! children and a non-owning parent handle"; this takes the latter since the
//! parser already builds the tree top-down with an explicit stack, so every
//! parent is allocated before its children.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub type NodeRef = Rc<RefCell<Node>>;
pub type WeakNodeRef = Weak<RefCell<Node>>;

/// An order-preserving string-to-string map, used for element attributes.
///
/// Preserving insertion order matters: spec.md's style resolver overlays
/// style sources "later wins", and an element's own `style=""` attribute is
/// just one more attribute that has to parse the same way no matter where it
/// appeared among the others.
#[derive(Clone, Debug, Default)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts or overwrites (in place, preserving its original position) a key.
    pub fn insert(&mut self, key: String, value: String) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub tag: String,
    pub attributes: AttributeMap,
}

#[derive(Clone, Debug)]
pub struct TextData {
    pub text: String,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Element(ElementData),
    Text(TextData),
}

/// A node in the parsed document tree. Every invariant in spec.md section 3
/// holds once the HTML parser has finished: every element except the root
/// has a parent, and (after the style pass) `style` carries every key in
/// [`crate::style::INHERITED_PROPERTIES`].
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<NodeRef>,
    pub parent: Option<WeakNodeRef>,
    pub style: HashMap<String, String>,
}

impl Node {
    pub fn new_element(tag: String, attributes: AttributeMap) -> NodeRef {
        Rc::new(RefCell::new(Node {
            kind: NodeKind::Element(ElementData { tag, attributes }),
            children: Vec::new(),
            parent: None,
            style: HashMap::new(),
        }))
    }

    pub fn new_text(text: String) -> NodeRef {
        Rc::new(RefCell::new(Node {
            kind: NodeKind::Text(TextData { text }),
            children: Vec::new(),
            parent: None,
            style: HashMap::new(),
        }))
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(e) => Some(e.tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(t) => Some(t.text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn parent_ref(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }
}

/// Appends `child` to `parent`'s children, wiring up `child`'s parent pointer.
pub fn append_child(parent: &NodeRef, child: NodeRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
    parent.borrow_mut().children.push(child);
}

/// Flattens a tree into preorder `Vec<NodeRef>`, used for link discovery and
/// hit-testing in the shell.
pub fn flatten(root: &NodeRef, out: &mut Vec<NodeRef>) {
    out.push(root.clone());
    for child in root.borrow().children.clone() {
        flatten(&child, out);
    }
}
