//! CSS selectors: tag selectors and descendant selectors, per spec.md 4.4/4.5.
//!
//! Only these two forms are supported — no classes, ids, or combinators
//! beyond plain descendant — per spec.md's explicit non-goal of "full CSS
//! selectors beyond tag and descendant".

use crate::node::{Node, NodeKind};

#[derive(Clone, Debug)]
pub enum Selector {
    Tag(String),
    Descendant(Box<Selector>, Box<Selector>),
}

impl Selector {
    pub fn tag(name: impl Into<String>) -> Self {
        Selector::Tag(name.into())
    }

    pub fn descendant(ancestor: Selector, descendant: Selector) -> Self {
        Selector::Descendant(Box::new(ancestor), Box::new(descendant))
    }

    /// Sum of constituent tag-selector priorities; a bare tag selector has
    /// priority 1, a descendant selector the sum of both sides.
    pub fn priority(&self) -> u32 {
        match self {
            Selector::Tag(_) => 1,
            Selector::Descendant(ancestor, descendant) => ancestor.priority() + descendant.priority(),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Selector::Tag(name) => match &node.kind {
                NodeKind::Element(e) => &e.tag == name,
                NodeKind::Text(_) => false,
            },
            Selector::Descendant(ancestor, descendant) => {
                if !descendant.matches(node) {
                    return false;
                }
                let mut current = node.parent_ref();
                while let Some(parent) = current {
                    if ancestor.matches(&parent.borrow()) {
                        return true;
                    }
                    current = parent.borrow().parent_ref();
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{append_child, Node};

    #[test]
    fn tag_selector_matches_only_elements() {
        let el = Node::new_element("p".into(), Default::default());
        let text = Node::new_text("hi".into());
        let sel = Selector::tag("p");
        assert!(sel.matches(&el.borrow()));
        assert!(!sel.matches(&text.borrow()));
    }

    #[test]
    fn descendant_selector_walks_ancestors() {
        let div = Node::new_element("div".into(), Default::default());
        let p = Node::new_element("p".into(), Default::default());
        append_child(&div, p.clone());

        let sel = Selector::descendant(Selector::tag("div"), Selector::tag("p"));
        assert!(sel.matches(&p.borrow()));
        assert!(!sel.matches(&div.borrow()));
    }

    #[test]
    fn priority_sums_tag_selectors() {
        let sel = Selector::descendant(Selector::tag("div"), Selector::tag("p"));
        assert_eq!(sel.priority(), 2);
        assert_eq!(Selector::tag("p").priority(), 1);
    }
}
