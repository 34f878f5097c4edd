//! The cascade: inheritance, matched-rule overlay, and inline `style=`
//! overrides (spec.md section 4.5).

use crate::css_parser::{CssParser, Rule};
use crate::node::{NodeKind, NodeRef};

lazy_static::lazy_static! {
    /// Defaults for properties that inherit down the tree when a node has no
    /// more specific value of its own.
    pub static ref INHERITED_PROPERTIES: Vec<(&'static str, &'static str)> = vec![
        ("font-size", "16px"),
        ("font-style", "normal"),
        ("font-weight", "normal"),
        ("color", "black"),
    ];
}

/// Sorts `rules` by ascending selector priority; ties keep source order
/// (a stable sort), so later same-priority rules still win the cascade —
/// invariant (v) in spec.md section 3.
pub fn cascade_sort(mut rules: Vec<Rule>) -> Vec<Rule> {
    rules.sort_by_key(|(selector, _)| selector.priority());
    rules
}

/// Recursively resolves `style` for `node` and its descendants.
///
/// `rules` must already be cascade-sorted (ascending priority, stable); each
/// matching rule's declarations overlay in order, then the node's own
/// `style=""` attribute overlays last, then a trailing `%` `font-size` is
/// resolved against the parent's resolved `font-size`.
pub fn resolve(node: &NodeRef, rules: &[Rule]) {
    let parent_style = node.borrow().parent_ref().map(|p| p.borrow().style.clone());

    {
        let mut n = node.borrow_mut();
        for (key, default) in INHERITED_PROPERTIES.iter() {
            let value = parent_style
                .as_ref()
                .and_then(|p| p.get(*key).cloned())
                .unwrap_or_else(|| default.to_string());
            n.style.insert(key.to_string(), value);
        }
    }

    let matched: Vec<&Rule> = rules.iter().filter(|(sel, _)| sel.matches(&node.borrow())).collect();
    {
        let mut n = node.borrow_mut();
        for (_, body) in matched {
            for (k, v) in body {
                n.style.insert(k.clone(), v.clone());
            }
        }
    }

    let inline_style = match &node.borrow().kind {
        NodeKind::Element(e) => e.attributes.get("style").map(|s| s.to_string()),
        NodeKind::Text(_) => None,
    };
    if let Some(style_attr) = inline_style {
        let overlay = CssParser::new(&style_attr).body().unwrap_or_default();
        let mut n = node.borrow_mut();
        for (k, v) in overlay {
            n.style.insert(k, v);
        }
    }

    let (is_percent, parent_px) = {
        let n = node.borrow();
        let size = n.style.get("font-size").cloned().unwrap_or_default();
        (size.ends_with('%'), parent_font_size_px(&parent_style))
    };
    if is_percent {
        let mut n = node.borrow_mut();
        let size = n.style.get("font-size").cloned().unwrap_or_default();
        let pct: f32 = size.trim_end_matches('%').parse().unwrap_or(100.0);
        let px = pct / 100.0 * parent_px;
        n.style.insert("font-size".to_string(), format!("{px}px"));
    }

    let children = node.borrow().children.clone();
    for child in children {
        resolve(&child, rules);
    }
}

fn parent_font_size_px(parent_style: &Option<std::collections::HashMap<String, String>>) -> f32 {
    let raw = parent_style
        .as_ref()
        .and_then(|s| s.get("font-size").cloned())
        .unwrap_or_else(|| "16px".to_string());
    raw.trim_end_matches("px").parse().unwrap_or(16.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{append_child, Node};
    use crate::selector::Selector;

    #[test]
    fn cascade_later_rule_of_equal_priority_wins() {
        let p = Node::new_element("p".into(), Default::default());
        let rules = cascade_sort(vec![
            (Selector::tag("p"), [("color".to_string(), "red".to_string())].into()),
            (Selector::tag("p"), [("color".to_string(), "blue".to_string())].into()),
        ]);
        resolve(&p, &rules);
        assert_eq!(p.borrow().style.get("color"), Some(&"blue".to_string()));
    }

    #[test]
    fn more_specific_descendant_selector_wins_by_priority() {
        let div = Node::new_element("div".into(), Default::default());
        let p = Node::new_element("p".into(), Default::default());
        append_child(&div, p.clone());

        let rules = cascade_sort(vec![
            (Selector::tag("p"), [("color".to_string(), "blue".to_string())].into()),
            (
                Selector::descendant(Selector::tag("div"), Selector::tag("p")),
                [("color".to_string(), "red".to_string())].into(),
            ),
        ]);
        resolve(&div, &rules);
        assert_eq!(p.borrow().style.get("color"), Some(&"red".to_string()));
    }

    #[test]
    fn inline_style_overrides_sheet() {
        let mut attrs = crate::node::AttributeMap::new();
        attrs.insert("style".into(), "color: green".into());
        let p = Node::new_element("p".into(), attrs);
        let rules = cascade_sort(vec![(Selector::tag("p"), [("color".to_string(), "red".to_string())].into())]);
        resolve(&p, &rules);
        assert_eq!(p.borrow().style.get("color"), Some(&"green".to_string()));
    }

    #[test]
    fn percentage_font_size_resolves_against_parent_pixels() {
        let div = Node::new_element("div".into(), Default::default());
        let p = Node::new_element("p".into(), Default::default());
        append_child(&div, p.clone());

        let rules = cascade_sort(vec![
            (Selector::tag("div"), [("font-size".to_string(), "20px".to_string())].into()),
            (Selector::tag("p"), [("font-size".to_string(), "50%".to_string())].into()),
        ]);
        resolve(&div, &rules);
        assert_eq!(p.borrow().style.get("font-size"), Some(&"10px".to_string()));
    }
}
