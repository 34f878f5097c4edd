//! A single browser tab: owns the loaded document, the cascade-sorted
//! stylesheet, the layout tree, and the scroll position, and knows how to
//! turn a click into a navigation.
//!
//! This is UI-shell glue (spec.md section 1 draws the line at the document
//! pipeline), so it sits above `style`/`layout`/`paint` rather than
//! reimplementing any of them.

use std::collections::HashMap;

use log::warn;

use crate::css_parser::{CssParser, Rule};
use crate::engine::Engine;
use crate::font::FontMetrics;
use crate::layout::DocumentLayout;
use crate::node::{flatten, NodeKind, NodeRef};
use crate::paint::{self, PaintCmd};
use crate::style;
use crate::url::Url;

lazy_static::lazy_static! {
    /// The built-in stylesheet read at startup (spec.md section 6,
    /// "Stylesheet"). Parsing is total, so this never fails.
    static ref DEFAULT_STYLE_SHEET: Vec<Rule> = CssParser::new(include_str!("../assets/browser.css")).parse();
}

/// One tab's worth of loaded state: the document, its resolved layout, and
/// the paint commands derived from it.
pub struct Tab {
    pub url: Option<Url>,
    root: Option<NodeRef>,
    rules: Vec<Rule>,
    layout: Option<DocumentLayout>,
    paint_cmds: Vec<PaintCmd>,
    pub scroll: f32,
}

impl Tab {
    pub fn new() -> Self {
        Tab { url: None, root: None, rules: Vec::new(), layout: None, paint_cmds: Vec::new(), scroll: 0.0 }
    }

    /// Fetches `url`, parses it, discovers and fetches linked stylesheets,
    /// resolves the cascade, and resets scroll. Layout itself is deferred to
    /// the next [`Tab::ensure_layout`] call, since it needs a `FontMetrics`
    /// the caller may only have at draw time.
    pub fn load(&mut self, url: Url, engine: &Engine) {
        let headers = HashMap::new();
        let body = match url.request(engine, &headers) {
            Ok(body) => body,
            Err(err) => {
                log::error!("failed to load {}: {err}", url.canonical());
                return;
            }
        };

        let root = crate::html_parser::HtmlParser::parse(&body);

        let mut rules = DEFAULT_STYLE_SHEET.clone();
        for href in stylesheet_links(&root) {
            let sheet_url = match url.resolve(&href) {
                Ok(u) => u,
                Err(err) => {
                    warn!("bad stylesheet href {href}: {err}");
                    continue;
                }
            };
            match sheet_url.request(engine, &headers) {
                Ok(css) => rules.extend(CssParser::new(&css).parse()),
                Err(err) => warn!("failed to load stylesheet {href}: {err}"),
            }
        }
        let rules = style::cascade_sort(rules);
        style::resolve(&root, &rules);

        self.url = Some(url);
        self.root = Some(root);
        self.rules = rules;
        self.layout = None;
        self.paint_cmds.clear();
        self.scroll = 0.0;
    }

    /// (Re)builds the layout tree and paint command list if either has not
    /// been computed yet for the current document/viewport. Called from
    /// `draw` (which owns the `FontMetrics` capability) and again after a
    /// `Configure` resize.
    pub fn ensure_layout(&mut self, engine: &Engine, fonts: &mut dyn FontMetrics) {
        if self.layout.is_some() {
            return;
        }
        let Some(root) = self.root.clone() else { return };
        let doc = DocumentLayout::build(root, engine, fonts);
        let mut cmds = Vec::new();
        paint::paint_tree(&doc, &mut cmds);
        self.layout = Some(doc);
        self.paint_cmds = cmds;
    }

    /// Forces the next `ensure_layout` call to rebuild from scratch, e.g.
    /// after a `Configure` event changes the viewport width.
    pub fn invalidate_layout(&mut self) {
        self.layout = None;
    }

    pub fn document_height(&self) -> f32 {
        self.layout.as_ref().map(|d| d.height).unwrap_or(0.0)
    }

    pub fn paint_cmds(&self) -> &[PaintCmd] {
        &self.paint_cmds
    }

    /// Advances scroll by `SCROLL_STEP`, clamped per spec.md section 6.
    pub fn scroll_down(&mut self, engine: &Engine) {
        self.scroll = engine.clamp_scroll(self.scroll + crate::engine::SCROLL_STEP, self.document_height());
    }

    /// Resolves a click at viewport coordinates `(x, y)` to a link, if any,
    /// and navigates to it. `y` is already scroll-adjusted by the caller.
    pub fn click(&mut self, x: f32, y: f32, engine: &Engine) {
        let Some(layout) = self.layout.as_ref() else { return };
        let Some(hit) = layout.hit_test(x, y) else { return };
        let mut current = Some(hit.node.clone());
        while let Some(node) = current {
            let href = match &node.borrow().kind {
                NodeKind::Element(e) if e.tag == "a" => e.attributes.get("href").map(str::to_string),
                _ => None,
            };
            if let Some(href) = href {
                if let Some(base) = self.url.clone() {
                    match base.resolve(&href) {
                        Ok(target) => {
                            self.load(target, engine);
                        }
                        Err(err) => warn!("bad link href {href}: {err}"),
                    }
                }
                return;
            }
            current = node.borrow().parent_ref();
        }
    }
}

impl Default for Tab {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds every `<link rel=stylesheet href=...>` in the document, in order.
fn stylesheet_links(root: &NodeRef) -> Vec<String> {
    let mut nodes = Vec::new();
    flatten(root, &mut nodes);
    nodes
        .into_iter()
        .filter_map(|n| match &n.borrow().kind {
            NodeKind::Element(e) if e.tag == "link" => {
                let is_stylesheet = e.attributes.get("rel").map(|r| r.eq_ignore_ascii_case("stylesheet")).unwrap_or(false);
                if is_stylesheet {
                    e.attributes.get("href").map(str::to_string)
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect()
}
