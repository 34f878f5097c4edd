//! The two-mode layout engine: block flow and inline flow with font-metric
//! driven line breaking (spec.md section 4.6).
//!
//! Layout is rebuilt from scratch on every pass — it is a pure function of
//! the node tree, the viewport width, and the `FontMetrics` capability, so
//! there is no mutable layout tree to keep in sync; `DocumentLayout::build`
//! produces a fresh tree each time (spec.md section 5).

use crate::color::Color;
use crate::engine::Engine;
use crate::font::{FontId, FontMetrics, FontStyle, FontWeight};
use crate::node::{NodeKind, NodeRef};

const EMOJI: char = '\u{1F600}';
const SOFT_HYPHEN: char = '\u{00AD}';

const BLOCK_ELEMENTS: &[&str] = &[
    "html", "body", "article", "section", "nav", "aside", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "header", "footer", "address", "p", "hr", "pre", "blockquote", "ol", "ul", "menu",
    "li", "dl", "dt", "dd", "figure", "figcaption", "main", "div", "table", "form", "fieldset",
    "legend", "details", "summary",
];

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
enum Mode {
    Block,
    Inline,
}

/// One entry of a `BlockLayout`'s inline-mode display list.
#[derive(Clone, Debug)]
pub enum DisplayItem {
    Text { x: f32, y: f32, bottom: f32, text: String, font: FontId, color: Color },
    Image { x: f32, y: f32, bottom: f32, size: f32 },
}

/// The root of the layout tree: a fixed margin around one `BlockLayout`
/// wrapping the document's root node.
pub struct DocumentLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub child: Box<BlockLayout>,
}

impl DocumentLayout {
    pub fn build(root: NodeRef, engine: &Engine, fonts: &mut dyn FontMetrics) -> DocumentLayout {
        let x = engine.hstep;
        let y = engine.vstep;
        let width = engine.width - 2.0 * engine.hstep;
        let mut child = BlockLayout::new(root, x, width, y);
        child.layout(engine, fonts);
        let height = child.height;
        DocumentLayout { x, y, width, height, child: Box::new(child) }
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<&BlockLayout> {
        self.child.hit_test(x, y)
    }
}

pub struct BlockLayout {
    pub node: NodeRef,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub children: Vec<BlockLayout>,
    pub display_list: Vec<DisplayItem>,
}

impl BlockLayout {
    fn new(node: NodeRef, x: f32, width: f32, y: f32) -> Self {
        BlockLayout { node, x, y, width, height: 0.0, children: Vec::new(), display_list: Vec::new() }
    }

    fn layout(&mut self, engine: &Engine, fonts: &mut dyn FontMetrics) {
        match layout_mode(&self.node) {
            Mode::Block => {
                let child_nodes = self.node.borrow().children.clone();
                let mut y = self.y;
                let mut children = Vec::with_capacity(child_nodes.len());
                for child_node in child_nodes {
                    let mut child = BlockLayout::new(child_node, self.x, self.width, y);
                    child.layout(engine, fonts);
                    y += child.height;
                    children.push(child);
                }
                self.height = children.iter().map(|c| c.height).sum();
                self.children = children;
            }
            Mode::Inline => {
                let mut state = InlineLayout::new(self.x, self.y, self.width, engine.width, engine.hstep);
                state.recurse(&self.node, false, false, fonts);
                state.flush(false, fonts);
                self.height = state.cursor_y;
                self.display_list = state.display_list;
            }
        }
    }

    /// Finds the innermost (deepest, last-visited in document order) box
    /// containing `(x, y)`, used by the shell to resolve clicks to the node
    /// they landed on before walking up to find an enclosing `<a href>`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&BlockLayout> {
        for child in self.children.iter().rev() {
            if let Some(hit) = child.hit_test(x, y) {
                return Some(hit);
            }
        }
        if x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height {
            Some(self)
        } else {
            None
        }
    }
}

/// Block mode if any child element is a [`BLOCK_ELEMENTS`] tag; inline mode
/// if the node is text or has only inline children; block mode if the node
/// has no children at all (spec.md section 4.6).
fn layout_mode(node: &NodeRef) -> Mode {
    let n = node.borrow();
    match &n.kind {
        NodeKind::Text(_) => Mode::Inline,
        NodeKind::Element(_) => {
            if n.children.is_empty() {
                return Mode::Block;
            }
            let has_block_child = n.children.iter().any(|c| {
                matches!(&c.borrow().kind, NodeKind::Element(e) if BLOCK_ELEMENTS.contains(&e.tag.as_str()))
            });
            if has_block_child {
                Mode::Block
            } else {
                Mode::Inline
            }
        }
    }
}

struct LineItem {
    rel_x: f32,
    font: FontId,
    color: Color,
    superscript: bool,
    content: LineContent,
}

enum LineContent {
    Text(String),
    Image(f32),
}

/// Accumulates one `BlockLayout`'s worth of inline content: the running
/// cursor, the current (uncommitted) line, and the finished display list.
struct InlineLayout {
    x: f32,
    y: f32,
    width: f32,
    viewport_width: f32,
    hstep: f32,
    cursor_x: f32,
    cursor_y: f32,
    line: Vec<LineItem>,
    display_list: Vec<DisplayItem>,
}

impl InlineLayout {
    fn new(x: f32, y: f32, width: f32, viewport_width: f32, hstep: f32) -> Self {
        InlineLayout {
            x,
            y,
            width,
            viewport_width,
            hstep,
            cursor_x: 0.0,
            cursor_y: 0.0,
            line: Vec::new(),
            display_list: Vec::new(),
        }
    }

    /// Walks `node`: text nodes split on whitespace and feed each word to
    /// [`Self::word`]; elements descend into their children, with `<br>`
    /// forcing a line break, `<sup>`/`<abbr>` toggling their respective
    /// rendering modes, and `</h1>` (on the way back up) triggering a
    /// centered flush.
    fn recurse(&mut self, node: &NodeRef, in_sup: bool, in_abbr: bool, fonts: &mut dyn FontMetrics) {
        let (kind_is_text, text, tag, children) = {
            let n = node.borrow();
            match &n.kind {
                NodeKind::Text(t) => (true, t.text.clone(), String::new(), Vec::new()),
                NodeKind::Element(e) => (false, String::new(), e.tag.clone(), n.children.clone()),
            }
        };

        if kind_is_text {
            for w in text.split_whitespace() {
                if in_abbr {
                    self.abbr_word(node, w, fonts);
                } else {
                    self.word(node, w, in_sup, fonts);
                }
            }
            return;
        }

        if tag == "br" {
            self.flush(false, fonts);
            return;
        }

        let child_in_sup = in_sup || tag == "sup";
        let child_in_abbr = in_abbr || tag == "abbr";
        for child in &children {
            self.recurse(child, child_in_sup, child_in_abbr, fonts);
        }

        if tag == "h1" {
            self.flush(true, fonts);
        }
    }

    fn font_and_color(&self, node: &NodeRef, in_sup: bool, fonts: &mut dyn FontMetrics) -> (FontId, Color) {
        let n = node.borrow();
        let weight = FontWeight::from_css(n.style.get("font-weight").map(String::as_str).unwrap_or("normal"));
        let style = FontStyle::from_css(n.style.get("font-style").map(String::as_str).unwrap_or("normal"));
        let px: f32 = n
            .style
            .get("font-size")
            .map(|s| s.trim_end_matches("px"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(16.0);
        let mut size = (px * 0.75) as i32;
        if in_sup {
            size = (size / 2).max(1);
        }
        let color = Color::parse(n.style.get("color").map(String::as_str).unwrap_or("black"));
        (fonts.get_font(size, weight, style), color)
    }

    /// Places a single word, breaking the line first if it would overflow,
    /// and recursing through [`Self::split_soft_hyphen`] when the overflowing
    /// word carries a soft hyphen to split on.
    fn word(&mut self, node: &NodeRef, w: &str, in_sup: bool, fonts: &mut dyn FontMetrics) {
        let (font, color) = self.font_and_color(node, in_sup, fonts);
        let width = fonts.measure(font, w);
        if self.cursor_x + width > self.width {
            if w.contains(SOFT_HYPHEN) {
                self.split_soft_hyphen(node, w, in_sup, font, color, fonts);
                return;
            }
            self.flush(false, fonts);
        }
        let rel_x = self.cursor_x;
        self.place(rel_x, w, font, color, in_sup, fonts);
        self.cursor_x += width + fonts.measure(font, " ");
    }

    fn split_soft_hyphen(
        &mut self,
        node: &NodeRef,
        w: &str,
        in_sup: bool,
        font: FontId,
        color: Color,
        fonts: &mut dyn FontMetrics,
    ) {
        let pieces: Vec<&str> = w.split(SOFT_HYPHEN).collect();
        let remaining = self.width - self.cursor_x;

        let mut take = 1;
        for n in 1..=pieces.len() {
            let candidate = format!("{}-", pieces[..n].join(""));
            if fonts.measure(font, &candidate) <= remaining {
                take = n;
            } else {
                break;
            }
        }

        let prefix = format!("{}-", pieces[..take].join(""));
        let rel_x = self.cursor_x;
        self.place(rel_x, &prefix, font, color, in_sup, fonts);
        self.cursor_x += fonts.measure(font, &prefix) + fonts.measure(font, " ");
        self.flush(false, fonts);

        let suffix = pieces[take..].join(&SOFT_HYPHEN.to_string());
        if !suffix.is_empty() {
            self.word(node, &suffix, in_sup, fonts);
        }
    }

    /// Splits a word into alternating lower/upper-case runs: lower runs
    /// render uppercased in a smaller bold font, upper runs render as-is;
    /// the whole thing advances as one unit plus a trailing space.
    fn abbr_word(&mut self, node: &NodeRef, w: &str, fonts: &mut dyn FontMetrics) {
        let (base_font, color) = self.font_and_color(node, false, fonts);
        let n = node.borrow();
        let px: f32 = n
            .style
            .get("font-size")
            .map(|s| s.trim_end_matches("px"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(16.0);
        drop(n);
        let small_size = (((px * 0.75) as i32) * 4 / 5).max(1);
        let small_font = fonts.get_font(small_size, FontWeight::Bold, FontStyle::Roman);

        let runs = split_case_runs(w);
        let mut total_width = 0.0;
        let mut rendered: Vec<(FontId, String, f32)> = Vec::with_capacity(runs.len());
        for (run, is_upper) in &runs {
            let (font, text) = if *is_upper { (base_font, run.clone()) } else { (small_font, run.to_uppercase()) };
            let width = fonts.measure(font, &text);
            rendered.push((font, text, width));
            total_width += width;
        }

        if self.cursor_x + total_width > self.width {
            self.flush(false, fonts);
        }

        let start_x = self.cursor_x;
        let mut rel_x = start_x;
        for (font, text, width) in rendered {
            self.place(rel_x, &text, font, color, false, fonts);
            rel_x += width;
        }
        self.cursor_x = start_x + total_width + fonts.measure(base_font, " ");
    }

    /// Pushes `text` onto the current line, splitting out the hard-coded
    /// emoji glyph (spec.md section 6 "Resources") into its own image item
    /// wherever it appears.
    fn place(&mut self, mut rel_x: f32, text: &str, font: FontId, color: Color, superscript: bool, fonts: &mut dyn FontMetrics) {
        if !text.contains(EMOJI) {
            self.line.push(LineItem { rel_x, font, color, superscript, content: LineContent::Text(text.to_string()) });
            return;
        }
        for segment in text.split(EMOJI) {
            if !segment.is_empty() {
                let width = fonts.measure(font, segment);
                self.line.push(LineItem {
                    rel_x,
                    font,
                    color,
                    superscript,
                    content: LineContent::Text(segment.to_string()),
                });
                rel_x += width;
            }
            // split() yields one more segment than there are separators;
            // only emit an image marker between segments, not after the last.
        }
        let emoji_count = text.matches(EMOJI).count();
        let size = fonts.linespace(font);
        for _ in 0..emoji_count {
            self.line.push(LineItem { rel_x, font, color, superscript, content: LineContent::Image(size) });
            rel_x += size;
        }
    }

    /// Commits the current line: computes the shared baseline from the
    /// tallest font on the line, emits a display entry per item, and
    /// advances `cursor_y` past the line's descent. `center` re-centers the
    /// committed line's horizontal extent within the viewport, used for
    /// `</h1>`.
    fn flush(&mut self, center: bool, fonts: &mut dyn FontMetrics) {
        if self.line.is_empty() {
            return;
        }

        let max_ascent = self.line.iter().map(|i| fonts.ascent(i.font)).fold(0.0_f32, f32::max);
        let max_descent = self.line.iter().map(|i| fonts.descent(i.font)).fold(0.0_f32, f32::max);
        let baseline = self.cursor_y + 1.25 * max_ascent;

        let offset = if center {
            let first_x = self.line.first().unwrap().rel_x;
            let last = self.line.last().unwrap();
            let last_width = match &last.content {
                LineContent::Text(t) => fonts.measure(last.font, t),
                LineContent::Image(size) => *size,
            };
            let extent = last.rel_x + last_width - first_x;
            let target_center = (self.hstep + (self.viewport_width - self.hstep)) / 2.0;
            target_center - extent / 2.0 - first_x - self.x
        } else {
            0.0
        };

        let line_bottom = self.y + baseline + 1.25 * max_descent;
        for item in &self.line {
            match &item.content {
                LineContent::Text(text) => {
                    let y = if item.superscript {
                        self.y + baseline - max_ascent
                    } else {
                        self.y + baseline - fonts.ascent(item.font)
                    };
                    self.display_list.push(DisplayItem::Text {
                        x: self.x + item.rel_x + offset,
                        y,
                        bottom: line_bottom,
                        text: text.clone(),
                        font: item.font,
                        color: item.color,
                    });
                }
                LineContent::Image(size) => {
                    let y = self.y + baseline - max_ascent;
                    self.display_list.push(DisplayItem::Image {
                        x: self.x + item.rel_x + offset,
                        y,
                        bottom: line_bottom,
                        size: *size,
                    });
                }
            }
        }

        self.cursor_y = baseline + 1.25 * max_descent;
        self.cursor_x = 0.0;
        self.line.clear();
    }
}

/// Splits `word` into runs alternating by letter case, grouping non-letter
/// characters with whichever case preceded them (or lower, at the start).
fn split_case_runs(word: &str) -> Vec<(String, bool)> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_upper: Option<bool> = None;
    for c in word.chars() {
        let is_upper = c.is_uppercase();
        match current_upper {
            Some(u) if u == is_upper => current.push(c),
            None => {
                current.push(c);
                current_upper = Some(is_upper);
            }
            Some(_) => {
                runs.push((std::mem::take(&mut current), current_upper.unwrap()));
                current.push(c);
                current_upper = Some(is_upper);
            }
        }
    }
    if !current.is_empty() {
        runs.push((current, current_upper.unwrap_or(false)));
    }
    runs
}
