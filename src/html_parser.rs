//! HTML tokenizer and tree-construction parser (spec.md section 4.3).
//!
//! The tokenizer is a small character state machine (text / tag / comment /
//! script-body); tree construction maintains an explicit `unfinished` stack
//! and is total — malformed markup is absorbed by implicit-tag insertion and
//! the end-of-input popping loop in [`HtmlParser::finish`], never an error.

use crate::node::{append_child, AttributeMap, Node, NodeRef};

const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const HEAD_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "noscript", "link", "meta", "title", "style", "script",
];

pub struct HtmlParser {
    unfinished: Vec<NodeRef>,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self { unfinished: Vec::new() }
    }

    /// Parses a complete HTML document string into a node tree rooted at `html`.
    pub fn parse(body: &str) -> NodeRef {
        let mut parser = Self::new();
        parser.run(body);
        parser.finish()
    }

    fn run(&mut self, body: &str) {
        #[derive(PartialEq)]
        enum Mode {
            Text,
            Tag,
            Comment,
            Script,
        }

        let chars: Vec<char> = body.chars().collect();
        let mut mode = Mode::Text;
        let mut buffer = String::new();
        let mut i = 0;

        while i < chars.len() {
            match mode {
                Mode::Text => {
                    if chars[i..].starts_with(&['<', '!', '-', '-']) {
                        if !buffer.is_empty() {
                            self.add_text(&buffer);
                        }
                        buffer.clear();
                        mode = Mode::Comment;
                        i += 4;
                    } else if chars[i] == '<' {
                        if !buffer.is_empty() {
                            self.add_text(&buffer);
                        }
                        buffer.clear();
                        mode = Mode::Tag;
                        i += 1;
                    } else {
                        buffer.push(chars[i]);
                        i += 1;
                    }
                }
                Mode::Tag => {
                    if chars[i] == '>' {
                        let is_script_open = is_script_open_tag(&buffer);
                        self.add_tag(&buffer);
                        buffer.clear();
                        mode = if is_script_open { Mode::Script } else { Mode::Text };
                        i += 1;
                    } else {
                        buffer.push(chars[i]);
                        i += 1;
                    }
                }
                Mode::Comment => {
                    if chars[i..].starts_with(&['-', '-', '>']) {
                        mode = Mode::Text;
                        i += 3;
                    } else {
                        i += 1;
                    }
                }
                Mode::Script => {
                    if chars[i..].starts_with(
                        &['<', '/', 's', 'c', 'r', 'i', 'p', 't', '>'],
                    ) {
                        self.add_text(&buffer);
                        buffer.clear();
                        self.add_tag("/script");
                        mode = Mode::Text;
                        i += 9;
                    } else {
                        buffer.push(chars[i]);
                        i += 1;
                    }
                }
            }
        }
        if !buffer.is_empty() && mode != Mode::Comment {
            self.add_text(&buffer);
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.implicit_tags(None);
        let node = Node::new_text(text.to_string());
        if let Some(parent) = self.unfinished.last() {
            append_child(parent, node);
        }
    }

    fn add_tag(&mut self, raw: &str) {
        let (name, attributes) = parse_tag(raw);
        if name.starts_with('!') || name.is_empty() {
            return;
        }

        self.implicit_tags(Some(&name));

        if let Some(_closed) = name.strip_prefix('/') {
            if self.unfinished.len() == 1 {
                return;
            }
            let node = self.unfinished.pop().unwrap();
            let parent = self.unfinished.last().unwrap().clone();
            append_child(&parent, node);
        } else if SELF_CLOSING_TAGS.contains(&name.as_str()) {
            let node = Node::new_element(name, attributes);
            if let Some(parent) = self.unfinished.last() {
                append_child(parent, node);
            }
        } else {
            let node = Node::new_element(name, attributes);
            self.unfinished.push(node);
        }
    }

    /// Loops inserting `html`/`head`/`body`/`/head` until the stack shape and
    /// the upcoming `tag` no longer demand another implicit insertion.
    fn implicit_tags(&mut self, tag: Option<&str>) {
        loop {
            let open_tags: Vec<String> = self
                .unfinished
                .iter()
                .map(|n| n.borrow().tag().unwrap_or_default().to_string())
                .collect();

            if open_tags.is_empty() {
                if tag != Some("html") {
                    self.add_tag("html");
                    continue;
                }
            } else if open_tags == ["html"] {
                if !matches!(tag, Some("head") | Some("body") | Some("/html")) {
                    if tag.is_some_and(|t| HEAD_TAGS.contains(&t)) {
                        self.add_tag("head");
                    } else {
                        self.add_tag("body");
                    }
                    continue;
                }
            } else if open_tags == ["html", "head"] {
                if tag != Some("/head") && !tag.is_some_and(|t| HEAD_TAGS.contains(&t)) {
                    self.add_tag("/head");
                    continue;
                }
            }
            break;
        }
    }

    fn finish(mut self) -> NodeRef {
        if self.unfinished.is_empty() {
            self.implicit_tags(None);
        }
        while self.unfinished.len() > 1 {
            let node = self.unfinished.pop().unwrap();
            let parent = self.unfinished.last().unwrap().clone();
            append_child(&parent, node);
        }
        self.unfinished.pop().expect("implicit_tags always leaves a root")
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_script_open_tag(raw: &str) -> bool {
    let (name, _) = parse_tag(raw);
    name == "script"
}

/// Splits raw tag text into `head SP rest`; `head` lowercased is the tag name.
fn parse_tag(raw: &str) -> (String, AttributeMap) {
    let raw = raw.trim_start();
    let (head, rest) = match raw.find(char::is_whitespace) {
        Some(idx) => (&raw[..idx], raw[idx..].trim_start()),
        None => (raw, ""),
    };
    (head.to_lowercase(), parse_attributes(rest))
}

/// Attribute state machine over the text following the tag name, per
/// spec.md section 4.3's literal description (including the open question
/// about `a=b"c"d`-style quirks, which this preserves rather than "fixes").
fn parse_attributes(rest: &str) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    let mut buffer = String::new();
    let mut key: Option<String> = None;
    let mut quote: Option<char> = None;

    for c in rest.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
                if key.is_some() {
                    flush_pair(&mut key, &mut buffer, &mut attrs);
                }
            } else {
                buffer.push(c);
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '=' if key.is_none() && !buffer.is_empty() => {
                key = Some(std::mem::take(&mut buffer));
            }
            c if c.is_whitespace() => flush_pair(&mut key, &mut buffer, &mut attrs),
            c => buffer.push(c),
        }
    }
    flush_pair(&mut key, &mut buffer, &mut attrs);
    attrs
}

fn flush_pair(key: &mut Option<String>, buffer: &mut String, attrs: &mut AttributeMap) {
    if buffer.is_empty() && key.is_none() {
        return;
    }
    match key.take() {
        Some(k) => attrs.insert(k, std::mem::take(buffer)),
        None => attrs.insert(std::mem::take(buffer), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn tag_of(node: &NodeRef) -> Option<String> {
        node.borrow().tag().map(|s| s.to_string())
    }

    #[test]
    fn implicit_body_wraps_bare_paragraph() {
        let root = HtmlParser::parse("<p>hi");
        assert_eq!(tag_of(&root).as_deref(), Some("html"));
        let body = &root.borrow().children[0];
        assert_eq!(tag_of(body).as_deref(), Some("body"));
        let p = &body.borrow().children[0];
        assert_eq!(tag_of(p).as_deref(), Some("p"));
    }

    #[test]
    fn implicit_head_holds_link_and_body_holds_text() {
        let root = HtmlParser::parse("<link><p>hi");
        let html = root.borrow();
        assert_eq!(html.children.len(), 2);
        assert_eq!(tag_of(&html.children[0]).as_deref(), Some("head"));
        assert_eq!(tag_of(&html.children[0].borrow().children[0]).as_deref(), Some("link"));
        assert_eq!(tag_of(&html.children[1]).as_deref(), Some("body"));
        assert_eq!(tag_of(&html.children[1].borrow().children[0]).as_deref(), Some("p"));
    }

    #[test]
    fn script_body_passes_through_angle_brackets() {
        // "script" is a HEAD_TAGS member, so implicit-tag insertion files it
        // under <head>, not <body>.
        let root = HtmlParser::parse("<script>a<b>c</script>");
        let head = &root.borrow().children[0];
        assert_eq!(tag_of(head).as_deref(), Some("head"));
        let script = &head.borrow().children[0];
        assert_eq!(tag_of(script).as_deref(), Some("script"));
        let text = &script.borrow().children[0];
        match &text.borrow().kind {
            NodeKind::Text(t) => assert_eq!(t.text, "a<b>c"),
            _ => panic!("expected text node"),
        }
    }

    #[test]
    fn comments_are_dropped() {
        let root = HtmlParser::parse("<p>a<!-- nope -->b</p>");
        let body = &root.borrow().children[0];
        let p = &body.borrow().children[0];
        // The comment splits the surrounding text into two sibling text
        // nodes rather than merging across it; "nope" never reaches the tree.
        assert_eq!(p.borrow().children.len(), 2);
        for (child, expected) in p.borrow().children.iter().zip(["a", "b"]) {
            match &child.borrow().kind {
                NodeKind::Text(t) => assert_eq!(t.text, expected),
                _ => panic!("expected text node"),
            }
        }
    }

    #[test]
    fn attribute_quote_toggle_quirk() {
        let (_, attrs) = parse_tag("div a=b\"c\"d");
        assert_eq!(attrs.get("a"), Some("bc"));
        assert_eq!(attrs.get("d"), Some(""));
    }

    #[test]
    fn self_closing_tags_do_not_nest() {
        let root = HtmlParser::parse("<p>a<br>b</p>");
        let body = &root.borrow().children[0];
        let p = &body.borrow().children[0];
        assert_eq!(p.borrow().children.len(), 3);
        assert_eq!(tag_of(&p.borrow().children[1]).as_deref(), Some("br"));
        assert!(p.borrow().children[1].borrow().children.is_empty());
    }
}
