//! Full-pipeline scenarios from spec.md section 8: fetch (via `file://`),
//! parse, cascade, layout, paint, run end to end with no network involved.

use std::collections::HashMap;
use std::io::Write;

use zipsurf::css_parser::CssParser;
use zipsurf::engine::Engine;
use zipsurf::font::{FontId, FontMetrics, FontStyle, FontWeight};
use zipsurf::html_parser::HtmlParser;
use zipsurf::layout::DocumentLayout;
use zipsurf::paint::{self, PaintCmd};
use zipsurf::style;
use zipsurf::url::Url;

struct FixedMetrics {
    next_id: u64,
}

impl FontMetrics for FixedMetrics {
    fn get_font(&mut self, _size: i32, _weight: FontWeight, _style: FontStyle) -> FontId {
        let id = FontId(self.next_id);
        self.next_id += 1;
        id
    }

    fn measure(&mut self, _font: FontId, text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn ascent(&mut self, _font: FontId) -> f32 {
        16.0
    }

    fn descent(&mut self, _font: FontId) -> f32 {
        4.0
    }
}

fn render(html: &str, css: &str) -> Vec<PaintCmd> {
    let root = HtmlParser::parse(html);
    let rules = style::cascade_sort(CssParser::new(css).parse());
    style::resolve(&root, &rules);
    let engine = Engine::new();
    let mut fonts = FixedMetrics { next_id: 0 };
    let doc = DocumentLayout::build(root, &engine, &mut fonts);
    let mut cmds = Vec::new();
    paint::paint_tree(&doc, &mut cmds);
    cmds
}

/// Scenario 1: loading a `file://` document emits a `DrawText` for its body
/// text, positioned inside the document margin.
#[test]
fn loading_a_file_url_emits_text_inside_the_margin() {
    let mut fixture = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
    write!(fixture, "<html><body><p>hello</p></body></html>").unwrap();
    let path = fixture.path().to_str().unwrap().to_string();

    let url = Url::parse(&format!("file://{path}")).unwrap();
    let engine = Engine::new();
    let body = url.request(&engine, &HashMap::new()).unwrap();
    assert!(body.contains("hello"));

    let cmds = render(&body, "");
    let hello = cmds.iter().find(|c| matches!(c, PaintCmd::DrawText { text, .. } if text == "hello"));
    match hello.unwrap() {
        PaintCmd::DrawText { x, y, .. } => {
            assert!(*x >= engine.hstep);
            assert!(*y >= engine.vstep);
        }
        _ => unreachable!(),
    }
}

/// Scenario 2: a stylesheet rule colors matching text.
#[test]
fn stylesheet_rule_colors_matching_paragraph() {
    let cmds = render("<p>x</p>", "p { color: red }");
    let red = zipsurf::color::Color::parse("red");
    assert!(cmds.iter().any(|c| matches!(c, PaintCmd::DrawText { color, .. } if *color == red)));
}

/// Scenario 3: an inline `background-color` style paints a rect under its
/// own text, at overlapping coordinates.
#[test]
fn inline_background_color_paints_rect_under_its_text() {
    let cmds = render("<p style='background-color: yellow'>x</p>", "");
    let rect = cmds.iter().find_map(|c| match c {
        PaintCmd::DrawRect { rect, .. } => Some(*rect),
        _ => None,
    });
    let text_pos = cmds.iter().find_map(|c| match c {
        PaintCmd::DrawText { x, y, .. } => Some((*x, *y)),
        _ => None,
    });
    let rect = rect.expect("background rect");
    let (tx, ty) = text_pos.expect("text position");
    assert!(rect.contains(tx, ty));
}

/// Scenario 6: a word containing the hard-coded emoji glyph produces a
/// `DrawImage` alongside its surrounding text.
#[test]
fn emoji_glyph_produces_a_draw_image() {
    let cmds = render("<p>hi\u{1F600}there</p>", "");
    assert!(cmds.iter().any(|c| matches!(c, PaintCmd::DrawImage { .. })));
    assert!(cmds.iter().any(|c| matches!(c, PaintCmd::DrawText { text, .. } if text.contains("hi"))));
}

/// The full pipeline never panics on an empty document.
#[test]
fn empty_document_lays_out_and_paints_without_panicking() {
    let cmds = render("", "");
    assert!(cmds.iter().all(|c| matches!(c, PaintCmd::DrawText { .. } | PaintCmd::DrawRect { .. } | PaintCmd::DrawImage { .. })));
}
