//! Flattens the layout tree into a linear list of paint commands (spec.md
//! section 4.7). The painter is a pure walk: it has no opinion on how the
//! commands are actually drawn, only on what should be drawn and in what
//! order — the shell (`chrome.rs`) is the one that turns these into `egui`
//! calls and applies the viewport cull.

use crate::color::Color;
use crate::font::FontId;
use crate::layout::{BlockLayout, DisplayItem, DocumentLayout};
use crate::rect::Rect;

/// One drawing instruction. `top`/`bottom` are carried on every variant so
/// the shell can cull against the scroll viewport without re-deriving
/// geometry from `font`/`text`.
#[derive(Clone, Debug)]
pub enum PaintCmd {
    DrawRect { rect: Rect, color: Color, top: f32, bottom: f32 },
    DrawText { x: f32, y: f32, text: String, font: FontId, color: Color, top: f32, bottom: f32 },
    DrawImage { x: f32, y: f32, size: f32, image_id: &'static str, top: f32, bottom: f32 },
}

impl PaintCmd {
    pub fn top(&self) -> f32 {
        match self {
            PaintCmd::DrawRect { top, .. } => *top,
            PaintCmd::DrawText { top, .. } => *top,
            PaintCmd::DrawImage { top, .. } => *top,
        }
    }

    pub fn bottom(&self) -> f32 {
        match self {
            PaintCmd::DrawRect { bottom, .. } => *bottom,
            PaintCmd::DrawText { bottom, .. } => *bottom,
            PaintCmd::DrawImage { bottom, .. } => *bottom,
        }
    }
}

/// Appends every `BlockLayout` in `doc`'s tree's paint commands to `out`, in
/// document (preorder) order.
pub fn paint_tree(doc: &DocumentLayout, out: &mut Vec<PaintCmd>) {
    paint_block(&doc.child, out);
}

fn paint_block(block: &BlockLayout, out: &mut Vec<PaintCmd>) {
    let bg = Color::parse(
        block
            .node
            .borrow()
            .style
            .get("background-color")
            .map(String::as_str)
            .unwrap_or("transparent"),
    );
    if !bg.is_transparent() {
        out.push(PaintCmd::DrawRect {
            rect: Rect::from_xywh(block.x, block.y, block.width, block.height),
            color: bg,
            top: block.y,
            bottom: block.y + block.height,
        });
    }

    for item in &block.display_list {
        match item {
            DisplayItem::Text { x, y, bottom, text, font, color } => {
                out.push(PaintCmd::DrawText {
                    x: *x,
                    y: *y,
                    text: text.clone(),
                    font: *font,
                    color: *color,
                    top: *y,
                    bottom: *bottom,
                });
            }
            DisplayItem::Image { x, y, bottom, size } => {
                out.push(PaintCmd::DrawImage {
                    x: *x,
                    y: *y,
                    size: *size,
                    image_id: "openmoji/1F600.png",
                    top: *y,
                    bottom: *bottom,
                });
            }
        }
    }

    for child in &block.children {
        paint_block(child, out);
    }
}

/// Culls `cmds` to those intersecting the vertical viewport
/// `[scroll, scroll + viewport_height]`, per spec.md section 4.7.
pub fn visible<'a>(cmds: &'a [PaintCmd], scroll: f32, viewport_height: f32) -> impl Iterator<Item = &'a PaintCmd> {
    cmds.iter().filter(move |c| !(c.top() > scroll + viewport_height || c.bottom() < scroll))
}
