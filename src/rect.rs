//! A plain axis-aligned rectangle, shared by the layout tree and the paint
//! commands. Kept independent of any GUI toolkit's geometry type so the core
//! pipeline (layout.rs, paint.rs) has no `egui` dependency; the shell
//! converts to `egui::Rect` at the paint boundary.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect { left, top, right, bottom }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect { left: x, top: y, right: x + width, bottom: y + height }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}
