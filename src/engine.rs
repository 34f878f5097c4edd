//! The explicit, passed-around context that replaces the process-wide
//! globals of the original book project: viewport constants and the
//! response cache. The font cache lives separately, on the `FontMetrics`
//! implementation itself (`chrome::EguiFontMetrics`), since it is keyed
//! against the GUI toolkit's font system rather than anything `Engine` owns.
//!
//! Layout and paint are pure functions of the node tree plus this context;
//! a `Configure` event from the shell just updates the viewport fields here
//! and triggers a relayout, rather than mutating module-level statics.

use crate::cache::Cache;

/// Horizontal margin of the document inside the viewport, in pixels.
pub const HSTEP: f32 = 13.0;
/// Vertical margin of the document inside the viewport, in pixels.
pub const VSTEP: f32 = 18.0;
/// Default viewport width, in pixels.
pub const WIDTH: f32 = 800.0;
/// Default viewport height, in pixels.
pub const HEIGHT: f32 = 600.0;
/// Pixels advanced per scroll-down event.
pub const SCROLL_STEP: f32 = 100.0;

/// Process-wide (but explicit, not global) state threaded through the
/// pipeline: the viewport size the layout engine targets and the URL
/// response cache.
pub struct Engine {
    pub width: f32,
    pub height: f32,
    pub hstep: f32,
    pub vstep: f32,
    pub cache: Cache,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            hstep: HSTEP,
            vstep: VSTEP,
            cache: Cache::new(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Used by tests that want a narrower viewport than the 800x600 default,
    /// e.g. the soft-hyphen split scenario in spec.md section 8.
    pub fn with_viewport(width: f32, height: f32) -> Self {
        Self { width, height, ..Self::default() }
    }

    /// Used by tests that also need to override the document margins, e.g.
    /// spec.md section 8's soft-hyphen scenario ("given WIDTH=40, HSTEP=0").
    pub fn with_viewport_and_margins(width: f32, height: f32, hstep: f32, vstep: f32) -> Self {
        Self { width, height, hstep, vstep, cache: Cache::new() }
    }

    /// Handles a `Configure` event: the shell resizes, the engine's viewport
    /// follows, and the caller is expected to rerun layout afterward.
    pub fn configure(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Clamps a scroll offset to `[0, max(document_height + 2*vstep - height, 0)]`.
    pub fn clamp_scroll(&self, scroll: f32, document_height: f32) -> f32 {
        let max = (document_height + 2.0 * self.vstep - self.height).max(0.0);
        scroll.clamp(0.0, max)
    }
}
