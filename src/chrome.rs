//! The GUI-toolkit side of the `FontMetrics` capability (spec.md section 6),
//! plus the thin address-bar strip drawn above the page.
//!
//! Font rasterization and glyph metrics are named in spec.md section 1 as an
//! external collaborator the core layout engine only consumes through a
//! trait; this module is that trait's one implementation, backed by
//! `egui`'s font system (the teacher's `tab.rs`/`layout.rs` measured text the
//! same way, via `Context::fonts_mut`/`layout_no_wrap`).

use std::collections::HashMap;

use egui::FontFamily;

use crate::font::{FontId, FontMetrics, FontStyle, FontWeight};

struct CachedFont {
    egui_id: egui::FontId,
    ascent: f32,
    descent: f32,
}

/// Turns `(size, weight, style)` triples into `egui::FontId`s and caches
/// their metrics, matching spec.md section 5's "fonts are cached in a
/// process-wide map keyed by (size, weight, style)".
///
/// `egui`'s bundled font data ships a single face per family; without an
/// embedded bold/italic asset (none is provided in this project) there is no
/// distinct glyph outline to select, so every weight/style renders with the
/// default proportional face at the requested pixel size. The cache still
/// keys on the full triple and returns distinct `FontId`s, so layout's line
/// breaking and the `<b>`/`<i>`/`<sup>`/`<abbr>` handling are unaffected —
/// only the rendered glyph shape is unaffected by weight/style.
pub struct EguiFontMetrics {
    ctx: egui::Context,
    by_key: HashMap<(i32, FontWeight, FontStyle), FontId>,
    by_id: HashMap<u64, CachedFont>,
    next_id: u64,
}

impl EguiFontMetrics {
    pub fn new(ctx: egui::Context) -> Self {
        EguiFontMetrics { ctx, by_key: HashMap::new(), by_id: HashMap::new(), next_id: 0 }
    }

    fn egui_id(&self, font: FontId) -> egui::FontId {
        self.by_id
            .get(&font.0)
            .map(|c| c.egui_id.clone())
            .unwrap_or_else(|| egui::FontId::new(16.0, FontFamily::Proportional))
    }

    /// The `egui::FontId` a previously-cached [`FontId`] maps to, for the
    /// shell to draw with the same face/size the layout engine measured.
    pub fn egui_font(&self, font: FontId) -> egui::FontId {
        self.egui_id(font)
    }
}

impl FontMetrics for EguiFontMetrics {
    fn get_font(&mut self, size: i32, weight: FontWeight, style: FontStyle) -> FontId {
        let key = (size, weight, style);
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }

        let egui_id = egui::FontId::new(size.max(1) as f32, FontFamily::Proportional);
        let sample = self.ctx.fonts_mut(|f| f.layout_no_wrap("Hg".to_string(), egui_id.clone(), egui::Color32::BLACK));
        let (ascent, descent) = sample
            .rows
            .first()
            .and_then(|row| row.glyphs.first())
            .map(|g| (g.font_ascent, g.font_height - g.font_ascent))
            .unwrap_or((size as f32 * 0.8, size as f32 * 0.2));

        let id = FontId(self.next_id);
        self.next_id += 1;
        self.by_key.insert(key, id);
        self.by_id.insert(id.0, CachedFont { egui_id, ascent, descent });
        id
    }

    fn measure(&mut self, font: FontId, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let egui_id = self.egui_id(font);
        let galley = self.ctx.fonts_mut(|f| f.layout_no_wrap(text.to_string(), egui_id, egui::Color32::BLACK));
        galley.size().x
    }

    fn ascent(&mut self, font: FontId) -> f32 {
        self.by_id.get(&font.0).map(|c| c.ascent).unwrap_or(16.0)
    }

    fn descent(&mut self, font: FontId) -> f32 {
        self.by_id.get(&font.0).map(|c| c.descent).unwrap_or(4.0)
    }
}

/// Draws the read-only address strip above the page. There is no navigation
/// UI beyond following links (spec.md names forms and JS out of scope); this
/// just orients the user to which URL is loaded.
pub fn show_address_bar(ctx: &egui::Context, url: &str) {
    egui::TopBottomPanel::top("chrome_address_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(url).monospace());
        });
    });
}
