//! The top-level `eframe::App`: owns the single open [`Tab`](crate::tab::Tab),
//! the [`Engine`] context, and the `egui`-backed font metrics, and turns
//! frame events (resize, scroll, click) into the operations spec.md section 6
//! names.

use eframe::egui;

use crate::chrome::{self, EguiFontMetrics};
use crate::color::Color;
use crate::engine::Engine;
use crate::paint::{self, PaintCmd};
use crate::tab::Tab;
use crate::url::Url;

pub struct Browser {
    engine: Engine,
    fonts: EguiFontMetrics,
    tab: Tab,
    last_width: f32,
    last_height: f32,
}

impl Browser {
    /// Builds the initial window state and loads `start_url` into the one
    /// tab this browser opens with.
    pub fn new(cc: &eframe::CreationContext<'_>, start_url: Url) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let engine = Engine::new();
        let mut fonts = EguiFontMetrics::new(cc.egui_ctx.clone());
        let mut tab = Tab::new();
        tab.load(start_url, &engine);
        tab.ensure_layout(&engine, &mut fonts);

        Browser { engine, fonts, tab, last_width: engine.width, last_height: engine.height }
    }
}

impl eframe::App for Browser {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let screen = ctx.screen_rect();
        let (w, h) = (screen.width(), screen.height());
        if (w - self.last_width).abs() > 0.5 || (h - self.last_height).abs() > 0.5 {
            self.engine.configure(w, h);
            self.tab.invalidate_layout();
            self.last_width = w;
            self.last_height = h;
        }

        chrome::show_address_bar(ctx, self.tab.url.as_ref().map(|u| u.canonical()).unwrap_or_default().as_str());

        self.tab.ensure_layout(&self.engine, &mut self.fonts);

        let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_delta < -1.0 {
            self.tab.scroll_down(&self.engine);
        }

        let mut click_at = None;
        ctx.input(|i| {
            if let Some(pos) = i.pointer.press_origin() {
                if i.pointer.primary_released() {
                    click_at = Some(pos);
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let origin = ui.min_rect().min;
            if let Some(pos) = click_at {
                let doc_x = pos.x - origin.x;
                let doc_y = pos.y - origin.y + self.tab.scroll;
                self.tab.click(doc_x, doc_y, &self.engine);
                self.tab.ensure_layout(&self.engine, &mut self.fonts);
            }

            let painter = ui.painter();
            let viewport_height = self.engine.height;
            for cmd in paint::visible(self.tab.paint_cmds(), self.tab.scroll, viewport_height) {
                draw_command(painter, cmd, origin, self.tab.scroll, &self.fonts);
            }
        });

        if scroll_delta.abs() > 0.01 {
            ctx.request_repaint();
        }
    }
}

fn draw_command(painter: &egui::Painter, cmd: &PaintCmd, origin: egui::Pos2, scroll: f32, fonts: &EguiFontMetrics) {
    match cmd {
        PaintCmd::DrawRect { rect, color, .. } => {
            let r = egui::Rect::from_min_max(
                egui::pos2(origin.x + rect.left, origin.y + rect.top - scroll),
                egui::pos2(origin.x + rect.right, origin.y + rect.bottom - scroll),
            );
            painter.rect_filled(r, 0.0, to_color32(*color));
        }
        PaintCmd::DrawText { x, y, text, font, color, .. } => {
            painter.text(
                egui::pos2(origin.x + x, origin.y + y - scroll),
                egui::Align2::LEFT_TOP,
                text,
                fonts.egui_font(*font),
                to_color32(*color),
            );
        }
        PaintCmd::DrawImage { x, y, size, .. } => {
            // No bundled emoji atlas ships with this project; draw a
            // placeholder glyph box so the layout is still visibly correct.
            let r = egui::Rect::from_min_size(
                egui::pos2(origin.x + x, origin.y + y - scroll),
                egui::vec2(*size, *size),
            );
            painter.rect_stroke(r, 2.0, egui::Stroke::new(1.0, egui::Color32::GRAY), egui::StrokeKind::Middle);
        }
    }
}

fn to_color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}
