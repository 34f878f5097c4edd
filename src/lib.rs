//! ZipSurf — a miniature browser engine: fetch, parse HTML, parse CSS,
//! resolve the cascade, build a block/inline layout tree, and emit paint
//! commands for a host canvas to draw.
//!
//! The document pipeline (`url`, `html_parser`, `css_parser`, `selector`,
//! `style`, `layout`, `paint`) has no dependency on any GUI toolkit; `chrome`,
//! `tab`, and `browser` are the `egui`/`eframe` shell that binds it to a
//! window.

pub mod browser;
pub mod cache;
pub mod chrome;
pub mod color;
pub mod css_parser;
pub mod engine;
pub mod error;
pub mod font;
pub mod html_parser;
pub mod layout;
pub mod node;
pub mod paint;
pub mod rect;
pub mod selector;
pub mod style;
pub mod tab;
pub mod url;
