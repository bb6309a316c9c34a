//! Terminal UI built on ratatui.
//!
//! - `render`: frame layout and overlays
//! - `input`: keyboard handling
//! - `styles`: colours and text styles
//! - `tabs`: per-tab panels (scouts, programs, activities, ...)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
