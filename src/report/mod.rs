//! Report rendering.

pub mod generator;

pub use generator::{render_storage, render_text, ReportMeta};
