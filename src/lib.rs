//! Placeholder image generation
//!
//! Produces solid-color PNG mock assets labelled with their own size.

pub mod color;
pub mod font;
pub mod placeholder;

pub use color::{resolve_color, ColorDiagnostic, ColorResolution, ColorResolver, ColorTable};
pub use font::{BitmapFont, SpleenFont, SpleenSize};
pub use placeholder::{
    generate_placeholder, render_placeholder, save_png, write_png, FitOptions, PlaceholderConfig,
};
