pub mod font;
pub mod layout;
pub mod render;
pub mod text;

pub use font::{load_font, system_font_candidates};
pub use layout::{ScreenLayout, wrap_words};
pub use render::SkiaRenderer;
pub use text::{measure_line, render_text_pixmap};
