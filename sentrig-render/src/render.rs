use crate::layout::{ScreenLayout, wrap_words};
use crate::text::{measure_line, render_text_pixmap};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{Context, Result};
use sentrig_core::{Screen, TextRole};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Color, Pixmap};

/// Draws full screens into an opaque RGBA canvas.
///
/// Rendered lines are cached per `(role, line)` so repeated screens (cues,
/// rest, fixation, countdown) only rasterize once per window size.
pub struct SkiaRenderer {
    layout: ScreenLayout,
    font: FontVec,
    background: [u8; 4],
    text_color: [u8; 4],
    canvas: Pixmap,
    line_cache: HashMap<(TextRole, String), Arc<Pixmap>>,
}

impl SkiaRenderer {
    pub fn new(
        width: u32,
        height: u32,
        font: FontVec,
        background: [u8; 4],
        text_color: [u8; 4],
    ) -> Result<Self> {
        let canvas = blank_canvas(width, height, background)?;
        Ok(Self {
            layout: ScreenLayout::new(width, height),
            font,
            background,
            text_color,
            canvas,
            line_cache: HashMap::new(),
        })
    }

    pub fn layout(&self) -> ScreenLayout {
        self.layout
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == self.layout.width && height == self.layout.height {
            return Ok(());
        }
        self.canvas = blank_canvas(width, height, self.background)?;
        self.layout = ScreenLayout::new(width, height);
        self.line_cache.clear();
        Ok(())
    }

    /// Redraws the canvas for `screen` and returns it. The background is
    /// opaque, so the premultiplied bytes are plain RGBA.
    pub fn render_screen(&mut self, screen: &Screen) -> &Pixmap {
        self.canvas.fill(color(self.background));
        if let Screen::Text(stim) = screen {
            self.draw_text_block(&stim.content, stim.role);
        }
        &self.canvas
    }

    /// RGBA bytes of the last rendered screen, row-major.
    pub fn frame_rgba(&self) -> &[u8] {
        self.canvas.data()
    }

    /// Wraps `text`, then stacks the lines so the block is centered on screen
    /// and each line is centered horizontally.
    fn draw_text_block(&mut self, text: &str, role: TextRole) {
        let size = self.layout.text_height(role);
        let font = &self.font;
        let lines = wrap_words(text, self.layout.wrap_width(), |s| {
            measure_line(font, s, size)
        });

        let line_height = {
            let sf = self.font.as_scaled(PxScale::from(size));
            sf.height() + sf.line_gap()
        };
        let block_height = line_height * lines.len() as f32;
        let (cx, cy) = self.layout.center();
        let top = cy - block_height / 2.0;

        for (i, line) in lines.into_iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some(pixmap) = self.line_pixmap(role, size, line) else {
                continue;
            };
            let y = top + line_height * i as f32 + pixmap.height() as f32 / 2.0;
            self.blit_centered(&pixmap, (cx, y));
        }
    }

    fn line_pixmap(&mut self, role: TextRole, size: f32, line: String) -> Option<Arc<Pixmap>> {
        let key = (role, line);
        if let Some(p) = self.line_cache.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(&key.1, size, &self.font, self.text_color)?);
        self.line_cache.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    /// Source-over blit of a premultiplied pixmap centered on `pos`, clipped
    /// to the canvas.
    fn blit_centered(&mut self, pixmap: &Pixmap, pos: (f32, f32)) {
        let w = pixmap.width() as i32;
        let h = pixmap.height() as i32;
        let x0 = (pos.0 - w as f32 * 0.5).floor() as i32;
        let y0 = (pos.1 - h as f32 * 0.5).floor() as i32;

        let canvas_w = self.canvas.width() as i32;
        let canvas_h = self.canvas.height() as i32;
        let dst_x_start = x0.max(0);
        let dst_y_start = y0.max(0);
        let dst_x_end = (x0 + w).min(canvas_w);
        let dst_y_end = (y0 + h).min(canvas_h);
        if dst_x_end <= dst_x_start || dst_y_end <= dst_y_start {
            return;
        }

        let src_x_start = (dst_x_start - x0) as usize;
        let src_y_start = (dst_y_start - y0) as usize;
        let max_w = (dst_x_end - dst_x_start) as usize;
        let max_h = (dst_y_end - dst_y_start) as usize;
        let (dst_x_start, dst_y_start) = (dst_x_start as usize, dst_y_start as usize);

        let src_data = pixmap.data();
        let pixmap_stride = pixmap.width() as usize;
        let canvas_stride = self.canvas.width() as usize;
        let dst_data = self.canvas.data_mut();

        for y in 0..max_h {
            for x in 0..max_w {
                let src_idx = ((src_y_start + y) * pixmap_stride + (src_x_start + x)) * 4;
                let sa = src_data[src_idx + 3] as u32;
                if sa == 0 {
                    continue;
                }
                let dst_idx = ((dst_y_start + y) * canvas_stride + (dst_x_start + x)) * 4;
                let inv_a = 255 - sa;
                for c in 0..4 {
                    let s = src_data[src_idx + c] as u32;
                    let d = dst_data[dst_idx + c] as u32;
                    dst_data[dst_idx + c] = (s + (d * inv_a + 127) / 255).min(255) as u8;
                }
            }
        }
    }
}

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

fn blank_canvas(width: u32, height: u32, background: [u8; 4]) -> Result<Pixmap> {
    let mut canvas = Pixmap::new(width.max(1), height.max(1))
        .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
    canvas.fill(color(background));
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::load_font;
    use sentrig_core::TextStim;

    const GREY: [u8; 4] = [128, 128, 128, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn renderer() -> Option<SkiaRenderer> {
        let font = load_font(None).ok()?;
        SkiaRenderer::new(640, 480, font, GREY, BLACK).ok()
    }

    fn dark_pixels(frame: &[u8]) -> Vec<(usize, usize)> {
        frame
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, px)| px[0] < 100)
            .map(|(i, _)| (i % 640, i / 640))
            .collect()
    }

    #[test]
    fn blank_screen_is_background_only() {
        let Some(mut r) = renderer() else { return };
        r.render_screen(&Screen::Blank);
        assert!(r.frame_rgba().chunks_exact(4).all(|px| px == GREY));
    }

    #[test]
    fn fixation_is_drawn_around_the_center() {
        let Some(mut r) = renderer() else { return };
        r.render_screen(&Screen::Text(TextStim::fixation()));
        let ink = dark_pixels(r.frame_rgba());
        assert!(!ink.is_empty());
        let (sx, sy) = ink
            .iter()
            .fold((0, 0), |(ax, ay), (x, y)| (ax + x, ay + y));
        let (mx, my) = (sx / ink.len(), sy / ink.len());
        assert!(mx.abs_diff(320) < 20, "x centroid {mx}");
        assert!(my.abs_diff(240) < 20, "y centroid {my}");
    }

    #[test]
    fn long_sentence_stays_within_wrap_width() {
        let Some(mut r) = renderer() else { return };
        let text = "A kaleidoscope of colors shifted within the stained-glass \
                    while the engineer tightened a bolt on the humming machine.";
        r.render_screen(&Screen::Text(TextStim::body(text)));
        let ink = dark_pixels(r.frame_rgba());
        let min_x = ink.iter().map(|p| p.0).min().unwrap();
        let max_x = ink.iter().map(|p| p.0).max().unwrap();
        assert!(max_x - min_x <= 330, "text spans {min_x}..{max_x}");
    }

    #[test]
    fn resize_reallocates_canvas() {
        let Some(mut r) = renderer() else { return };
        r.resize(800, 600).unwrap();
        assert_eq!(r.layout(), ScreenLayout::new(800, 600));
        assert_eq!(r.render_screen(&Screen::Blank).width(), 800);
    }
}
