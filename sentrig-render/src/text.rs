use ab_glyph::{Font, Glyph, PxScale, ScaleFont, point};
use tiny_skia::{Pixmap, PremultipliedColorU8};

fn layout_line<F: Font>(font: &F, text: &str, scale: PxScale) -> (Vec<Glyph>, f32) {
    let sf = font.as_scaled(scale);
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }
    (glyphs, pen_x)
}

/// Advance width of a single line at `font_size` pixels.
pub fn measure_line<F: Font>(font: &F, text: &str, font_size: f32) -> f32 {
    layout_line(font, text, PxScale::from(font_size)).1
}

/// Rasterizes one line of text into a transparent premultiplied pixmap sized
/// to the line's advance width and the font's line height. Returns `None` for
/// a zero-sized line.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);
    let (glyphs, advance) = layout_line(font, text, scale);

    let w = advance.ceil().max(1.0) as u32;
    let h = sf.height().ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let stride = w as usize;
    let dst = pm.pixels_mut();

    for g in glyphs {
        let Some(out) = font.outline_glyph(g) else {
            continue;
        };
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x).floor() as i32;
            let iy = (y as f32 + b.min.y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply by coverage * alpha, then source-over the existing
            // pixel so overlapping glyph edges accumulate.
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let premul = |c: u8| ((c as f32 * a) as u8).min(sa);
            let bg = dst[i];
            let inv = 1.0 - a;
            let over = |s: u8, d: u8| s.saturating_add((d as f32 * inv) as u8);

            let alpha = over(sa, bg.alpha());
            let px = PremultipliedColorU8::from_rgba(
                over(premul(color[0]), bg.red()).min(alpha),
                over(premul(color[1]), bg.green()).min(alpha),
                over(premul(color[2]), bg.blue()).min(alpha),
                alpha,
            );
            if let Some(px) = px {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}
