use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

/// Fonts tried, in order, when no font file is configured.
pub fn system_font_candidates() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Windows\Fonts\arial.ttf",
            r"C:\Windows\Fonts\segoeui.ttf",
            r"C:\Windows\Fonts\calibri.ttf",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Geneva.ttf",
        ]
    } else {
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        ]
    };
    paths.iter().map(PathBuf::from).collect()
}

fn read_font(path: &Path) -> Result<FontVec> {
    let data = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(data).with_context(|| format!("parsing font {}", path.display()))
}

/// Loads the configured font, or the first usable system font.
pub fn load_font(configured: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = configured {
        return read_font(path);
    }

    for path in system_font_candidates() {
        if !path.is_file() {
            continue;
        }
        match read_font(&path) {
            Ok(font) => {
                log::debug!("Using font {}", path.display());
                return Ok(font);
            }
            Err(e) => log::warn!("Skipping font: {e:#}"),
        }
    }
    Err(anyhow!(
        "no usable font found; set display.font_path in the config"
    ))
}
