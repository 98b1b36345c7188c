use sentrig_core::TextRole;

/// Pixel geometry derived from the window size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLayout {
    pub width: u32,
    pub height: u32,
}

impl ScreenLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Text height in pixels: body text is 1/30 of the screen height, cues
    /// 1.4x body, the fixation cross 1/20.
    pub fn text_height(&self, role: TextRole) -> f32 {
        let body = (self.height as f32 / 30.0).round().max(1.0);
        match role {
            TextRole::Body => body,
            TextRole::Cue => (body * 1.4).round(),
            TextRole::Fixation => (self.height as f32 / 20.0).round().max(1.0),
        }
    }

    /// Lines wrap at half the screen width.
    pub fn wrap_width(&self) -> f32 {
        self.width as f32 / 2.0
    }
}

/// Greedy word wrap. Explicit newlines are kept (blank lines included); a
/// word wider than `max_width` gets a line of its own.
pub fn wrap_words<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_words("The cat slept quietly on the sunny windowsill.", 16.0, chars);
        assert_eq!(lines, ["The cat slept", "quietly on the", "sunny", "windowsill."]);
        assert!(lines.iter().all(|l| chars(l) <= 16.0));
    }

    #[test]
    fn keeps_blank_lines_and_long_words() {
        let lines = wrap_words("Rest\n\nsupercalifragilistic ok", 5.0, chars);
        assert_eq!(lines, ["Rest", "", "supercalifragilistic", "ok"]);
    }

    #[test]
    fn sizes_follow_screen_height() {
        let layout = ScreenLayout::new(1920, 1080);
        assert_eq!(layout.text_height(TextRole::Body), 36.0);
        assert_eq!(layout.text_height(TextRole::Cue), 50.0);
        assert_eq!(layout.text_height(TextRole::Fixation), 54.0);
        assert_eq!(layout.wrap_width(), 960.0);
        assert_eq!(layout.center(), (960.0, 540.0));
    }
}
