use serde::{Deserialize, Serialize};

/// How the participant reads the sentences of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingCondition {
    OutLoud,
    Silently,
}

impl ReadingCondition {
    /// Alternates by block, starting with `OutLoud` for block 1.
    pub fn for_block(block: usize) -> Self {
        if block % 2 == 1 {
            ReadingCondition::OutLoud
        } else {
            ReadingCondition::Silently
        }
    }
}

/// Size class of a text stimulus; the display resolves it to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    Body,
    Cue,
    Fixation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStim {
    pub content: String,
    pub role: TextRole,
}

impl TextStim {
    pub fn body(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: TextRole::Body,
        }
    }

    pub fn cue(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: TextRole::Cue,
        }
    }

    pub fn fixation() -> Self {
        Self {
            content: "+".to_string(),
            role: TextRole::Fixation,
        }
    }
}

/// One full screen: background plus a single centered text stimulus.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Blank,
    Text(TextStim),
}

impl Screen {
    pub fn text(&self) -> Option<&str> {
        match self {
            Screen::Blank => None,
            Screen::Text(stim) => Some(&stim.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_alternates_from_out_loud() {
        let conditions: Vec<_> = (1..=4).map(ReadingCondition::for_block).collect();
        assert_eq!(
            conditions,
            vec![
                ReadingCondition::OutLoud,
                ReadingCondition::Silently,
                ReadingCondition::OutLoud,
                ReadingCondition::Silently,
            ]
        );
    }
}
