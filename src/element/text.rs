use serde::{Deserialize, Serialize};

use super::common::GLYPH_WIDTH_RATIO;

/// Text of a text-bearing container plus its line layout.
///
/// The layout depends on the text, the box width and the font size, so it is
/// recomputed through [`TextContent::set_text`] and [`TextContent::relayout`]
/// rather than patched in place.
///
/// Line breaks come from a fixed average glyph width, so [`TextContent::lines`]
/// is an estimate for sizing; a host painting glyphs with proportional fonts
/// wraps [`TextContent::text`] with its own font metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextContent {
    text: String,
    #[serde(skip)]
    lines: Vec<String>,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), lines: Vec::new() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn set_text(&mut self, text: String, width: f32, font_size: f32) -> String {
        let old = std::mem::replace(&mut self.text, text);
        self.relayout(width, font_size);
        old
    }

    /// Greedy word wrap into lines that fit `width`.
    pub(crate) fn relayout(&mut self, width: f32, font_size: f32) {
        let glyph = (font_size * GLYPH_WIDTH_RATIO).max(1.0);
        let max_chars = ((width / glyph).floor() as usize).max(1);
        self.lines.clear();
        for paragraph in self.text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split(' ') {
                let needed = if line.is_empty() { word.chars().count() } else { line.chars().count() + 1 + word.chars().count() };
                if needed > max_chars && !line.is_empty() {
                    self.lines.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            }
            self.lines.push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_on_word_boundaries() {
        let mut text = TextContent::new("");
        // roughly 10 px glyphs in a 55 px box: 5 characters per line
        text.set_text("ab cd ef".to_string(), 55.0, 10.0 / GLYPH_WIDTH_RATIO);
        assert_eq!(text.lines(), ["ab cd", "ef"]);
    }

    #[test]
    fn test_keeps_explicit_line_breaks() {
        let mut text = TextContent::new("");
        text.set_text("one\ntwo".to_string(), 500.0, 12.0);
        assert_eq!(text.lines(), ["one", "two"]);
    }
}
