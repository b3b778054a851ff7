//! Glyph measurement: script classification and the text-metrics oracle.
//!
//! The rig never inspects characters anywhere else — script decides both
//! the font family a host should style with and whether letter spacing is
//! added, and that decision is made exactly once, here.

/// Closed script classification for a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Latin-ish: anything that is not Hangul. Proportional, letter-spaced.
    Latin,
    /// Hangul syllables and jamo. Square full-width blocks, no extra spacing.
    Hangul,
}

impl Script {
    /// Classify one Unicode scalar.
    pub fn of(ch: char) -> Script {
        match ch as u32 {
            0x1100..=0x11FF   // Hangul Jamo
            | 0x3130..=0x318F // Hangul Compatibility Jamo
            | 0xA960..=0xA97F // Hangul Jamo Extended-A
            | 0xAC00..=0xD7A3 // Hangul Syllables
            | 0xD7B0..=0xD7FF // Hangul Jamo Extended-B
            => Script::Hangul,
            _ => Script::Latin,
        }
    }

    /// Font family a display host should use for this script.
    pub fn font_family(self) -> &'static str {
        match self {
            Script::Latin => "serif",
            Script::Hangul => "'Nanum Myeongjo', serif",
        }
    }

    /// Extra advance added between glyphs of this script.
    pub fn letter_spacing(self, font_size: f32) -> f32 {
        match self {
            Script::Latin => font_size * 0.06,
            Script::Hangul => 0.0,
        }
    }
}

/// A measured character, immutable for one rig generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub script: Script,
    /// Rendered box width in pixels.
    pub width: f32,
    /// Horizontal advance: width plus script letter spacing.
    pub advance: f32,
}

/// The text-metrics oracle: rendered advance width of one character.
/// Must be deterministic for fixed inputs; the wrapper and builder are
/// deterministic given that.
pub trait TextMetrics {
    fn measure(&self, ch: char, script: Script, font_size: f32) -> f32;
}

/// Built-in oracle with fixed per-script width factors. Good enough for
/// headless use and tests; hosts with a real rasterizer implement
/// `TextMetrics` themselves.
#[derive(Debug, Clone, Copy)]
pub struct MonoMetrics {
    pub latin_factor: f32,
    pub hangul_factor: f32,
}

impl Default for MonoMetrics {
    fn default() -> Self {
        Self {
            latin_factor: 0.55,
            hangul_factor: 1.0,
        }
    }
}

impl TextMetrics for MonoMetrics {
    fn measure(&self, _ch: char, script: Script, font_size: f32) -> f32 {
        match script {
            Script::Latin => font_size * self.latin_factor,
            Script::Hangul => font_size * self.hangul_factor,
        }
    }
}

/// Measure every character of `text` at the given font size. Spaces are
/// glyphs like any other — they hang from the line too.
pub fn measure_text(text: &str, metrics: &dyn TextMetrics, font_size: f32) -> Vec<Glyph> {
    text.chars()
        .map(|ch| {
            let script = Script::of(ch);
            let width = metrics.measure(ch, script, font_size);
            Glyph {
                ch,
                script,
                width,
                advance: width + script.letter_spacing(font_size),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_hangul_and_latin() {
        assert_eq!(Script::of('한'), Script::Hangul);
        assert_eq!(Script::of('글'), Script::Hangul);
        assert_eq!(Script::of('ㄱ'), Script::Hangul);
        assert_eq!(Script::of('A'), Script::Latin);
        assert_eq!(Script::of(' '), Script::Latin);
        assert_eq!(Script::of('é'), Script::Latin);
    }

    #[test]
    fn only_latin_gets_letter_spacing() {
        assert!(Script::Latin.letter_spacing(100.0) > 0.0);
        assert_eq!(Script::Hangul.letter_spacing(100.0), 0.0);
    }

    #[test]
    fn measure_text_keeps_every_char() {
        let glyphs = measure_text("a b", &MonoMetrics::default(), 100.0);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[1].ch, ' ');
        // Latin advance = width + spacing
        assert!((glyphs[0].advance - (55.0 + 6.0)).abs() < 1e-4);
    }

    #[test]
    fn hangul_is_wider_than_latin() {
        let m = MonoMetrics::default();
        let han = m.measure('한', Script::Hangul, 80.0);
        let lat = m.measure('x', Script::Latin, 80.0);
        assert!(han > lat);
    }
}
