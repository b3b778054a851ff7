//! Greedy line wrapping over measured glyph advances.

use crate::text::glyph::Glyph;

/// An ordered run of glyphs that fits (or is a single oversized glyph).
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub glyphs: Vec<Glyph>,
}

impl Line {
    /// Sum of glyph advances, i.e. the laid-out width of the line.
    pub fn width(&self) -> f32 {
        self.glyphs.iter().map(|g| g.advance).sum()
    }

    /// Width for centering: the trailing glyph's letter spacing is never
    /// rendered, so it is excluded.
    pub fn visual_width(&self) -> f32 {
        match self.glyphs.last() {
            Some(last) => self.width() - (last.advance - last.width),
            None => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Greedy wrap: walk glyphs in order, closing the current line only when
/// it is non-empty and the next glyph would overflow `max_width`. A glyph
/// wider than `max_width` gets a line of its own — glyphs are never split,
/// so every line holds at least one and every glyph lands in exactly one
/// line, in order. No hyphenation, no whitespace collapsing.
pub fn wrap(glyphs: &[Glyph], max_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();
    let mut run = 0.0;

    for &glyph in glyphs {
        if !current.is_empty() && run + glyph.advance > max_width {
            lines.push(Line {
                glyphs: std::mem::take(&mut current),
            });
            run = 0.0;
        }
        run += glyph.advance;
        current.push(glyph);
    }
    if !current.is_empty() {
        lines.push(Line { glyphs: current });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::glyph::Script;

    fn fixed(ch: char, advance: f32) -> Glyph {
        Glyph {
            ch,
            script: Script::Latin,
            width: advance,
            advance,
        }
    }

    fn run(text: &str, advance: f32, max_width: f32) -> Vec<Line> {
        let glyphs: Vec<Glyph> = text.chars().map(|c| fixed(c, advance)).collect();
        wrap(&glyphs, max_width)
    }

    #[test]
    fn empty_input_produces_no_lines() {
        assert!(wrap(&[], 100.0).is_empty());
    }

    #[test]
    fn fits_on_one_line() {
        let lines = run("abc", 10.0, 100.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 3);
    }

    #[test]
    fn greedy_fit_is_exact() {
        // 10 glyphs of 10 at max 35 → 3,3,3,1
        let lines = run("abcdefghij", 10.0, 35.0);
        let lens: Vec<usize> = lines.iter().map(|l| l.len()).collect();
        assert_eq!(lens, vec![3, 3, 3, 1]);
    }

    #[test]
    fn exact_fill_does_not_spill() {
        let lines = run("abcd", 10.0, 40.0);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].width() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn oversized_glyph_gets_its_own_line() {
        let glyphs = vec![fixed('a', 10.0), fixed('W', 200.0), fixed('b', 10.0)];
        let lines = wrap(&glyphs, 50.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].glyphs[0].ch, 'W');
        assert_eq!(lines[1].len(), 1);
    }

    #[test]
    fn concatenation_round_trips() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = run(text, 12.0, 100.0);
        let rebuilt: String = lines
            .iter()
            .flat_map(|l| l.glyphs.iter().map(|g| g.ch))
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn non_final_lines_respect_max_width() {
        let lines = run("aaaaaaaaaaaaaaaaaaaaaaaa", 9.0, 50.0);
        for line in &lines[..lines.len() - 1] {
            assert!(line.width() <= 50.0 + 1e-4, "line width {}", line.width());
        }
    }

    #[test]
    fn visual_width_drops_only_the_trailing_spacing() {
        let spaced = Glyph {
            ch: 'a',
            script: Script::Latin,
            width: 10.0,
            advance: 12.0,
        };
        let line = Line {
            glyphs: vec![spaced, spaced, spaced],
        };
        assert!((line.width() - 36.0).abs() < 1e-4);
        assert!((line.visual_width() - 34.0).abs() < 1e-4);
        assert_eq!(Line { glyphs: vec![] }.visual_width(), 0.0);
    }

    #[test]
    fn spaces_occupy_slots() {
        let lines = run("a  b", 10.0, 1000.0);
        assert_eq!(lines[0].len(), 4);
    }
}
