pub mod glyph;
pub mod wrap;
