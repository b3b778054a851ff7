//! Rig construction: turn wrapped lines into anchors, bodies, spring
//! constraints, and display elements.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::EntryId;
use crate::core::physics::{
    BodyDesc, ColliderDesc, ColliderMaterial, PhysicsWorld, SpringDesc,
};
use crate::display::{DisplaySink, GlyphStyle};
use crate::rig::registry::{LineAnchor, RigEntry, RigRegistry};
use crate::rig::rescale::Viewport;
use crate::systems::wind::{self, Rng, WindConfig};
use crate::text::glyph::{measure_text, TextMetrics};
use crate::text::wrap::wrap;

/// Layout and material tuning for the rig.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Font size bounds: size shrinks with glyph count, never below min.
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub shrink_per_glyph: f32,
    /// Below this viewport width an extra reduction tier kicks in.
    pub narrow_width: f32,
    pub narrow_factor: f32,
    /// Vertical gap between lines, added to the glyph height.
    pub line_gap: f32,
    /// The rig never starts above this margin, and otherwise takes this
    /// fraction of the spare vertical room.
    pub top_margin: f32,
    pub top_fraction: f32,
    /// Horizontal inset of the text area on each side.
    pub side_margin: f32,
    /// Air friction while hanging (cloth-like drag) and once fallen.
    pub hang_damping: f32,
    pub fallen_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Density numerator: density = density_k / font_size^1.5. Smaller
    /// glyphs end up proportionally heavier, which keeps wind response
    /// readable across font sizes.
    pub density_k: f32,
    /// Spring constraint: soft, damped, with visible sag. `stiffness` is a
    /// floor; the builder raises it per glyph so the equilibrium stretch
    /// under gravity stays near `sag` pixels regardless of font size.
    pub stiffness: f32,
    pub sag: f32,
    pub spring_damping: f32,
    pub rest_length: f32,
    /// Vertical offset of the attachment point below the anchor line.
    pub anchor_drop: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            max_font_size: 96.0,
            min_font_size: 28.0,
            shrink_per_glyph: 2.0,
            narrow_width: 640.0,
            narrow_factor: 0.75,
            line_gap: 26.0,
            top_margin: 64.0,
            top_fraction: 0.25,
            side_margin: 24.0,
            hang_damping: 1.2,
            fallen_damping: 0.08,
            angular_damping: 0.6,
            restitution: 0.25,
            friction: 0.4,
            density_k: 1.0,
            stiffness: 30.0,
            sag: 6.0,
            spring_damping: 2.5,
            rest_length: 14.0,
            anchor_drop: 6.0,
        }
    }
}

/// Font size for a submission: monotonically shrinking with glyph count,
/// an extra tier on narrow viewports, floored at the configured minimum.
pub fn font_size_for(glyph_count: usize, viewport_width: f32, cfg: &RigConfig) -> f32 {
    let mut size = cfg.max_font_size - cfg.shrink_per_glyph * glyph_count as f32;
    if viewport_width < cfg.narrow_width {
        size *= cfg.narrow_factor;
    }
    size.max(cfg.min_font_size)
}

/// Glyph density for a font size. The exponent deliberately inverts naive
/// area scaling so small text is not flung around by gusts.
pub fn density_for(font_size: f32, cfg: &RigConfig) -> f32 {
    cfg.density_k / font_size.powf(1.5)
}

/// Vertical position of line `i`'s anchor.
fn line_slot_y(i: usize, start_y: f32, line_height: f32) -> f32 {
    start_y + i as f32 * line_height
}

/// Build a full rig for `text` into the registry: one sensor anchor per
/// wrapped line, one body + spring + element per glyph, then a settle-in
/// shake over everything new. Returns the number of entries created.
///
/// The caller clears the previous rig first; empty input simply builds
/// nothing.
#[allow(clippy::too_many_arguments)]
pub fn build(
    physics: &mut PhysicsWorld,
    registry: &mut RigRegistry,
    sink: &mut dyn DisplaySink,
    metrics: &dyn TextMetrics,
    rng: &mut Rng,
    text: &str,
    viewport: &Viewport,
    cfg: &RigConfig,
    wind_cfg: &WindConfig,
) -> usize {
    let glyph_count = text.chars().count();
    if glyph_count == 0 {
        return 0;
    }

    let font_size = font_size_for(glyph_count, viewport.width, cfg);
    let glyphs = measure_text(text, metrics, font_size);
    let max_width = (viewport.width - 2.0 * cfg.side_margin).max(1.0);
    let lines = wrap(&glyphs, max_width);

    let char_height = font_size;
    let line_height = char_height + cfg.line_gap;
    let rig_height = lines.len() as f32 * line_height;
    let start_y = cfg
        .top_margin
        .max((viewport.height - rig_height) * cfg.top_fraction);

    let center_x = viewport.width / 2.0;
    let gravity_mag = physics.gravity().length();
    let target_sag = cfg.sag.max(0.1);
    let density = density_for(font_size, cfg);
    let material = ColliderMaterial {
        restitution: cfg.restitution,
        friction: cfg.friction,
        density,
    };

    let mut new_bodies = Vec::with_capacity(glyph_count);

    for (line_idx, line) in lines.iter().enumerate() {
        let slot_y = line_slot_y(line_idx, start_y, line_height);

        let anchor_body = physics.create_body(
            EntryId::NONE,
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: viewport.width / 2.0,
                half_height: 2.0,
            })
            .with_position(Vec2::new(center_x, slot_y))
            .with_sensor(true),
            ColliderMaterial::default(),
        );
        registry.add_anchor(LineAnchor {
            line: line_idx,
            body: anchor_body,
        });

        // Center the line in the text area and walk the advances. The
        // trailing letter spacing is not rendered, so it must not bias
        // the run leftward.
        let mut run = (viewport.width - line.visual_width()) / 2.0;
        for glyph in &line.glyphs {
            let half = Vec2::new(glyph.width / 2.0, char_height / 2.0);
            let glyph_x = run + glyph.width / 2.0;
            run += glyph.advance;

            // Start at spring rest so the build itself adds no energy;
            // the settle-in shake below is the only initial motion.
            let glyph_y = slot_y + cfg.anchor_drop + cfg.rest_length + half.y;

            let id = registry.alloc_id();
            let body = physics.create_body(
                id,
                &BodyDesc::dynamic(ColliderDesc::Cuboid {
                    half_width: half.x,
                    half_height: half.y,
                })
                .with_position(Vec2::new(glyph_x, glyph_y))
                .with_linear_damping(cfg.hang_damping)
                .with_angular_damping(cfg.angular_damping),
                material,
            );

            // Stiffness follows the glyph's weight so every spring settles
            // near the same stretch; the configured value is only a floor
            // (it also carries zero-gravity worlds).
            let weight = physics.body_mass(&body).unwrap_or(0.0) * gravity_mag;
            let stiffness = cfg.stiffness.max(weight / target_sag);

            let anchor_local = Vec2::new(glyph_x - center_x, cfg.anchor_drop);
            let spring = physics.create_spring(
                &anchor_body,
                &body,
                &SpringDesc {
                    anchor_a: anchor_local,
                    anchor_b: Vec2::new(0.0, -half.y),
                    rest_length: cfg.rest_length,
                    stiffness,
                    damping: cfg.spring_damping,
                },
            );

            let element = sink.create_element(GlyphStyle {
                ch: glyph.ch,
                script: glyph.script,
                font_size,
                letter_spacing: glyph.script.letter_spacing(font_size),
            });

            new_bodies.push(body);
            registry.adopt(RigEntry {
                id,
                ch: glyph.ch,
                line: line_idx,
                body,
                element,
                constraint: Some(spring),
                anchor_local,
                rest_length: cfg.rest_length,
                stiffness,
                half,
            });
        }
    }

    wind::settle_in(physics, rng, &new_bodies, wind_cfg);
    log::info!(
        "built rig: {} glyphs on {} lines at {font_size}px",
        new_bodies.len(),
        lines.len()
    );
    new_bodies.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BufferSink;
    use crate::text::glyph::MonoMetrics;

    fn build_into(
        text: &str,
        viewport: Viewport,
    ) -> (PhysicsWorld, RigRegistry, BufferSink, usize) {
        let mut physics = PhysicsWorld::new(Vec2::new(0.0, 981.0));
        let mut registry = RigRegistry::new();
        let mut sink = BufferSink::new();
        let mut rng = Rng::new(7);
        let n = build(
            &mut physics,
            &mut registry,
            &mut sink,
            &MonoMetrics::default(),
            &mut rng,
            text,
            &viewport,
            &RigConfig::default(),
            &WindConfig::default(),
        );
        (physics, registry, sink, n)
    }

    #[test]
    fn font_size_shrinks_with_count_and_floors() {
        let cfg = RigConfig::default();
        let short = font_size_for(2, 1200.0, &cfg);
        let long = font_size_for(20, 1200.0, &cfg);
        assert!(short > long);
        assert_eq!(font_size_for(500, 1200.0, &cfg), cfg.min_font_size);
    }

    #[test]
    fn narrow_viewports_get_smaller_text() {
        let cfg = RigConfig::default();
        let wide = font_size_for(5, 1200.0, &cfg);
        let narrow = font_size_for(5, 400.0, &cfg);
        assert!(narrow < wide);
    }

    #[test]
    fn density_inverts_super_linearly() {
        let cfg = RigConfig::default();
        let small = density_for(28.0, &cfg);
        let large = density_for(96.0, &cfg);
        assert!(small > large);
        // Exponent 1.5: the ratio outpaces linear inversion.
        assert!(small / large > 96.0 / 28.0);
    }

    #[test]
    fn two_glyphs_one_line() {
        let (physics, registry, sink, n) =
            build_into("AB", Viewport::new(1200.0, 800.0));
        assert_eq!(n, 2);
        assert_eq!(registry.anchors().len(), 1);
        assert_eq!(registry.hanging().len(), 2);
        assert_eq!(physics.spring_count(), 2);
        assert_eq!(sink.element_count(), 2);
    }

    #[test]
    fn entries_pair_elements_one_to_one() {
        let (_, registry, sink, _) = build_into("hang", Viewport::new(1200.0, 800.0));
        for entry in registry.hanging() {
            let element = sink.get(entry.element).expect("element exists");
            assert_eq!(element.style.ch, entry.ch);
        }
    }

    #[test]
    fn glyph_positions_accumulate_left_to_right() {
        let (physics, registry, _, _) = build_into("abc", Viewport::new(1200.0, 800.0));
        let xs: Vec<f32> = registry
            .hanging()
            .iter()
            .map(|e| physics.body_position(&e.body).unwrap().0.x)
            .collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
        // And the run is centered on the viewport.
        let mid = (xs[0] + xs[2]) / 2.0;
        assert!((mid - 600.0).abs() < 1.0, "centered run, mid={mid}");
    }

    #[test]
    fn centering_ignores_trailing_letter_spacing() {
        let (physics, registry, _, _) = build_into("abc", Viewport::new(1200.0, 800.0));
        let entries = registry.hanging();
        let left = physics.body_position(&entries[0].body).unwrap().0.x
            - entries[0].half.x;
        let right = physics.body_position(&entries[2].body).unwrap().0.x
            + entries[2].half.x;
        assert!(
            (left - (1200.0 - right)).abs() < 1e-2,
            "side margins differ: left={left} right-margin={}",
            1200.0 - right
        );
    }

    #[test]
    fn spring_stiffness_follows_glyph_weight() {
        let (physics, registry, _, _) = build_into("AB", Viewport::new(1200.0, 800.0));
        let cfg = RigConfig::default();
        for entry in registry.hanging() {
            let weight = physics.body_mass(&entry.body).unwrap() * 981.0;
            assert!(entry.stiffness > cfg.stiffness);
            // Equilibrium stretch = weight / stiffness ≈ cfg.sag.
            let stretch = weight / entry.stiffness;
            assert!(
                (stretch - cfg.sag).abs() < 0.1,
                "stretch {stretch} vs sag {}",
                cfg.sag
            );
        }
    }

    #[test]
    fn long_text_wraps_onto_multiple_anchors() {
        let (_, registry, _, n) = build_into(
            "a long enough submission to need wrapping",
            Viewport::new(600.0, 800.0),
        );
        assert!(registry.anchors().len() >= 2);
        assert_eq!(n, registry.hanging().len());
        // Line indices are contiguous from zero.
        let max_line = registry.hanging().iter().map(|e| e.line).max().unwrap();
        assert_eq!(max_line + 1, registry.anchors().len());
    }

    #[test]
    fn rig_starts_below_the_top_margin() {
        let (physics, registry, _, _) = build_into("tall", Viewport::new(1200.0, 200.0));
        let cfg = RigConfig::default();
        for anchor in registry.anchors() {
            let (pos, _) = physics.body_position(&anchor.body).unwrap();
            assert!(pos.y >= cfg.top_margin - 1e-3);
        }
    }

    #[test]
    fn settle_in_leaves_no_body_perfectly_still() {
        let (physics, registry, _, _) = build_into("shake", Viewport::new(1200.0, 800.0));
        let moving = registry
            .hanging()
            .iter()
            .filter(|e| physics.velocity(&e.body).length() > 0.0)
            .count();
        assert_eq!(moving, registry.hanging().len());
    }

    #[test]
    fn empty_text_builds_nothing() {
        let (physics, registry, sink, n) = build_into("", Viewport::new(1200.0, 800.0));
        assert_eq!(n, 0);
        assert!(registry.hanging().is_empty());
        assert!(registry.anchors().is_empty());
        assert_eq!(physics.body_count(), 0);
        assert_eq!(sink.element_count(), 0);
    }
}
