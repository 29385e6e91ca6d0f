//! Hit-test geometry for weapon shapes
//!
//! Weapons strike through four shapes: circles, forward cones, beams
//! (a half-line with a width) and oriented rectangles (orbiting blades).

use glam::Vec2;

/// Point inside (or on) a circle
#[inline]
pub fn in_circle(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance_squared(point) <= radius * radius
}

/// Target within `range` of `origin` and within the cone around `aim`
///
/// `cos_half_angle` is the cosine of the cone half-angle. A target exactly
/// on the origin is treated as lying along +x.
pub fn in_cone(origin: Vec2, aim: Vec2, target: Vec2, range: f32, cos_half_angle: f32) -> bool {
    let to_target = target - origin;
    let d2 = to_target.length_squared();
    if d2 > range * range {
        return false;
    }
    let len = d2.sqrt().max(0.001);
    (to_target / len).dot(aim) >= cos_half_angle
}

/// Position of a point relative to a beam
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamProjection {
    /// Distance along the beam direction (negative = behind the origin)
    pub along: f32,
    /// Unsigned distance from the beam's center line
    pub perp: f32,
}

/// Project `target` onto a beam starting at `origin` along unit `dir`
#[inline]
pub fn beam_projection(origin: Vec2, dir: Vec2, target: Vec2) -> BeamProjection {
    let rel = target - origin;
    BeamProjection {
        along: rel.dot(dir),
        perp: rel.dot(dir.perp()).abs(),
    }
}

/// A rectangle rotated in the plane
///
/// Local x runs across the width, local y along the length.
#[derive(Debug, Clone, Copy)]
pub struct OrientedRect {
    pub center: Vec2,
    pub half_width: f32,
    pub half_length: f32,
    cos_a: f32,
    sin_a: f32,
}

impl OrientedRect {
    /// Rectangle whose width axis points along `angle`
    pub fn new(center: Vec2, angle: f32, half_width: f32, half_length: f32) -> Self {
        Self {
            center,
            half_width,
            half_length,
            cos_a: angle.cos(),
            sin_a: angle.sin(),
        }
    }

    /// Blade reaching from `root` to `root + length` along `angle`
    pub fn blade(root: Vec2, angle: f32, length: f32, width: f32) -> Self {
        let tip = root + Vec2::from_angle(angle) * length;
        let center = (root + tip) * 0.5;
        Self::new(
            center,
            angle + std::f32::consts::FRAC_PI_2,
            width * 0.5,
            length * 0.5,
        )
    }

    /// Point in rectangle-local coordinates
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let d = point - self.center;
        Vec2::new(
            d.x * self.cos_a + d.y * self.sin_a,
            -d.x * self.sin_a + d.y * self.cos_a,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.half_width && local.y.abs() <= self.half_length
    }

    /// Squared distance from `point` to the closest point of the rectangle
    pub fn distance_squared(&self, point: Vec2) -> f32 {
        let local = self.to_local(point);
        let clamped = Vec2::new(
            local.x.clamp(-self.half_width, self.half_width),
            local.y.clamp(-self.half_length, self.half_length),
        );
        (local - clamped).length_squared()
    }

    /// Circle overlaps the rectangle
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.distance_squared(center) <= radius * radius
    }
}
