//! Axis-aligned geometry for walls and entity bounds
//!
//! Everything in the arena that blocks movement is an axis-aligned rectangle;
//! entities are circles. These are the only two shapes the simulation tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle (origin at the top-left corner, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Square bounding box of a circle
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        )
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// Overlapping region, if the rectangles overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !rect_overlaps_rect(self, other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(Rect::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        ))
    }

    /// Clamp a point into the rectangle
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }
}

/// Circle vs rectangle overlap.
///
/// Clamps the circle centre into the rectangle and compares the squared
/// distance with `r²`. Touching is not overlapping.
#[inline]
pub fn rect_overlaps_circle(rect: &Rect, center: Vec2, radius: f32) -> bool {
    let closest = rect.clamp_point(center);
    closest.distance_squared(center) < radius * radius
}

/// Rectangle vs rectangle overlap (shared edges do not count)
#[inline]
pub fn rect_overlaps_rect(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_inside_rect() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect_overlaps_circle(&rect, Vec2::new(50.0, 50.0), 1.0));
    }

    #[test]
    fn test_circle_touching_edge_is_not_overlap() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Centre 10 units right of the right edge, radius exactly 10
        assert!(!rect_overlaps_circle(&rect, Vec2::new(110.0, 50.0), 10.0));
        assert!(rect_overlaps_circle(&rect, Vec2::new(109.9, 50.0), 10.0));
    }

    #[test]
    fn test_circle_near_corner() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Diagonal distance to corner is sqrt(50) ≈ 7.07
        assert!(!rect_overlaps_circle(&rect, Vec2::new(105.0, 105.0), 7.0));
        assert!(rect_overlaps_circle(&rect, Vec2::new(105.0, 105.0), 7.1));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(25.0, 25.0, 50.0, 50.0);
        let c = Rect::new(50.0, 0.0, 50.0, 50.0);
        assert!(rect_overlaps_rect(&a, &b));
        assert!(rect_overlaps_rect(&b, &a));
        // Shared edge only
        assert!(!rect_overlaps_rect(&a, &c));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(40.0, 30.0, 50.0, 50.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Rect::new(40.0, 30.0, 10.0, 20.0));
        assert_eq!(i.area(), 200.0);
        assert!(a.intersection(&Rect::new(50.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_around() {
        let r = Rect::around(Vec2::new(100.0, 100.0), 35.0);
        assert_eq!(r, Rect::new(65.0, 65.0, 70.0, 70.0));
        assert_eq!(r.center(), Vec2::new(100.0, 100.0));
    }
}
