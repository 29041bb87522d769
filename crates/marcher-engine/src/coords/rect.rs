use super::Vec2;

/// Axis-aligned rectangle in physical pixels (top-left origin).
///
/// Used for shader domains: the full framebuffer, the visible viewport inside the
/// guard band, and the crop the film pass reads from.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle at the origin with the given size.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Width over height; `1.0` for degenerate rectangles.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.size.y > 0.0 { self.size.x / self.size.y } else { 1.0 }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// Shrinks the rectangle by `(dx, dy)` on every side. Never produces negative sizes.
    #[inline]
    pub fn inset(self, dx: f32, dy: f32) -> Rect {
        let w = (self.size.x - 2.0 * dx).max(0.0);
        let h = (self.size.y - 2.0 * dy).max(0.0);
        Rect::new(self.origin.x + dx, self.origin.y + dy, w, h)
    }

    /// Grows the rectangle by `(dx, dy)` on every side.
    #[inline]
    pub fn expand(self, dx: f32, dy: f32) -> Rect {
        self.inset(-dx, -dy)
    }

    /// `[x, y, w, h]`, the layout shader uniforms use.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.origin.x, self.origin.y, self.size.x, self.size.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(10.0, 10.0)));
    }

    // ── inset / expand ────────────────────────────────────────────────────

    #[test]
    fn inset_moves_origin_and_shrinks() {
        let i = r(0.0, 0.0, 100.0, 50.0).inset(8.0, 4.0);
        assert_eq!(i, r(8.0, 4.0, 84.0, 42.0));
    }

    #[test]
    fn inset_clamps_to_empty() {
        let i = r(0.0, 0.0, 10.0, 10.0).inset(20.0, 1.0);
        assert_eq!(i.width(), 0.0);
        assert!(i.is_empty());
    }

    #[test]
    fn expand_is_inverse_of_inset() {
        let base = r(16.0, 16.0, 780.0, 500.0);
        assert_eq!(base.expand(16.0, 16.0).inset(16.0, 16.0), base);
        assert_eq!(base.expand(16.0, 16.0), r(0.0, 0.0, 812.0, 532.0));
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn aspect_of_degenerate_rect_is_one() {
        assert_eq!(r(0.0, 0.0, 10.0, 0.0).aspect(), 1.0);
        assert!((r(0.0, 0.0, 780.0, 500.0).aspect() - 1.56).abs() < 1e-6);
    }

    #[test]
    fn center_and_to_array() {
        let rect = r(2.0, 4.0, 10.0, 20.0);
        assert_eq!(rect.center(), Vec2::new(7.0, 14.0));
        assert_eq!(rect.to_array(), [2.0, 4.0, 10.0, 20.0]);
    }
}
