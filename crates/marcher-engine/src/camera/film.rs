/// Tone curve applied by the film pass after exposure.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ToneCurve {
    /// Narkowicz's fit of the ACES reference rendering transform.
    #[default]
    Aces,
    Reinhard,
    /// Clamp only.
    Linear,
}

impl ToneCurve {
    /// Shader-side selector.
    pub(crate) fn as_u32(self) -> u32 {
        match self {
            ToneCurve::Aces => 0,
            ToneCurve::Reinhard => 1,
            ToneCurve::Linear => 2,
        }
    }

    /// CPU reference of the shader curve, for a single linear channel.
    pub fn apply(self, x: f32) -> f32 {
        let x = x.max(0.0);
        match self {
            ToneCurve::Aces => {
                let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
                ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
            }
            ToneCurve::Reinhard => x / (1.0 + x),
            ToneCurve::Linear => x.min(1.0),
        }
    }
}

/// Settings for the final exposure / tone-map stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FilmSettings {
    /// Linear multiplier applied to scene radiance before the tone curve.
    pub sensitivity: f32,
    /// Display gamma. Only applied when the output target is not sRGB.
    pub gamma: f32,
    /// Fraction of blurred highlight energy added back. Zero disables bloom.
    pub bloom_strength: f32,
    /// Bloom kernel radius as a fraction of the output width.
    pub bloom_radius_fraction: f32,
    /// Darkening at the frame corners, `0..=1`.
    pub vignette: f32,
    pub tone_curve: ToneCurve,
}

impl Default for FilmSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            gamma: 2.2,
            bloom_strength: 0.05,
            bloom_radius_fraction: 0.01,
            vignette: 0.25,
            tone_curve: ToneCurve::Aces,
        }
    }
}

/// Thin-lens depth-of-field parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthOfFieldSettings {
    pub enabled: bool,
    /// Distance (positive, world units) to the plane in perfect focus.
    pub focus_distance: f32,
    /// Lens aperture radius in world units.
    pub lens_radius: f32,
    /// Largest blur radius, as a fraction of the viewport height.
    pub max_blur_fraction: f32,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_distance: 10.0,
            lens_radius: 0.1,
            max_blur_fraction: 0.02,
        }
    }
}

impl DepthOfFieldSettings {
    /// Blur radius in pixels of a point at camera-space `z` (negative in front).
    ///
    /// Thin lens: `r = A * |d - S| / (d * S) * f_px`, where `f_px` is the focal
    /// length in pixels for the given vertical field of view.
    pub fn circle_of_confusion_px(
        &self,
        z: f32,
        tan_half_fov_y: f32,
        viewport_height: f32,
    ) -> f32 {
        if !self.enabled || self.lens_radius <= 0.0 {
            return 0.0;
        }
        let d = (-z).max(1e-4);
        let s = self.focus_distance.max(1e-4);
        let focal_px = viewport_height / (2.0 * tan_half_fov_y.max(1e-6));
        let r = self.lens_radius * (d - s).abs() / (d * s) * focal_px;
        r.min(self.max_radius_px(viewport_height))
    }

    #[inline]
    pub fn max_radius_px(&self, viewport_height: f32) -> f32 {
        (self.max_blur_fraction * viewport_height).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAN_20: f32 = 0.363_970_23;

    #[test]
    fn coc_is_zero_at_focus() {
        let dof = DepthOfFieldSettings::default();
        let r = dof.circle_of_confusion_px(-dof.focus_distance, TAN_20, 500.0);
        assert!(r.abs() < 1e-5);
    }

    #[test]
    fn coc_grows_away_from_focus() {
        let dof = DepthOfFieldSettings {
            max_blur_fraction: 1.0,
            ..Default::default()
        };
        let near = dof.circle_of_confusion_px(-5.0, TAN_20, 500.0);
        let nearer = dof.circle_of_confusion_px(-2.0, TAN_20, 500.0);
        let far = dof.circle_of_confusion_px(-20.0, TAN_20, 500.0);
        assert!(nearer > near && near > 0.0);
        assert!(far > 0.0);
    }

    #[test]
    fn coc_is_clamped() {
        let dof = DepthOfFieldSettings::default();
        let r = dof.circle_of_confusion_px(-0.01, TAN_20, 500.0);
        assert_eq!(r, dof.max_radius_px(500.0));
        assert_eq!(r, 10.0);
    }

    #[test]
    fn disabled_dof_has_no_blur() {
        let dof = DepthOfFieldSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(dof.circle_of_confusion_px(-1.0, TAN_20, 500.0), 0.0);
    }

    #[test]
    fn tone_curves_stay_in_display_range() {
        for curve in [ToneCurve::Aces, ToneCurve::Reinhard, ToneCurve::Linear] {
            assert_eq!(curve.apply(0.0), 0.0);
            let hi = curve.apply(1.0e4);
            assert!(hi <= 1.0 && hi > 0.9, "{curve:?} -> {hi}");
            assert!(curve.apply(0.5) < curve.apply(1.0));
        }
    }

    #[test]
    fn tone_curve_selectors_are_distinct() {
        assert_ne!(ToneCurve::Aces.as_u32(), ToneCurve::Reinhard.as_u32());
        assert_ne!(ToneCurve::Reinhard.as_u32(), ToneCurve::Linear.as_u32());
    }
}
