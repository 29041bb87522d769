use winit::dpi::PhysicalSize;

use super::{GpuInit, SurfaceErrorAction};

/// Picks the swapchain format.
///
/// 8-bit formats come first because screenshots read the surface back as
/// RGBA8/BGRA8. sRGB variants are preferred when `prefer_srgb` is set.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as F;

    let srgb = [F::Bgra8UnormSrgb, F::Rgba8UnormSrgb];
    let linear = [F::Bgra8Unorm, F::Rgba8Unorm];
    let (first, second) = if prefer_srgb {
        (srgb, linear)
    } else {
        (linear, srgb)
    };

    first
        .into_iter()
        .chain(second)
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        requested
    } else {
        log::warn!("present mode {requested:?} unsupported; falling back to Fifo");
        wgpu::PresentMode::Fifo
    }
}

/// Configuration for a freshly created surface, or `None` when the surface
/// exposes no formats at all.
pub(crate) fn initial_config(
    caps: &wgpu::SurfaceCapabilities,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = choose_surface_format(caps, init.prefer_srgb)?;
    Some(wgpu::SurfaceConfiguration {
        usage: choose_usage(caps),
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: choose_present_mode(caps, init.present_mode),
        alpha_mode: choose_alpha_mode(caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}

/// Surface usage: always a render attachment, plus `COPY_SRC` when the
/// platform allows reading back presented frames (screenshots).
pub(crate) fn choose_usage(caps: &wgpu::SurfaceCapabilities) -> wgpu::TextureUsages {
    let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if caps.usages.contains(wgpu::TextureUsages::COPY_SRC) {
        usage |= wgpu::TextureUsages::COPY_SRC;
    }
    usage
}

/// A 0x0 surface cannot be configured; only the tracked size is updated and
/// configuration waits for the next non-empty resize.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

/// What the runtime should do about a failed frame acquisition.
pub(crate) fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    let action = classify_surface_error(&err);
    if action == SurfaceErrorAction::Reconfigured && size.width > 0 && size.height > 0 {
        surface.configure(device, config);
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat]) -> wgpu::SurfaceCapabilities {
        let mut caps = wgpu::SurfaceCapabilities::default();
        caps.formats = formats.to_vec();
        caps.present_modes = vec![wgpu::PresentMode::Fifo];
        caps.alpha_modes = vec![wgpu::CompositeAlphaMode::Opaque];
        caps.usages = wgpu::TextureUsages::RENDER_ATTACHMENT;
        caps
    }

    #[test]
    fn prefers_srgb_then_linear_8bit() {
        use wgpu::TextureFormat as F;
        let c = caps(&[F::Rgba16Float, F::Bgra8Unorm, F::Bgra8UnormSrgb]);
        assert_eq!(choose_surface_format(&c, true), Some(F::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&c, false), Some(F::Bgra8Unorm));

        let hdr_only = caps(&[F::Rgba16Float]);
        assert_eq!(choose_surface_format(&hdr_only, true), Some(F::Rgba16Float));
        assert_eq!(choose_surface_format(&caps(&[]), true), None);
    }

    #[test]
    fn initial_config_clamps_size_and_keeps_latency() {
        let c = caps(&[wgpu::TextureFormat::Rgba8UnormSrgb]);
        let init = GpuInit::default();
        let config = initial_config(&c, &init, PhysicalSize::new(780, 0)).unwrap();
        assert_eq!((config.width, config.height), (780, 1));
        assert_eq!(config.format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(config.desired_maximum_frame_latency, init.desired_maximum_frame_latency);
        assert!(initial_config(&caps(&[]), &init, PhysicalSize::new(1, 1)).is_none());
    }

    #[test]
    fn copy_src_only_when_supported() {
        let mut c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert!(!choose_usage(&c).contains(wgpu::TextureUsages::COPY_SRC));

        c.usages |= wgpu::TextureUsages::COPY_SRC;
        assert!(choose_usage(&c).contains(wgpu::TextureUsages::COPY_SRC));
    }

    #[test]
    fn unsupported_modes_fall_back() {
        let c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Fifo
        );
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
    }

    #[test]
    fn surface_errors_classified() {
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigured
        );
        assert!(classify_surface_error(&wgpu::SurfaceError::OutOfMemory).is_fatal());
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
    }
}
