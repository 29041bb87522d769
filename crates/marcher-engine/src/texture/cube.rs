use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbaImage;

use super::data::{list_paths, search_paths};
use super::mip::{build_mip_chain, upload_mip_chain};
use super::texture::TextureEncoding;

/// File naming scheme for the six faces of a cube map, with the mirroring
/// each face needs to land in wgpu's cube orientation.
///
/// Faces are always listed in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeMapConvention {
    /// `+x`, `-x`, `+y`, `-y`, `+z`, `-z`
    G3D,
    /// `PX`, `NX`, `PY`, `NY`, `PZ`, `NZ`
    DirectX,
    /// `rt`, `lf`, `up`, `dn`, `bk`, `ft`
    Quake,
    /// `east`, `west`, `up`, `down`, `north`, `south`
    Unreal,
}

impl CubeMapConvention {
    pub const ALL: [CubeMapConvention; 4] = [
        CubeMapConvention::G3D,
        CubeMapConvention::DirectX,
        CubeMapConvention::Quake,
        CubeMapConvention::Unreal,
    ];

    pub fn face_names(self) -> [&'static str; 6] {
        match self {
            CubeMapConvention::G3D => ["+x", "-x", "+y", "-y", "+z", "-z"],
            CubeMapConvention::DirectX => ["PX", "NX", "PY", "NY", "PZ", "NZ"],
            CubeMapConvention::Quake => ["rt", "lf", "up", "dn", "bk", "ft"],
            CubeMapConvention::Unreal => ["east", "west", "up", "down", "north", "south"],
        }
    }

    /// Per-face mirroring applied before upload, in face order.
    ///
    /// G3D and DirectX sets are authored in the GPU orientation. Quake sets
    /// are mirrored horizontally; Unreal sets mirror east/up/down/south
    /// horizontally and west/north vertically.
    pub fn face_orientations(self) -> [FaceOrientation; 6] {
        use FaceOrientation as O;
        match self {
            CubeMapConvention::G3D | CubeMapConvention::DirectX => [O::IDENTITY; 6],
            CubeMapConvention::Quake => [O::FLIP_X; 6],
            CubeMapConvention::Unreal => [
                O::FLIP_X,
                O::FLIP_Y,
                O::FLIP_X,
                O::FLIP_X,
                O::FLIP_Y,
                O::FLIP_X,
            ],
        }
    }

    /// Replaces the `*` in the file name of `pattern` with each face name.
    pub fn expand(self, pattern: &Path) -> Result<[PathBuf; 6]> {
        let file_name = pattern
            .file_name()
            .and_then(|f| f.to_str())
            .with_context(|| format!("cube map pattern {} has no file name", pattern.display()))?;
        if file_name.matches('*').count() != 1 {
            bail!(
                "cube map pattern {} must contain exactly one `*`",
                pattern.display()
            );
        }

        Ok(self
            .face_names()
            .map(|face| pattern.with_file_name(file_name.replacen('*', face, 1))))
    }

    /// First convention for which all six face files exist.
    pub fn detect(pattern: &Path) -> Option<CubeMapConvention> {
        Self::ALL.into_iter().find(|convention| {
            convention
                .expand(pattern)
                .map(|faces| faces.iter().all(|p| p.is_file()))
                .unwrap_or(false)
        })
    }
}

/// Mirroring of one face image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceOrientation {
    pub flip_x: bool,
    pub flip_y: bool,
}

impl FaceOrientation {
    pub const IDENTITY: Self = Self {
        flip_x: false,
        flip_y: false,
    };
    pub const FLIP_X: Self = Self {
        flip_x: true,
        flip_y: false,
    };
    pub const FLIP_Y: Self = Self {
        flip_x: false,
        flip_y: true,
    };

    pub fn apply(self, image: &mut RgbaImage) {
        if self.flip_x {
            image::imageops::flip_horizontal_in_place(image);
        }
        if self.flip_y {
            image::imageops::flip_vertical_in_place(image);
        }
    }
}

/// First search location for `pattern` that holds a complete face set.
///
/// Every location is checked, so a stray match in an earlier root does not
/// hide a complete set further down the list.
fn resolve_face_set(pattern: &str, roots: &[PathBuf]) -> Result<(PathBuf, CubeMapConvention)> {
    CubeMapConvention::G3D.expand(Path::new(pattern))?;

    let searched = search_paths(pattern, roots);
    for path in &searched {
        if let Some(convention) = CubeMapConvention::detect(path) {
            log::debug!("cube map `{pattern}` -> {} ({convention:?})", path.display());
            return Ok((path.clone(), convention));
        }
    }
    bail!(
        "no complete face set for cube map `{pattern}` (tried G3D, DirectX, Quake, Unreal names); searched:\n{}",
        list_paths(&searched)
    );
}

/// Six-faced environment texture with a full mip chain.
#[derive(Debug)]
pub struct CubeMap {
    pub texture: wgpu::Texture,
    /// View with `Cube` dimension, ready for `texture_cube<f32>` bindings.
    pub view: wgpu::TextureView,
    width: u32,
    mip_levels: u32,
    convention: CubeMapConvention,
}

impl CubeMap {
    /// Resolves `pattern` against the data directories, detects the face
    /// convention and uploads all six faces.
    pub fn from_pattern(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pattern: &str,
        data_directories: &[PathBuf],
        encoding: TextureEncoding,
    ) -> Result<Self> {
        let (resolved, convention) = resolve_face_set(pattern, data_directories)?;
        let paths = convention.expand(&resolved)?;

        let mut faces = Vec::with_capacity(6);
        for (path, orientation) in paths.iter().zip(convention.face_orientations()) {
            let mut face = image::open(path)
                .with_context(|| format!("failed to decode cube map face {}", path.display()))?
                .to_rgba8();
            orientation.apply(&mut face);
            faces.push(face);
        }
        let faces: [RgbaImage; 6] = faces
            .try_into()
            .map_err(|_| anyhow::anyhow!("cube map requires six faces"))?;

        let label = resolved.display().to_string();
        let mut cube = Self::from_faces(device, queue, faces, &label, encoding)?;
        cube.convention = convention;
        Ok(cube)
    }

    pub fn from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: [RgbaImage; 6],
        label: &str,
        encoding: TextureEncoding,
    ) -> Result<Self> {
        let dims = faces.each_ref().map(|f| f.dimensions());
        let width = validate_face_dimensions(&dims)
            .with_context(|| format!("invalid cube map `{label}`"))?;

        let chains = faces.map(build_mip_chain);
        let mip_levels = chains[0].len() as u32;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height: width,
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: encoding.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, chain) in chains.iter().enumerate() {
            upload_mip_chain(queue, &texture, layer as u32, chain);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });
        log::info!("loaded cube map `{label}` ({width}px, {mip_levels} mips)");

        Ok(Self {
            texture,
            view,
            width,
            mip_levels,
            convention: CubeMapConvention::G3D,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn convention(&self) -> CubeMapConvention {
        self.convention
    }

    /// LOD bias term for roughness-driven environment lookups.
    pub fn mip_constant(&self) -> f32 {
        mip_constant(self.width)
    }
}

/// `log2(width * sqrt(3))`
pub fn mip_constant(width: u32) -> f32 {
    (width as f32 * 3.0_f32.sqrt()).log2()
}

/// Faces must be square, non-empty and all the same size. Returns the edge length.
fn validate_face_dimensions(dims: &[(u32, u32); 6]) -> Result<u32> {
    let (w, h) = dims[0];
    if w == 0 || w != h {
        bail!("face 0 is {w}x{h}; cube faces must be square and non-empty");
    }
    for (i, &(fw, fh)) in dims.iter().enumerate().skip(1) {
        if (fw, fh) != (w, h) {
            bail!("face {i} is {fw}x{fh}, expected {w}x{h}");
        }
    }
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::data::tests::scratch_dir;

    #[test]
    fn expands_in_face_order() {
        let faces = CubeMapConvention::G3D
            .expand(Path::new("cubemap/islands/islands_*.jpg"))
            .unwrap();
        assert_eq!(faces[0], PathBuf::from("cubemap/islands/islands_+x.jpg"));
        assert_eq!(faces[5], PathBuf::from("cubemap/islands/islands_-z.jpg"));

        let quake = CubeMapConvention::Quake.expand(Path::new("sky_*.png")).unwrap();
        let names: Vec<_> = quake.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(
            names,
            ["sky_rt.png", "sky_lf.png", "sky_up.png", "sky_dn.png", "sky_bk.png", "sky_ft.png"]
        );
    }

    #[test]
    fn expansion_yields_distinct_paths() {
        for convention in CubeMapConvention::ALL {
            let faces = convention.expand(Path::new("env_*.jpg")).unwrap();
            let unique: std::collections::HashSet<_> = faces.iter().collect();
            assert_eq!(unique.len(), 6, "{convention:?}");
        }
    }

    #[test]
    fn pattern_needs_exactly_one_wildcard() {
        assert!(CubeMapConvention::G3D.expand(Path::new("env.jpg")).is_err());
        assert!(CubeMapConvention::G3D.expand(Path::new("*env*.jpg")).is_err());
    }

    #[test]
    fn detects_the_convention_present_on_disk() {
        let dir = scratch_dir("cube-detect");
        for face in CubeMapConvention::DirectX.face_names() {
            std::fs::write(dir.join(format!("sky_{face}.jpg")), b"x").unwrap();
        }
        let pattern = dir.join("sky_*.jpg");
        assert_eq!(
            CubeMapConvention::detect(&pattern),
            Some(CubeMapConvention::DirectX)
        );

        std::fs::remove_file(dir.join("sky_NZ.jpg")).unwrap();
        assert_eq!(CubeMapConvention::detect(&pattern), None);
    }

    #[test]
    fn face_set_is_found_past_a_stray_match() {
        let near = scratch_dir("cube-near");
        let far = scratch_dir("cube-far");
        std::fs::create_dir_all(near.join("sky")).unwrap();
        std::fs::create_dir_all(far.join("sky")).unwrap();
        std::fs::write(near.join("sky/sky_preview.jpg"), b"x").unwrap();
        for face in CubeMapConvention::Quake.face_names() {
            std::fs::write(far.join(format!("sky/sky_{face}.jpg")), b"x").unwrap();
        }

        let roots = [near.to_path_buf(), far.to_path_buf()];
        let (path, convention) = resolve_face_set("sky/sky_*.jpg", &roots).unwrap();
        assert_eq!(path, far.join("sky/sky_*.jpg"));
        assert_eq!(convention, CubeMapConvention::Quake);
    }

    #[test]
    fn incomplete_face_sets_list_every_root() {
        let near = scratch_dir("cube-none-a");
        let far = scratch_dir("cube-none-b");
        std::fs::write(near.join("sky_+x.jpg"), b"x").unwrap();

        let roots = [near.to_path_buf(), far.to_path_buf()];
        let msg = format!("{}", resolve_face_set("sky_*.jpg", &roots).unwrap_err());
        assert!(msg.contains(&near.display().to_string()), "{msg}");
        assert!(msg.contains(&far.display().to_string()), "{msg}");
        assert!(resolve_face_set("sky.jpg", &roots).is_err());
    }

    #[test]
    fn orientations_mirror_face_pixels() {
        let mut face = RgbaImage::from_fn(2, 2, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
        FaceOrientation::FLIP_X.apply(&mut face);
        assert_eq!(face.get_pixel(0, 0).0, [1, 0, 0, 255]);

        FaceOrientation::FLIP_Y.apply(&mut face);
        assert_eq!(face.get_pixel(0, 0).0, [1, 1, 0, 255]);

        let before = face.clone();
        FaceOrientation::IDENTITY.apply(&mut face);
        assert_eq!(face, before);
    }

    #[test]
    fn native_conventions_upload_faces_unchanged() {
        for convention in [CubeMapConvention::G3D, CubeMapConvention::DirectX] {
            assert_eq!(convention.face_orientations(), [FaceOrientation::IDENTITY; 6]);
        }
        assert!(CubeMapConvention::Quake
            .face_orientations()
            .iter()
            .all(|o| o.flip_x && !o.flip_y));
        let unreal = CubeMapConvention::Unreal.face_orientations();
        assert_eq!(unreal[1], FaceOrientation::FLIP_Y);
        assert_eq!(unreal[5], FaceOrientation::FLIP_X);
    }

    #[test]
    fn mip_constant_matches_formula() {
        let expected = (512.0_f32 * 3.0_f32.sqrt()).log2();
        assert!((mip_constant(512) - expected).abs() < 1e-6);
        assert!(mip_constant(1024) > mip_constant(512));
    }

    #[test]
    fn face_validation() {
        assert_eq!(validate_face_dimensions(&[(64, 64); 6]).unwrap(), 64);

        let mut mixed = [(64, 64); 6];
        mixed[3] = (32, 32);
        assert!(validate_face_dimensions(&mixed).is_err());

        assert!(validate_face_dimensions(&[(64, 32); 6]).is_err());
        assert!(validate_face_dimensions(&[(0, 0); 6]).is_err());
    }
}
