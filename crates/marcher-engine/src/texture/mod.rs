mod cube;
mod data;
mod mip;
pub mod sampler;
#[allow(clippy::module_inception)]
mod texture;

pub use cube::{mip_constant, CubeMap, CubeMapConvention, FaceOrientation};
pub use data::find_data_file;
pub use mip::mip_level_count;
pub use texture::{Texture, TextureEncoding};
