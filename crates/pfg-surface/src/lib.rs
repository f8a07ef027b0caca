//! Surface library: bicubic surfaces loaded from patch files, the patch arena,
//! neighbour consistency, shared-edge normal averaging and L-system defined
//! patches.

pub mod connections;
mod dynamic;
pub mod library;
mod normals;
mod texture;
pub mod types;

pub use connections::{check_connections, SurfacePatches};
pub use dynamic::DynamicPatchSettings;
pub use library::{LoadLimits, SurfaceLibrary};
pub use normals::calculate_neighbouring_vertex_normals;
pub use types::*;
