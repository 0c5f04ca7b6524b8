pub mod geometry;
pub mod material;
pub mod mesh;

pub use geometry::{BoundingBox, Geometry};
pub use material::{BasicMaterialData, MaterialKind, PhysicalMaterialData};
pub use mesh::Mesh;
