use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// An inverted box that unions as the identity.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.min = bbox.min.min(p);
            bbox.max = bbox.max.max(p);
        }
        bbox
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest side length; drives the scale policy.
    #[must_use]
    pub fn max_extent(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Transforms all eight corners and re-wraps them. The result is the
    /// tight box of the transformed corners, not of the original surface.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        Self::from_points(corners.iter().map(|c| matrix.transform_point3(*c)))
    }
}

/// CPU-side triangle geometry of one mesh primitive.
///
/// Positions are mandatory; normals are generated when the source asset
/// omits them. Joints/weights are present only for skinned primitives.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Option<Vec<u32>>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<[f32; 4]>>,
    pub bounding_box: BoundingBox,
}

impl Geometry {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        indices: Option<Vec<u32>>,
    ) -> Self {
        let bounding_box = BoundingBox::from_points(positions.iter().copied());
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            _ => compute_normals(&positions, indices.as_deref()),
        };
        Self {
            name: name.into(),
            positions,
            normals,
            indices,
            joints: None,
            weights: None,
            bounding_box,
        }
    }

    #[must_use]
    pub fn with_skinning(mut self, joints: Vec<[u16; 4]>, weights: Vec<[f32; 4]>) -> Self {
        self.joints = Some(joints);
        self.weights = Some(weights);
        self
    }

    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.weights.is_some()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Iterates the primitive's triangles in local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let count = self.triangle_count();
        (0..count).map(move |i| {
            let (i0, i1, i2) = match &self.indices {
                Some(indices) => (
                    indices[i * 3] as usize,
                    indices[i * 3 + 1] as usize,
                    indices[i * 3 + 2] as usize,
                ),
                None => (i * 3, i * 3 + 1, i * 3 + 2),
            };
            [self.positions[i0], self.positions[i1], self.positions[i2]]
        })
    }
}

/// Area-weighted vertex normals from triangle faces.
fn compute_normals(positions: &[Vec3], indices: Option<&[u32]>) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    let mut accumulate = |i0: usize, i1: usize, i2: usize| {
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            return;
        }
        let face = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    };

    match indices {
        Some(indices) => {
            for tri in indices.chunks_exact(3) {
                accumulate(tri[0] as usize, tri[1] as usize, tri[2] as usize);
            }
        }
        None => {
            for i in (0..positions.len() / 3).map(|t| t * 3) {
                accumulate(i, i + 1, i + 2);
            }
        }
    }

    for n in &mut normals {
        *n = n.normalize_or_zero();
        if *n == Vec3::ZERO {
            *n = Vec3::Y;
        }
    }
    normals
}
