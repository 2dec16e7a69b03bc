//! Cube-map addressing.
//!
//! Faces follow the usual layer order `+X, -X, +Y, -Y, +Z, -Z` and the
//! standard cube-map UV table: for a direction with major axis component `ma`,
//! the in-face coordinates are `u = (s / |ma| + 1) / 2`, `v = (t / |ma| + 1) / 2`
//! where `(s, t)` are the face's basis components below. `v = 0` is the top row
//! of the layer, which is also how wgpu samples `Cube` views.
//!
//! Everything here is pure; the WGSL shaders carry the same routines.

use glam::{Mat4, Vec2, Vec3};

/// One face of a cube map. The discriminant is the texture layer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

/// All faces in layer order
pub const ALL_FACES: [CubeFace; 6] = [
    CubeFace::PositiveX,
    CubeFace::NegativeX,
    CubeFace::PositiveY,
    CubeFace::NegativeY,
    CubeFace::PositiveZ,
    CubeFace::NegativeZ,
];

impl CubeFace {
    /// Texture layer index of this face
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Pick the face whose axis has the largest-magnitude component of `dir`.
    /// Ties resolve in X, Y, Z order.
    pub fn from_direction(dir: Vec3) -> Self {
        let a = dir.abs();
        if a.x >= a.y && a.x >= a.z {
            if dir.x >= 0.0 {
                CubeFace::PositiveX
            } else {
                CubeFace::NegativeX
            }
        } else if a.y >= a.z {
            if dir.y >= 0.0 {
                CubeFace::PositiveY
            } else {
                CubeFace::NegativeY
            }
        } else if dir.z >= 0.0 {
            CubeFace::PositiveZ
        } else {
            CubeFace::NegativeZ
        }
    }

    /// (major axis, s axis, t axis)
    fn basis(self) -> (Vec3, Vec3, Vec3) {
        match self {
            CubeFace::PositiveX => (Vec3::X, Vec3::NEG_Z, Vec3::NEG_Y),
            CubeFace::NegativeX => (Vec3::NEG_X, Vec3::Z, Vec3::NEG_Y),
            CubeFace::PositiveY => (Vec3::Y, Vec3::X, Vec3::Z),
            CubeFace::NegativeY => (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
            CubeFace::PositiveZ => (Vec3::Z, Vec3::X, Vec3::NEG_Y),
            CubeFace::NegativeZ => (Vec3::NEG_Z, Vec3::NEG_X, Vec3::NEG_Y),
        }
    }

    /// Direction (not normalised) through `uv` on this face. `uv` outside
    /// `[0, 1]` extends the face plane past its edges.
    pub fn direction(self, uv: Vec2) -> Vec3 {
        let (major, s, t) = self.basis();
        let st = uv * 2.0 - Vec2::ONE;
        major + s * st.x + t * st.y
    }

    /// 90 degree camera at the origin looking through this face.
    ///
    /// A point in direction `self.direction(uv)` lands at NDC
    /// `(2u - 1, 1 - 2v)`, so geometry rendered into layer `self.layer()`
    /// is sampled back at the same direction. Depth maps `near..far` to `0..1`.
    pub fn view_projection(self, near: f32, far: f32) -> Mat4 {
        let (major, s, t) = self.basis();
        let a = far / (far - near);
        let b = -far * near / (far - near);
        let rows = Mat4::from_cols(
            s.extend(0.0),
            (-t).extend(0.0),
            (major * a).extend(b),
            major.extend(0.0),
        );
        rows.transpose()
    }
}

/// Face and in-face UV for a direction, via dominant-axis projection
pub fn face_uv(dir: Vec3) -> (CubeFace, Vec2) {
    let face = CubeFace::from_direction(dir);
    let (major, s, t) = face.basis();
    let ma = dir.dot(major);
    let st = Vec2::new(dir.dot(s), dir.dot(t)) / ma;
    (face, (st + Vec2::ONE) * 0.5)
}

/// Resolve a texel that may sit one step outside `face` onto the adjacent face.
///
/// The texel centre is pushed through the face plane, reprojected, and the
/// result clamped into the destination face. The reaction-diffusion step runs
/// the same routine on the GPU (`wrapped_index` in `cubemap.wgsl`).
#[allow(dead_code)]
pub fn wrap_texel(face: CubeFace, x: i32, y: i32, side: u32) -> (CubeFace, u32, u32) {
    let n = side as i32;
    if (0..n).contains(&x) && (0..n).contains(&y) {
        return (face, x as u32, y as u32);
    }
    let uv = (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / side as f32;
    let (wrapped, uv) = face_uv(face.direction(uv));
    let texel = (uv * side as f32).floor();
    let clamp = |v: f32| (v as i32).clamp(0, n - 1) as u32;
    (wrapped, clamp(texel.x), clamp(texel.y))
}
