use pfg_core::Tolerance;
use pfg_math::{Aabb3, DVec3, Point3, Vector3};

/// A perspective camera looking from `eye` at `target`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vector3,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    /// width / height
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub fn new(eye: Point3, target: Point3, up: Vector3, fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            eye,
            target,
            up,
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn forward(&self) -> Vector3 {
        (self.target - self.eye).normalize_or_zero()
    }

    /// Screen-right direction in world space.
    pub fn right(&self) -> Vector3 {
        self.forward().cross(self.up).try_normalize().unwrap_or(DVec3::X)
    }

    /// Compute the view matrix (look-at matrix) in row-major format.
    pub fn view_matrix(&self) -> [[f64; 4]; 4] {
        let forward = self.forward();
        let right = self.right();
        let up = right.cross(forward);

        // Camera looks down -Z in view space
        let f = -forward;

        let mut mat = [[0.0; 4]; 4];
        mat[0] = [right.x, right.y, right.z, -right.dot(self.eye)];
        mat[1] = [up.x, up.y, up.z, -up.dot(self.eye)];
        mat[2] = [f.x, f.y, f.z, -f.dot(self.eye)];
        mat[3] = [0.0, 0.0, 0.0, 1.0];
        mat
    }

    /// Perspective projection in row-major format, OpenGL-style NDC.
    pub fn projection_matrix(&self) -> [[f64; 4]; 4] {
        let f = 1.0 / (self.fov_y / 2.0).tan();

        let mut mat = [[0.0; 4]; 4];
        mat[0][0] = f / self.aspect;
        mat[1][1] = f;
        mat[2][2] = (self.far + self.near) / (self.near - self.far);
        mat[2][3] = (2.0 * self.far * self.near) / (self.near - self.far);
        mat[3][2] = -1.0;
        mat
    }

    pub fn view_projection(&self) -> [[f64; 4]; 4] {
        multiply_matrices(&self.projection_matrix(), &self.view_matrix())
    }

    /// Project a world point to normalized device coordinates.
    ///
    /// `None` for points at or behind the eye plane and for non-finite results.
    /// Points closer than [`Tolerance::min_w`] to the eye plane count as behind it.
    pub fn project(&self, p: Point3) -> Option<DVec3> {
        let m = self.view_projection();
        let h = [p.x, p.y, p.z, 1.0];
        let row = |r: usize| m[r].iter().zip(h).map(|(a, b)| a * b).sum::<f64>();
        let w = row(3);
        if !(w > Tolerance::default().min_w) {
            return None;
        }
        let ndc = DVec3::new(row(0) / w, row(1) / w, row(2) / w);
        ndc.is_finite().then_some(ndc)
    }

    /// Whether a surface normal at `p` points towards the eye.
    pub fn is_facing(&self, p: Point3, normal: Vector3) -> bool {
        normal.dot(self.eye - p) >= 0.0
    }

    /// Move the eye back along the view direction until `aabb` fits.
    pub fn fit_to_aabb(&mut self, aabb: &Aabb3) {
        let center = aabb.center();
        let max_dim = aabb.extents().max_element();
        let distance = (max_dim / (2.0 * (self.fov_y / 2.0).tan())).max(self.near * 2.0);

        let view_dir = match (self.target - self.eye).try_normalize() {
            Some(d) => d,
            None => -DVec3::Z,
        };
        self.target = center;
        self.eye = center - view_dir * (distance * 1.5 + max_dim * 0.5);
    }
}

impl Default for Camera {
    /// Eye at (0, 0, 5) looking at the origin, 45° field of view, square aspect.
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 5.0),
            target: Point3::ZERO,
            up: Vector3::Y,
            fov_y: std::f64::consts::FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

fn multiply_matrices(a: &[[f64; 4]; 4], b: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    result
}
