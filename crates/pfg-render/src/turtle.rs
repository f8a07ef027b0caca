use pfg_math::{Frame, Point3, Vector3};

/// Drawing state: position, orientation, line width and colour index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turtle {
    pub position: Point3,
    pub heading: Vector3,
    pub left: Vector3,
    pub up: Vector3,
    pub line_width: f64,
    pub colour: i32,
}

impl Turtle {
    /// Heading along +Y, up along +Z.
    pub fn new(line_width: f64, colour: i32) -> Self {
        Self {
            position: Point3::ZERO,
            heading: Vector3::Y,
            left: -Vector3::X,
            up: Vector3::Z,
            line_width,
            colour,
        }
    }

    /// Frame placing surface-local coordinates at the turtle.
    pub fn frame(&self, scale: f64) -> Frame {
        Frame {
            origin: self.position,
            heading: self.heading,
            left: self.left,
            up: self.up,
            scale,
        }
    }

    pub fn forward(&mut self, distance: f64) {
        self.position += self.heading * distance;
    }

    /// Rotate about `up`; positive turns towards `left`.
    pub fn turn(&mut self, degrees: f64) {
        let (s, c) = degrees.to_radians().sin_cos();
        let (h, l) = (self.heading, self.left);
        self.heading = h * c + l * s;
        self.left = l * c - h * s;
    }

    /// Rotate about `left`; positive pitches the heading down.
    pub fn pitch(&mut self, degrees: f64) {
        let (s, c) = degrees.to_radians().sin_cos();
        let (h, u) = (self.heading, self.up);
        self.heading = h * c - u * s;
        self.up = u * c + h * s;
    }

    /// Rotate about `heading`; positive rolls `left` towards `up`.
    pub fn roll(&mut self, degrees: f64) {
        let (s, c) = degrees.to_radians().sin_cos();
        let (l, u) = (self.left, self.up);
        self.left = l * c + u * s;
        self.up = u * c - l * s;
    }

    pub fn turn_around(&mut self) {
        self.heading = -self.heading;
        self.left = -self.left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(t: &Turtle) {
        assert_relative_eq!(t.heading.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.left.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.heading.dot(t.left), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.heading.dot(t.up), 0.0, epsilon = 1e-12);
        // left = up × heading
        assert!((t.up.cross(t.heading) - t.left).length() < 1e-12);
    }

    #[test]
    fn test_initial_frame_is_right_handed() {
        assert_orthonormal(&Turtle::new(1.0, 1));
    }

    #[test]
    fn test_turn_quarter() {
        let mut t = Turtle::new(1.0, 1);
        t.turn(90.0);
        assert!((t.heading - -Vector3::X).length() < 1e-12);
        assert_orthonormal(&t);
    }

    #[test]
    fn test_rotations_keep_frame() {
        let mut t = Turtle::new(1.0, 1);
        t.pitch(30.0);
        t.roll(-70.0);
        t.turn(12.5);
        t.turn_around();
        assert_orthonormal(&t);
    }

    #[test]
    fn test_forward_and_frame() {
        let mut t = Turtle::new(1.0, 1);
        t.forward(2.0);
        assert_eq!(t.position, Point3::new(0.0, 2.0, 0.0));
        let f = t.frame(0.5);
        assert!((f.to_world(Point3::new(2.0, 0.0, 0.0)) - Point3::new(0.0, 3.0, 0.0)).length() < 1e-12);
    }
}
