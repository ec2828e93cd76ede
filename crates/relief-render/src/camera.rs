//! Orbit camera and the model/view/projection transform state.

use glam::{Mat4, Vec3};

/// Radians added to the orbit angle each frame.
pub const DEFAULT_ORBIT_STEP: f32 = 0.0025;
/// Horizontal distance of the eye from the orbit centre.
pub const DEFAULT_ORBIT_RADIUS: f32 = 3.5;
/// Height of the eye above the orbit plane.
pub const DEFAULT_CAMERA_HEIGHT: f32 = 2.0;

/// A camera circling the origin at fixed radius and height, always looking
/// at the origin with +Y up.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Steps taken so far. The angle is derived from this so every step adds
    /// exactly `step`, however long the orbit runs.
    steps: u64,
    /// Radians per step.
    step: f32,
    pub radius: f32,
    pub height: f32,
}

impl OrbitCamera {
    pub fn new(step: f32, radius: f32, height: f32) -> Self {
        Self {
            steps: 0,
            step,
            radius,
            height,
        }
    }

    /// Move one step along the orbit.
    pub fn advance(&mut self) {
        self.steps += 1;
    }

    /// Number of [`advance`](Self::advance) calls so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Accumulated orbit angle in radians. Never wrapped.
    pub fn angle(&self) -> f64 {
        self.steps as f64 * f64::from(self.step)
    }

    /// Eye position: `(sin(a) * r, h, -cos(a) * r)`.
    pub fn eye(&self) -> Vec3 {
        let (sin, cos) = self.angle().sin_cos();
        Vec3::new(
            sin as f32 * self.radius,
            self.height,
            -cos as f32 * self.radius,
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(
            DEFAULT_ORBIT_STEP,
            DEFAULT_ORBIT_RADIUS,
            DEFAULT_CAMERA_HEIGHT,
        )
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveParams {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveParams {
    /// Right-handed perspective matrix with a `[0, 1]` depth range.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    /// Update the aspect ratio from framebuffer dimensions. Zero-sized
    /// framebuffers are ignored.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            aspect_ratio: 800.0 / 600.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Model, view and projection matrices for the heightfield.
///
/// `model` and `projection` are set up front; `view` is replaced every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    perspective: PerspectiveParams,
}

impl TransformState {
    pub fn new(model_offset: Vec3, perspective: PerspectiveParams) -> Self {
        Self {
            model: Mat4::from_translation(model_offset),
            view: Mat4::IDENTITY,
            projection: perspective.matrix(),
            perspective,
        }
    }

    /// `projection * view * model`, the matrix uploaded as `MVP`.
    pub fn combined(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    pub fn perspective(&self) -> &PerspectiveParams {
        &self.perspective
    }

    /// Re-derive the projection for a new framebuffer size.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.perspective.set_aspect_ratio(width, height);
        self.projection = self.perspective.matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        for col in 0..4 {
            for row in 0..4 {
                assert!(
                    (a.col(col)[row] - b.col(col)[row]).abs() < 1e-5,
                    "mismatch at col={col}, row={row}"
                );
            }
        }
    }

    fn heightfield_transforms() -> TransformState {
        TransformState::new(Vec3::new(-2.5, -0.2, -2.5), PerspectiveParams::default())
    }

    #[test]
    fn test_angle_starts_at_zero_and_grows_by_step() {
        let mut orbit = OrbitCamera::default();
        assert_eq!(orbit.angle(), 0.0);
        let mut previous = orbit.angle();
        for _ in 0..1000 {
            orbit.advance();
            assert!(orbit.angle() > previous);
            previous = orbit.angle();
        }
        assert!((orbit.angle() - 1000.0 * f64::from(DEFAULT_ORBIT_STEP)).abs() < 1e-9);
    }

    #[test]
    fn test_step_stays_fixed_after_long_runs() {
        let step = f64::from(DEFAULT_ORBIT_STEP);
        let mut orbit = OrbitCamera::default();
        // Past 1024 radians, where an f32 accumulator starts dropping bits.
        for _ in 0..2_000_000 {
            let before = orbit.angle();
            orbit.advance();
            assert!((orbit.angle() - before - step).abs() < 1e-9);
        }
        assert_eq!(orbit.steps(), 2_000_000);
        assert!((orbit.angle() - 2_000_000.0 * step).abs() < 1e-6);
        assert!(orbit.angle() > 1024.0);

        let eye = orbit.eye();
        let planar = (eye.x * eye.x + eye.z * eye.z).sqrt();
        assert!((planar - DEFAULT_ORBIT_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_initial_eye_position() {
        let orbit = OrbitCamera::default();
        let eye = orbit.eye();
        assert!(eye.x.abs() < 1e-6);
        assert!((eye.y - 2.0).abs() < 1e-6);
        assert!((eye.z + 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_eye_stays_on_orbit_circle() {
        let mut orbit = OrbitCamera::default();
        for _ in 0..5000 {
            orbit.advance();
            let eye = orbit.eye();
            let planar = (eye.x * eye.x + eye.z * eye.z).sqrt();
            assert!((planar - DEFAULT_ORBIT_RADIUS).abs() < 1e-4);
            assert!((eye.y - DEFAULT_CAMERA_HEIGHT).abs() < 1e-6);
        }
    }

    #[test]
    fn test_view_looks_at_origin() {
        let mut orbit = OrbitCamera::default();
        for _ in 0..321 {
            orbit.advance();
        }
        let origin_in_view = orbit.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin_in_view.x.abs() < 1e-4);
        assert!(origin_in_view.y.abs() < 1e-4);
        let distance = orbit.eye().length();
        assert!((origin_in_view.z + distance).abs() < 1e-4);
    }

    #[test]
    fn test_combined_is_projection_view_model() {
        let mut orbit = OrbitCamera::default();
        orbit.advance();
        let mut transforms = heightfield_transforms();
        transforms.view = orbit.view_matrix();
        assert_mat_eq(
            transforms.combined(),
            transforms.projection * transforms.view * transforms.model,
        );
    }

    #[test]
    fn test_multiplication_order_matters() {
        let mut orbit = OrbitCamera::default();
        for _ in 0..200 {
            orbit.advance();
        }
        let mut transforms = heightfield_transforms();
        transforms.view = orbit.view_matrix();

        let point = Vec4::new(1.0, 0.3, 2.0, 1.0);
        let correct = transforms.combined() * point;
        let reversed = (transforms.model * transforms.view * transforms.projection) * point;
        assert!((correct - reversed).length() > 1e-3);
    }

    #[test]
    fn test_model_translation() {
        let transforms = heightfield_transforms();
        let moved = transforms.model * Vec4::new(2.5, 0.2, 2.5, 1.0);
        assert!(moved.truncate().length() < 1e-6);
    }

    #[test]
    fn test_fov_is_degrees() {
        let params = PerspectiveParams::default();
        let expected = Mat4::perspective_rh(45f32.to_radians(), 800.0 / 600.0, 0.1, 1000.0);
        assert_mat_eq(params.matrix(), expected);
    }

    #[test]
    fn test_set_aspect_ratio_rederives_projection() {
        let mut transforms = heightfield_transforms();
        let before = transforms.projection;
        transforms.set_aspect_ratio(1920, 1080);
        assert!((transforms.perspective().aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
        assert_ne!(transforms.projection, before);
        assert_mat_eq(transforms.projection, transforms.perspective().matrix());
    }

    #[test]
    fn test_zero_size_keeps_aspect_ratio() {
        let mut params = PerspectiveParams::default();
        params.set_aspect_ratio(0, 600);
        assert!((params.aspect_ratio - 800.0 / 600.0).abs() < 1e-6);
    }
}
