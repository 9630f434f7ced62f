use glam::{Mat4, Vec3};

/// Vertical field of view, in radians (45°).
pub const FIELD_OF_VIEW_Y: f32 = std::f32::consts::FRAC_PI_4;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
/// Distance from the camera to the model origin along -Z.
pub const CAMERA_DISTANCE: f32 = 3.0;

/// Produces the transform uploaded to the program each frame.
///
/// Implementations must be pure: the same inputs always give the same matrix.
pub trait TransformComposer {
    fn compose(&self, elapsed_seconds: f32, aspect_ratio: f32) -> Mat4;
}

/// Camera looking down -Z at a model spinning about +Y, one radian per second.
///
/// Projection is right-handed with a `[0, 1]` depth range (wgpu clip space).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpinningCamera {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    /// Rotation axis of the model.
    pub axis: Vec3,
}

impl SpinningCamera {
    pub fn model(&self, elapsed_seconds: f32) -> Mat4 {
        Mat4::from_axis_angle(self.axis, elapsed_seconds)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near, self.far)
    }

    /// `projection * view`, the part that does not change with time.
    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        self.projection(aspect_ratio) * self.view()
    }
}

impl Default for SpinningCamera {
    fn default() -> Self {
        Self {
            fov_y: FIELD_OF_VIEW_Y,
            near: NEAR_PLANE,
            far: FAR_PLANE,
            distance: CAMERA_DISTANCE,
            axis: Vec3::Y,
        }
    }
}

impl TransformComposer for SpinningCamera {
    fn compose(&self, elapsed_seconds: f32, aspect_ratio: f32) -> Mat4 {
        self.view_projection(aspect_ratio) * self.model(elapsed_seconds)
    }
}
