use glam::{Mat4, Quat, Vec3};

use crate::build::BoundingBox;

/// Arc-ball camera framing the displayed scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcBallCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    /// Camera target point
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
}

impl Default for ArcBallCamera {
    fn default() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
            distance: 6.0,
            target: Vec3::ZERO,
            fov: 45.0_f32.to_radians(),
        }
    }
}

impl ArcBallCamera {
    /// Aim at the box center, far enough back that a sphere around the
    /// origin reaching the farthest corner fits the field of view. Empty
    /// boxes keep the current view.
    pub fn frame(&mut self, bounds: &BoundingBox) {
        if bounds.is_empty(0.01) {
            return;
        }
        let radius = bounds.max_dist_from_origin() as f32;
        self.target = bounds.center.as_vec3();
        self.distance = (radius / (self.fov * 0.5).sin()).max(0.5);
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + Vec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Camera orientation in world space (looks along its local -Z).
    pub fn orientation(&self) -> Quat {
        let (_, rotation, _) = self.view_matrix().inverse().to_scale_rotation_translation();
        rotation
    }

    /// Near/far planes that enclose the framed scene.
    pub fn clip_planes(&self) -> (f32, f32) {
        let near = (self.distance * 0.01).max(0.01);
        (near, self.distance * 4.0)
    }
}
