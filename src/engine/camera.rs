use glam::Mat4;

use crate::engine::xr::XrView;

/// Camera driven entirely by the XR view each frame.
///
/// `matrix_auto_update` is always false: nothing derives `matrix` from a position or
/// orientation, it is overwritten from the platform pose and `matrix_world` only
/// changes on an explicit `update_matrix_world(true)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XrCamera {
    pub matrix: Mat4,
    pub projection_matrix: Mat4,
    pub matrix_world: Mat4,
    pub matrix_auto_update: bool,
}

impl Default for XrCamera {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            matrix_world: Mat4::IDENTITY,
            matrix_auto_update: false,
        }
    }
}

impl XrCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the view's transform and projection arrays verbatim.
    pub fn copy_from_view(&mut self, view: &XrView) {
        self.matrix = Mat4::from_cols_array(&view.transform.matrix);
        self.projection_matrix = Mat4::from_cols_array(&view.projection_matrix);
    }

    /// The camera has no parent, so its world matrix is its local matrix.
    pub fn update_matrix_world(&mut self, force: bool) {
        if force || self.matrix_auto_update {
            self.matrix_world = self.matrix;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.matrix_world.inverse()
    }

    #[cfg(test)]
    pub fn matrix_array(&self) -> [f32; 16] {
        self.matrix.to_cols_array()
    }

    #[cfg(test)]
    pub fn projection_array(&self) -> [f32; 16] {
        self.projection_matrix.to_cols_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::xr::{Eye, RigidTransform};
    use glam::Vec3;

    fn view() -> XrView {
        let mut projection = [0.0; 16];
        for (i, p) in projection.iter_mut().enumerate() {
            *p = i as f32 * 0.37 - 1.1;
        }
        XrView {
            eye: Eye::None,
            transform: RigidTransform::from_position(Vec3::new(0.1, 1.6, -0.3)),
            projection_matrix: projection,
        }
    }

    #[test]
    fn copy_is_bit_exact() {
        let v = view();
        let mut cam = XrCamera::new();
        cam.copy_from_view(&v);

        assert_eq!(cam.matrix_array(), v.transform.matrix);
        assert_eq!(cam.projection_array(), v.projection_matrix);
    }

    #[test]
    fn world_matrix_waits_for_explicit_update() {
        let mut cam = XrCamera::new();
        cam.copy_from_view(&view());
        cam.update_matrix_world(false);
        assert_eq!(cam.matrix_world, Mat4::IDENTITY);

        cam.update_matrix_world(true);
        assert_eq!(cam.matrix_world, cam.matrix);
        assert!((cam.view_matrix() * cam.matrix_world).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }
}
