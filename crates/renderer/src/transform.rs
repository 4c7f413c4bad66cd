use glam::{Mat4, Vec3};

/// Perspective camera looking down -Z with the model pushed `distance` away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 100.0,
            distance: 6.0,
        }
    }
}

impl Camera {
    /// Projection for a drawable of `width` x `height` pixels.
    ///
    /// A zero height (minimised surface) falls back to a square aspect.
    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = if height == 0 || width == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            aspect,
            self.z_near,
            self.z_far,
        )
    }
}

/// Multipliers applied to the elapsed angle about each axis.
///
/// Rotations compose in Z, Y, X order. The cube's 1.0 / 0.7 / 0.3 rates are a
/// visual choice and are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRates {
    pub z: f32,
    pub y: f32,
    pub x: f32,
}

impl AxisRates {
    pub const SPIN: Self = Self {
        z: 1.0,
        y: 0.0,
        x: 0.0,
    };

    pub const TUMBLE: Self = Self {
        z: 1.0,
        y: 0.7,
        x: 0.3,
    };

    pub fn from_zyx(rates: [f32; 3]) -> Self {
        Self {
            z: rates[0],
            y: rates[1],
            x: rates[2],
        }
    }
}

impl Default for AxisRates {
    fn default() -> Self {
        Self::TUMBLE
    }
}

/// Projection and model-view matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPair {
    pub projection: Mat4,
    pub model_view: Mat4,
}

impl TransformPair {
    pub fn compute(
        camera: &Camera,
        rates: AxisRates,
        angle: f32,
        drawable: (u32, u32),
    ) -> Self {
        Self {
            projection: camera.projection(drawable.0, drawable.1),
            model_view: model_view(camera.distance, rates, angle),
        }
    }

    /// Column-major projection, ready for `uniformMatrix4fv`.
    pub fn projection_columns(&self) -> [f32; 16] {
        self.projection.to_cols_array()
    }

    /// Column-major model-view, ready for `uniformMatrix4fv`.
    pub fn model_view_columns(&self) -> [f32; 16] {
        self.model_view.to_cols_array()
    }
}

fn model_view(distance: f32, rates: AxisRates, angle: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -distance))
        * Mat4::from_rotation_z(angle * rates.z)
        * Mat4::from_rotation_y(angle * rates.y)
        * Mat4::from_rotation_x(angle * rates.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn model_view_at_rest_is_pure_translation() {
        let pair = TransformPair::compute(&Camera::default(), AxisRates::TUMBLE, 0.0, (800, 600));
        let origin = pair.model_view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin - Vec4::new(0.0, 0.0, -6.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn spin_rotates_about_view_axis_only() {
        let angle = std::f32::consts::FRAC_PI_2;
        let pair = TransformPair::compute(&Camera::default(), AxisRates::SPIN, angle, (800, 600));
        let point = pair.model_view * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((point - Vec4::new(0.0, 1.0, -6.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn tumble_composes_z_then_y_then_x() {
        let angle = 1.3;
        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0))
            * Mat4::from_rotation_z(angle)
            * Mat4::from_rotation_y(angle * 0.7)
            * Mat4::from_rotation_x(angle * 0.3);
        let pair = TransformPair::compute(&Camera::default(), AxisRates::TUMBLE, angle, (800, 600));
        assert!(pair.model_view.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn projection_tracks_aspect_ratio() {
        let camera = Camera::default();
        let wide = camera.projection(1600, 600);
        let standard = camera.projection(800, 600);
        assert_ne!(wide, standard);
        // x scale is f / aspect, y scale is f.
        let f = 1.0 / (45.0f32.to_radians() / 2.0).tan();
        assert!((standard.x_axis.x - f / (800.0 / 600.0)).abs() < 1e-5);
        assert!((standard.y_axis.y - f).abs() < 1e-5);
    }

    #[test]
    fn projection_maps_near_plane_to_minus_one() {
        let camera = Camera::default();
        let projection = camera.projection(800, 600);
        let near = projection * Vec4::new(0.0, 0.0, -camera.z_near, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-4);
        let far = projection * Vec4::new(0.0, 0.0, -camera.z_far, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_height_falls_back_to_square_aspect() {
        let camera = Camera::default();
        assert_eq!(camera.projection(800, 0), camera.projection(1, 1));
    }

    #[test]
    fn columns_are_column_major() {
        let pair = TransformPair::compute(&Camera::default(), AxisRates::SPIN, 0.0, (800, 600));
        let columns = pair.model_view_columns();
        // Translation lives in the fourth column.
        assert_eq!(&columns[12..16], &[0.0, 0.0, -6.0, 1.0]);
    }
}
