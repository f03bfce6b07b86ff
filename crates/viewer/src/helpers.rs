//! Common helper functions for points, polylines and placements.

use glam::{DQuat, DVec3};
use kernel::Location;

/// Euclidean distance between two points.
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).length()
}

/// Split a polyline into its consecutive segments.
pub fn explode(points: &[DVec3]) -> Vec<[DVec3; 2]> {
    points.windows(2).map(|w| [w[0], w[1]]).collect()
}

/// Concatenate nested lists.
pub fn flatten<T: Clone>(nested: &[Vec<T>]) -> Vec<T> {
    nested.iter().flatten().cloned().collect()
}

/// Rotate by Euler angles in degrees, applied Z first, then Y, then X.
pub fn rotate(v: DVec3, angle_x: f64, angle_y: f64, angle_z: f64) -> DVec3 {
    let q = DQuat::from_rotation_x(angle_x.to_radians())
        * DQuat::from_rotation_y(angle_y.to_radians())
        * DQuat::from_rotation_z(angle_z.to_radians());
    q * v
}

/// Fixed-width vector formatting, e.g. `(   1.00000,    2.00000)`.
pub fn pp_vec(components: &[f64]) -> String {
    let parts: Vec<String> = components.iter().map(|c| format!("{c:10.5}")).collect();
    format!("({})", parts.join(", "))
}

/// Translation and rotation quaternion `(x, y, z, w)` of a location.
pub fn pp_loc(loc: &Location) -> String {
    format!(
        "{}, {}",
        pp_vec(&loc.translation.to_array()),
        pp_vec(&loc.rotation.to_array())
    )
}
