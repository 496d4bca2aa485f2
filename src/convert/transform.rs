use glam::{Mat3, Mat4, Quat, Vec3};

use crate::diag::Diagnostics;
use crate::document::{GlobalAsset, NodeTransform, SceneNode, UpAxis};

/// Builds the placement matrix for a look-at specification. An untransformed
/// camera sits at the origin looking down -Z with +Y up; this matrix moves it
/// to `eye` looking at `target` (the reverse of the usual view matrix).
pub fn look_at_matrix(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (target - eye).normalize();
    let side = forward.cross(up);
    let up = side.cross(forward);
    Mat4::from_cols(
        side.extend(0.0),
        up.extend(0.0),
        (-forward).extend(0.0),
        eye.extend(1.0),
    )
}

/// Resolves a node's own transform. Nodes carry zero or one transform
/// entries; anything more is unsupported and ignored with a warning, leaving
/// only the inherited transform in effect.
pub fn node_local_transform(node: &SceneNode, diag: &Diagnostics) -> Option<Mat4> {
    match node.transforms.as_slice() {
        [] => None,
        [NodeTransform::Matrix(m)] => Some(*m),
        [NodeTransform::LookAt { eye, target, up }] => Some(look_at_matrix(*eye, *target, *up)),
        more => {
            diag.warn(format!(
                "scene node '{}' has {} transforms - we only handle 0 or 1",
                node.name,
                more.len()
            ));
            None
        }
    }
}

/// Root "shim" transform reorienting the document's up axis to the target
/// engine's Y-up convention and scaling document units to meters.
pub fn document_shim(asset: &GlobalAsset) -> Mat4 {
    let rotation = match asset.up_axis {
        UpAxis::X => Quat::from_rotation_arc(Vec3::X, Vec3::Y),
        UpAxis::Y => Quat::IDENTITY,
        UpAxis::Z => Quat::from_rotation_arc(Vec3::Z, Vec3::Y),
    };
    let scale = Vec3::splat(asset.unit_scale_meters);
    Mat4::from_scale_rotation_translation(scale, rotation, Vec3::ZERO)
}

/// Normals only pick up rotation and scale, never translation.
pub fn normal_matrix(transform: &Mat4) -> Mat3 {
    Mat3::from_mat4(*transform)
}
