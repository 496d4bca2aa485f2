use glam::Mat4;
use itertools::Itertools;

use crate::convert::dedup::{AttributeArrays, IndexTuple, VertexInterner};
use crate::diag::Diagnostics;
use crate::document::{PrimitiveGroup, PrimitiveKind};
use crate::output::{DEFAULT_MATERIAL, Submesh, Topology, VertexData};

pub struct BuiltSubmesh {
    pub submesh: Submesh,
    pub triangles: usize,
    pub lines: usize,
    pub winding_warnings: usize,
}

/// Builds one submesh from a primitive group: validates the topology,
/// flattens the per-attribute index streams through the deduplicator, and
/// emits output indices in input order. Returns `None` (with a diagnostic)
/// when the group cannot produce a valid submesh.
pub fn build_submesh(
    geometry_name: &str,
    prim: &PrimitiveGroup,
    arrays: AttributeArrays<'_>,
    transform: Mat4,
    check_windings: bool,
    diag: &Diagnostics,
) -> Option<BuiltSubmesh> {
    let topology = match &prim.kind {
        PrimitiveKind::Triangles => Topology::TriangleList,
        PrimitiveKind::Lines => Topology::LineList,
        PrimitiveKind::Polylist { vertex_counts } => {
            if vertex_counts.iter().any(|&count| count != 3) {
                diag.warn(format!(
                    "a polylist primitive group of geometry '{geometry_name}' contains a polygon \
                     that is not a triangle, which is unsupported - skipping"
                ));
                return None;
            }
            Topology::TriangleList
        }
    };

    if arrays.positions.is_empty() {
        diag.warn(format!(
            "primitive group of geometry '{geometry_name}' has no positions; \
             this is strange (and currently unsupported), skipping"
        ));
        return None;
    }

    let count = index_stream_bound(geometry_name, prim, diag);

    let mut interner = VertexInterner::new(arrays, transform);
    let mut indices = Vec::with_capacity(count);
    for at in 0..count {
        let tuple = IndexTuple {
            position: prim.position_indices[at],
            normal: prim.normal_indices.as_ref().map(|stream| stream[at]),
            texcoord: prim.texcoord_indices.as_ref().map(|stream| stream[at]),
        };
        match interner.resolve(tuple) {
            Some(index) => indices.push(index),
            None => {
                diag.warn(format!(
                    "index tuple {tuple:?} of geometry '{geometry_name}' points outside its \
                     attribute arrays, skipping this submesh"
                ));
                return None;
            }
        }
    }

    let mut winding_warnings = 0;
    if topology == Topology::TriangleList && prim.normal_indices.is_some() && check_windings {
        winding_warnings =
            check_triangle_windings(geometry_name, &indices, interner.vertices(), diag);
    }

    let (triangles, lines) = match topology {
        Topology::TriangleList => (indices.len() / 3, 0),
        Topology::LineList => (0, indices.len() / 2),
    };

    Some(BuiltSubmesh {
        submesh: Submesh {
            topology,
            material_slot: prim.material_slot,
            material: DEFAULT_MATERIAL.to_string(),
            vertices: interner.into_vertices(),
            indices,
        },
        triangles,
        lines,
        winding_warnings,
    })
}

/// All present index streams should have the same length; a mismatch is
/// logged and the shortest stream bounds the loop so every tuple stays
/// in-bounds.
fn index_stream_bound(geometry_name: &str, prim: &PrimitiveGroup, diag: &Diagnostics) -> usize {
    let mut bound = prim.position_indices.len();
    let extra_streams = [
        ("normal", prim.normal_indices.as_ref()),
        ("texcoord", prim.texcoord_indices.as_ref()),
    ];
    for (label, stream) in extra_streams {
        let Some(stream) = stream else { continue };
        if stream.len() != prim.position_indices.len() {
            diag.warn(format!(
                "size of the {label} index stream of geometry '{geometry_name}' is {} which \
                 disagrees with the position index stream size of {}",
                stream.len(),
                prim.position_indices.len()
            ));
        }
        bound = bound.min(stream.len());
    }
    bound
}

/// Compares each triangle's geometric face normal (right-hand CCW from the
/// transformed positions) against its vertex normals. Triangles with
/// inconsistent vertex normals are exempt; disagreement only warns, the
/// index order is never altered.
fn check_triangle_windings(
    geometry_name: &str,
    indices: &[u32],
    vertices: &VertexData,
    diag: &Diagnostics,
) -> usize {
    let mut warnings = 0;
    for (a, b, c) in indices.iter().copied().tuples() {
        let (n1, n2, n3) = (
            vertices.normals[a as usize],
            vertices.normals[b as usize],
            vertices.normals[c as usize],
        );
        if n1 != n2 || n2 != n3 {
            // can only check against the winding normal if they are consistent
            continue;
        }
        let (p1, p2, p3) = (
            vertices.positions[a as usize],
            vertices.positions[b as usize],
            vertices.positions[c as usize],
        );
        let face_normal = (p2 - p1).cross(p3 - p1);
        if face_normal.dot(n1) < 0.0 {
            diag.warn(format!(
                "surface normal {face_normal} calculated from vertices {p1}, {p2}, {p3} of \
                 geometry '{geometry_name}' points in the opposite direction of the supplied \
                 vertex normals {n1}"
            ));
            warnings += 1;
        }
    }
    warnings
}
