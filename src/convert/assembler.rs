use glam::Mat4;

use crate::convert::dedup::AttributeArrays;
use crate::convert::submesh::build_submesh;
use crate::diag::Diagnostics;
use crate::document::{Document, Geometry, MaterialBinding};
use crate::output::{DEFAULT_MATERIAL, Submesh};

pub struct AssembledGeometry {
    pub submeshes: Vec<Submesh>,
    pub triangles: usize,
    pub lines: usize,
    pub winding_warnings: usize,
}

/// Runs every primitive group of a geometry through the submesh builder,
/// applying `transform` to the emitted vertices and, when bindings are
/// supplied, resolving each group's material slot to a material name.
/// Returns `None` only when no group produced a valid submesh; partial
/// success is still success.
pub fn assemble_geometry(
    geometry: &Geometry,
    transform: Mat4,
    bindings: Option<&[MaterialBinding]>,
    doc: &Document,
    check_windings: bool,
    diag: &Diagnostics,
) -> Option<AssembledGeometry> {
    if geometry.primitives.is_empty() {
        diag.warn(format!(
            "primitive group count for geometry '{}' is zero; no valid mesh can come of this",
            geometry.name
        ));
        return None;
    }

    let arrays = AttributeArrays {
        positions: &geometry.positions,
        normals: (!geometry.normals.is_empty()).then_some(geometry.normals.as_slice()),
        texcoords: (!geometry.texcoords.is_empty()).then_some(geometry.texcoords.as_slice()),
    };

    let mut assembled = AssembledGeometry {
        submeshes: Vec::with_capacity(geometry.primitives.len()),
        triangles: 0,
        lines: 0,
        winding_warnings: 0,
    };

    for prim in &geometry.primitives {
        let Some(mut built) =
            build_submesh(&geometry.name, prim, arrays, transform, check_windings, diag)
        else {
            continue;
        };
        if let Some(bindings) = bindings {
            built.submesh.material =
                resolve_binding(&geometry.name, prim.material_slot, bindings, doc, diag);
        }
        assembled.triangles += built.triangles;
        assembled.lines += built.lines;
        assembled.winding_warnings += built.winding_warnings;
        assembled.submeshes.push(built.submesh);
    }

    if assembled.submeshes.is_empty() {
        diag.warn(format!(
            "not returning a valid submesh for geometry '{}'",
            geometry.name
        ));
        return None;
    }
    Some(assembled)
}

/// Looks the primitive group's material slot up in the instance's binding
/// list. Matching is by slot identifier, not positional; the first binding
/// that both matches the slot and names a known material wins. No match
/// falls back to the default unlit material.
fn resolve_binding(
    geometry_name: &str,
    slot: u32,
    bindings: &[MaterialBinding],
    doc: &Document,
    diag: &Diagnostics,
) -> String {
    for binding in bindings.iter().filter(|b| b.slot == slot) {
        match doc.find_material(&binding.material) {
            Some(material) => return material.name.clone(),
            None => diag.warn(format!(
                "geometry '{geometry_name}' refers to material '{}' as slot {slot} but it \
                 cannot be found in the materials map",
                binding.material
            )),
        }
    }
    diag.warn(format!(
        "geometry '{geometry_name}' refers to material slot {slot} but it cannot be found in \
         the supplied material bindings. Using {DEFAULT_MATERIAL}"
    ));
    DEFAULT_MATERIAL.to_string()
}
