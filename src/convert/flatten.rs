use std::collections::HashMap;

use anyhow::{Result, bail};
use glam::Mat4;
use log::debug;

use crate::convert::ConvertOptions;
use crate::convert::assembler::assemble_geometry;
use crate::convert::transform::{document_shim, node_local_transform};
use crate::diag::Diagnostics;
use crate::document::{Document, MaterialBinding, SceneNode};
use crate::output::FlatMesh;
use crate::report::stats::UsageStats;

/// One instantiation of a geometry: the world transform in effect at the
/// instancing node plus the material bindings declared there.
struct Placement {
    transform: Mat4,
    bindings: Vec<MaterialBinding>,
}

/// Bakes the whole scene into a single mesh. Stage one walks the graph and
/// records where each geometry is used; stage two revisits the geometries in
/// ingestion order and emits their submeshes with world transforms applied,
/// so the output ordering does not depend on graph layout.
pub fn flatten_scene(
    doc: &Document,
    options: &ConvertOptions,
    diag: &Diagnostics,
) -> Result<(FlatMesh, Option<UsageStats>)> {
    let Some(first_root) = doc.roots().first() else {
        bail!("the visual scene has no root nodes, nothing to flatten");
    };

    let shim = document_shim(doc.asset());
    let mut placements: HashMap<String, Vec<Placement>> = HashMap::new();
    let mut visiting = Vec::new();
    for root in doc.roots() {
        collect_placements(doc, root, shim, &mut placements, &mut visiting, diag)?;
    }

    let mut stats = options.geometry_stats.then(|| UsageStats::new(doc));
    let mut mesh = FlatMesh {
        name: format!("{}_mesh", first_root.name),
        submeshes: Vec::new(),
    };
    for geometry in doc.geometries() {
        let Some(uses) = placements.get(&geometry.id) else {
            debug!(
                "geometry '{}' is never instantiated, leaving it out of the mesh",
                geometry.name
            );
            continue;
        };
        for placement in uses {
            let Some(assembled) = assemble_geometry(
                geometry,
                placement.transform,
                Some(&placement.bindings),
                doc,
                options.check_windings,
                diag,
            ) else {
                continue;
            };
            if let Some(stats) = stats.as_mut() {
                stats.record_counts(&geometry.id, assembled.triangles, assembled.lines);
                stats.record_instance(&geometry.id);
            }
            mesh.submeshes.extend(assembled.submeshes);
        }
    }

    if mesh.submeshes.is_empty() {
        bail!("no valid submeshes could be produced from the scene");
    }
    Ok((mesh, stats))
}

fn collect_placements(
    doc: &Document,
    node: &SceneNode,
    parent: Mat4,
    placements: &mut HashMap<String, Vec<Placement>>,
    visiting: &mut Vec<String>,
    diag: &Diagnostics,
) -> Result<()> {
    let world = match node_local_transform(node, diag) {
        Some(local) => parent * local,
        None => parent,
    };

    for instance in &node.geometry_instances {
        placements
            .entry(instance.geometry.clone())
            .or_default()
            .push(Placement {
                transform: world,
                bindings: instance.bindings.clone(),
            });
    }

    for reference in &node.node_instances {
        let Some(library) = doc.library_node(&reference.library_node) else {
            diag.warn(format!(
                "could not find library node '{}'",
                reference.library_node
            ));
            continue;
        };
        if visiting.iter().any(|id| *id == library.id) {
            bail!("library node instancing cycle detected at '{}'", library.id);
        }
        visiting.push(library.id.clone());
        let result = collect_placements(doc, library, world, placements, visiting, diag);
        visiting.pop();
        result?;
    }

    for child in &node.children {
        collect_placements(doc, child, world, placements, visiting, diag)?;
    }
    Ok(())
}
