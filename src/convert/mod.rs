//! The conversion pipeline. [`convert_scene`] instantiates the scene graph
//! with object-space geometry and local transforms; [`convert_mesh`] bakes
//! everything into a single world-space mesh. Both resolve materials and
//! report warnings through a per-run [`Diagnostics`] sink.

pub mod assembler;
pub mod dedup;
pub mod flatten;
pub mod material;
pub mod scene;
pub mod submesh;
pub mod transform;

use std::collections::HashSet;

use anyhow::Result;
use glam::Mat4;

use crate::diag::{Diagnostics, Outcome};
use crate::document::{Document, SceneNode};
use crate::output::{FlatMesh, GraphNode, ResolvedMaterial};
use crate::report::stats::{GeometryUsage, UsageStats};

#[derive(Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Cross-check triangle windings against vertex normals. Suspicious
    /// faces are only reported, never reordered.
    pub check_windings: bool,
    /// Collect per-geometry triangle/line/instance counts.
    pub geometry_stats: bool,
}

pub struct SceneOutput {
    /// Unnamed-in-source reorientation node; the actual scene roots are its
    /// children.
    pub root: GraphNode,
    pub materials: Vec<ResolvedMaterial>,
    pub stats: Option<Vec<GeometryUsage>>,
    pub outcome: Outcome,
}

pub struct MeshOutput {
    pub mesh: FlatMesh,
    pub materials: Vec<ResolvedMaterial>,
    pub stats: Option<Vec<GeometryUsage>>,
    pub outcome: Outcome,
}

pub fn convert_scene(doc: &Document, options: &ConvertOptions) -> Result<SceneOutput> {
    let diag = Diagnostics::new();
    let (root, stats) = scene::SceneInstantiator::new(doc, options, &diag).instantiate()?;
    let materials = material::resolve_materials(doc, &diag);
    Ok(SceneOutput {
        root,
        materials,
        stats: stats.map(UsageStats::into_sorted),
        outcome: diag.outcome(),
    })
}

pub fn convert_mesh(doc: &Document, options: &ConvertOptions) -> Result<MeshOutput> {
    let diag = Diagnostics::new();
    let (mesh, stats) = flatten::flatten_scene(doc, options, &diag)?;
    let materials = material::resolve_materials(doc, &diag);
    Ok(MeshOutput {
        mesh,
        materials,
        stats: stats.map(UsageStats::into_sorted),
        outcome: diag.outcome(),
    })
}

/// Walks the scene and reports geometry instances that cannot produce a mesh,
/// in encounter order without duplicates. An instance is reported both when
/// its identifier was never ingested and when the geometry was ingested but
/// assembles to nothing; the latter case is labeled with the stored geometry
/// name, the former with the raw identifier. A diagnostic aid for incomplete
/// documents; the converters themselves tolerate dangling references. The
/// dry-run assembly keeps its diagnostics out of any caller's warning count.
pub fn check_geometry_references(doc: &Document) -> Vec<String> {
    let scratch = Diagnostics::new();
    let buildable: HashSet<&str> = doc
        .geometries()
        .iter()
        .filter(|geometry| {
            assembler::assemble_geometry(geometry, Mat4::IDENTITY, None, doc, false, &scratch)
                .is_some()
        })
        .map(|geometry| geometry.id.as_str())
        .collect();

    fn visit(
        doc: &Document,
        node: &SceneNode,
        buildable: &HashSet<&str>,
        flagged: &mut Vec<String>,
        seen_libraries: &mut Vec<String>,
    ) {
        for instance in &node.geometry_instances {
            if !buildable.contains(instance.geometry.as_str())
                && !flagged.contains(&instance.geometry)
            {
                flagged.push(instance.geometry.clone());
            }
        }
        for reference in &node.node_instances {
            if let Some(library) = doc.library_node(&reference.library_node)
                && !seen_libraries.contains(&library.id)
            {
                seen_libraries.push(library.id.clone());
                visit(doc, library, buildable, flagged, seen_libraries);
            }
        }
        for child in &node.children {
            visit(doc, child, buildable, flagged, seen_libraries);
        }
    }

    let mut flagged = Vec::new();
    let mut seen_libraries = Vec::new();
    for root in doc.roots() {
        visit(doc, root, &buildable, &mut flagged, &mut seen_libraries);
    }
    flagged
        .into_iter()
        .map(|id| match doc.find_geometry(&id) {
            Some(geometry) => geometry.name.clone(),
            None => id,
        })
        .collect()
}
