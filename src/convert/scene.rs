use std::collections::HashMap;

use anyhow::{Result, bail};
use glam::Mat4;

use crate::convert::ConvertOptions;
use crate::convert::assembler::assemble_geometry;
use crate::convert::transform::{document_shim, node_local_transform};
use crate::diag::Diagnostics;
use crate::document::{Document, SceneNode};
use crate::output::{GraphNode, Submesh};
use crate::report::stats::UsageStats;

/// Instantiates the visual scene as a graph of named nodes with local
/// transforms and attached submesh/material pairs. Geometry is assembled
/// once in object space; library subtrees are replayed (copied) per
/// instantiation under uniquified name prefixes.
pub struct SceneInstantiator<'a> {
    doc: &'a Document,
    diag: &'a Diagnostics,
    /// Object-space submeshes per geometry id.
    meshes: HashMap<String, Vec<Submesh>>,
    stats: Option<UsageStats>,
}

impl<'a> SceneInstantiator<'a> {
    pub fn new(doc: &'a Document, options: &ConvertOptions, diag: &'a Diagnostics) -> Self {
        let mut stats = options.geometry_stats.then(|| UsageStats::new(doc));
        let mut meshes = HashMap::new();
        for geometry in doc.geometries() {
            let Some(assembled) = assemble_geometry(
                geometry,
                Mat4::IDENTITY,
                None,
                doc,
                options.check_windings,
                diag,
            ) else {
                continue;
            };
            if let Some(stats) = stats.as_mut() {
                stats.record_counts(&geometry.id, assembled.triangles, assembled.lines);
            }
            meshes.insert(geometry.id.clone(), assembled.submeshes);
        }
        Self {
            doc,
            diag,
            meshes,
            stats,
        }
    }

    /// Walks all visual-scene roots under a "shim" node that reorients the
    /// document's up axis and unit scale. Fails only on a library-node
    /// instancing cycle.
    pub fn instantiate(mut self) -> Result<(GraphNode, Option<UsageStats>)> {
        let mut shim = GraphNode::new("root");
        shim.transform = document_shim(self.doc.asset());

        let mut visiting = Vec::new();
        for root in self.doc.roots() {
            let mut node = GraphNode::new(root.name.clone());
            self.visit(root, &mut node, &format!("{}:", root.name), &mut visiting)?;
            shim.children.push(node);
        }
        Ok((shim, self.stats))
    }

    fn visit(
        &mut self,
        node: &SceneNode,
        out: &mut GraphNode,
        prefix: &str,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(local) = node_local_transform(node, self.diag) {
            out.transform = local;
        }

        // a library instance that is the sole child of a plain transform
        // node collapses into that node instead of adding a graph level
        if node.geometry_instances.is_empty()
            && node.children.is_empty()
            && let [reference] = node.node_instances.as_slice()
        {
            let Some(library) = self.doc.library_node(&reference.library_node) else {
                self.diag.warn(format!(
                    "could not find library node '{}'",
                    reference.library_node
                ));
                return Ok(());
            };
            if library.transforms.is_empty() {
                if !library.name.is_empty() {
                    out.library_source = Some(library.name.clone());
                }
                let prefix = format!("{}:{}:", out.name, library.id);
                return self.visit_library(library, out, &prefix, visiting);
            }
        }

        for reference in &node.node_instances {
            let Some(library) = self.doc.library_node(&reference.library_node) else {
                self.diag.warn(format!(
                    "could not find library node '{}'",
                    reference.library_node
                ));
                continue;
            };
            let name = format!("{prefix}LibraryInstance_{}", reference.library_node);
            let mut child = GraphNode::new(name.clone());
            if !library.name.is_empty() {
                child.library_source = Some(library.name.clone());
            }
            self.visit_library(library, &mut child, &format!("{name}:"), visiting)?;
            out.children.push(child);
        }

        for instance in &node.geometry_instances {
            let Some(submeshes) = self.meshes.get(&instance.geometry) else {
                self.diag.warn(format!(
                    "geometry instance '{}' is not a mesh we know about",
                    instance.geometry
                ));
                continue;
            };
            let mut attached = submeshes.clone();
            for binding in &instance.bindings {
                let Some(material) = self.doc.find_material(&binding.material) else {
                    self.diag.warn(format!(
                        "material '{}' is not found in the stored materials",
                        binding.material
                    ));
                    continue;
                };
                let mut found = false;
                for submesh in attached
                    .iter_mut()
                    .filter(|submesh| submesh.material_slot == binding.slot)
                {
                    submesh.material = material.name.clone();
                    found = true;
                }
                if !found {
                    self.diag.warn(format!(
                        "geometry instance '{}' has no submeshes matching material slot {} \
                         for material '{}'",
                        instance.geometry, binding.slot, material.name
                    ));
                }
            }
            out.submeshes.extend(attached);
            if let Some(stats) = self.stats.as_mut() {
                stats.record_instance(&instance.geometry);
            }
        }

        for camera_id in &node.camera_instances {
            match self.doc.find_camera(camera_id) {
                Some(camera) => out.cameras.push(camera.clone()),
                None => self
                    .diag
                    .warn(format!("could not find referenced camera '{camera_id}'")),
            }
        }

        for child in &node.children {
            let name = format!("{prefix}{}", child.id);
            let mut graph_child = GraphNode::new(name.clone());
            self.visit(child, &mut graph_child, &format!("{name}:"), visiting)?;
            out.children.push(graph_child);
        }

        Ok(())
    }

    /// Replays a library subtree into `out`. A subtree currently being
    /// replayed further up the stack means the input contains an instancing
    /// cycle, which would otherwise recurse forever.
    fn visit_library(
        &mut self,
        library: &'a SceneNode,
        out: &mut GraphNode,
        prefix: &str,
        visiting: &mut Vec<String>,
    ) -> Result<()> {
        if visiting.iter().any(|id| *id == library.id) {
            bail!("library node instancing cycle detected at '{}'", library.id);
        }
        visiting.push(library.id.clone());
        let result = self.visit(library, out, prefix, visiting);
        visiting.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    use crate::document::{
        DocumentSink, Geometry, GeometryInstance, Material, MaterialBinding, NodeInstance,
        NodeTransform, PrimitiveGroup, PrimitiveKind,
    };

    fn triangle_geometry(id: &str, slot: u32) -> Geometry {
        Geometry {
            id: id.to_string(),
            name: id.to_string(),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![],
            texcoords: vec![],
            primitives: vec![PrimitiveGroup {
                kind: PrimitiveKind::Triangles,
                material_slot: slot,
                position_indices: vec![0, 1, 2],
                normal_indices: None,
                texcoord_indices: None,
            }],
        }
    }

    fn geometry_node(id: &str, geometry: &str, bindings: Vec<MaterialBinding>) -> SceneNode {
        SceneNode {
            id: id.to_string(),
            name: id.to_string(),
            geometry_instances: vec![GeometryInstance {
                geometry: geometry.to_string(),
                bindings,
            }],
            ..Default::default()
        }
    }

    fn instantiate(doc: &Document, options: &ConvertOptions, diag: &Diagnostics) -> GraphNode {
        SceneInstantiator::new(doc, options, diag)
            .instantiate()
            .unwrap()
            .0
    }

    #[test]
    fn library_instancing_produces_independent_copies() {
        let mut doc = Document::new();
        doc.geometry(triangle_geometry("geo", 0));
        // the library node carries its own transform, so no collapse applies
        doc.library_nodes(vec![SceneNode {
            id: "lib".to_string(),
            name: "Shared".to_string(),
            transforms: vec![NodeTransform::Matrix(Mat4::from_translation(Vec3::Z))],
            geometry_instances: vec![GeometryInstance {
                geometry: "geo".to_string(),
                bindings: vec![],
            }],
            ..Default::default()
        }]);
        let parent = |id: &str, shift: Vec3| SceneNode {
            id: id.to_string(),
            name: id.to_string(),
            transforms: vec![NodeTransform::Matrix(Mat4::from_translation(shift))],
            node_instances: vec![NodeInstance {
                library_node: "lib".to_string(),
            }],
            children: vec![SceneNode {
                id: format!("{id}-marker"),
                name: format!("{id}-marker"),
                ..Default::default()
            }],
            ..Default::default()
        };
        doc.visual_scene(vec![parent("left", Vec3::X), parent("right", Vec3::Y)]);

        let diag = Diagnostics::new();
        let root = instantiate(&doc, &ConvertOptions::default(), &diag);
        assert_eq!(root.children.len(), 2);

        let copy_names: Vec<&str> = root
            .children
            .iter()
            .map(|parent| parent.children[0].name.as_str())
            .collect();
        assert_eq!(
            copy_names,
            ["left:LibraryInstance_lib", "right:LibraryInstance_lib"]
        );

        // same object-space geometry, different world positions
        let world = |parent: &GraphNode| {
            let copy = &parent.children[0];
            (parent.transform * copy.transform)
                .transform_point3(copy.submeshes[0].vertices.positions[0])
        };
        let left = world(&root.children[0]);
        let right = world(&root.children[1]);
        assert_relative_eq!(left, Vec3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(right, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(
            root.children[0].children[0].library_source.as_deref(),
            Some("Shared")
        );
    }

    #[test]
    fn transform_less_sole_instance_collapses_into_the_node() {
        let mut doc = Document::new();
        doc.geometry(triangle_geometry("geo", 0));
        doc.library_nodes(vec![SceneNode {
            id: "lib".to_string(),
            name: "Shared".to_string(),
            geometry_instances: vec![GeometryInstance {
                geometry: "geo".to_string(),
                bindings: vec![],
            }],
            ..Default::default()
        }]);
        doc.visual_scene(vec![SceneNode {
            id: "holder".to_string(),
            name: "holder".to_string(),
            transforms: vec![NodeTransform::Matrix(Mat4::from_translation(Vec3::X))],
            node_instances: vec![NodeInstance {
                library_node: "lib".to_string(),
            }],
            ..Default::default()
        }]);

        let diag = Diagnostics::new();
        let root = instantiate(&doc, &ConvertOptions::default(), &diag);
        let holder = &root.children[0];
        // no intermediate graph node; the geometry hangs off the holder
        assert!(holder.children.is_empty());
        assert_eq!(holder.submeshes.len(), 1);
        assert_eq!(holder.library_source.as_deref(), Some("Shared"));
    }

    #[test]
    fn instancing_cycles_are_fatal() {
        let mut doc = Document::new();
        let looped = |id: &str, target: &str| SceneNode {
            id: id.to_string(),
            name: id.to_string(),
            node_instances: vec![NodeInstance {
                library_node: target.to_string(),
            }],
            // a sibling child defeats the collapse optimization
            children: vec![SceneNode {
                id: format!("{id}-extra"),
                name: format!("{id}-extra"),
                ..Default::default()
            }],
            ..Default::default()
        };
        doc.library_nodes(vec![looped("lib-a", "lib-b"), looped("lib-b", "lib-a")]);
        doc.visual_scene(vec![SceneNode {
            id: "top".to_string(),
            name: "top".to_string(),
            node_instances: vec![NodeInstance {
                library_node: "lib-a".to_string(),
            }],
            children: vec![SceneNode {
                id: "top-extra".to_string(),
                name: "top-extra".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }]);

        let diag = Diagnostics::new();
        let result = SceneInstantiator::new(&doc, &ConvertOptions::default(), &diag).instantiate();
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("cycle"));
    }

    #[test]
    fn missing_geometry_reference_skips_but_siblings_survive() {
        let mut doc = Document::new();
        doc.geometry(triangle_geometry("real", 0));
        doc.visual_scene(vec![SceneNode {
            id: "top".to_string(),
            name: "top".to_string(),
            children: vec![
                geometry_node("broken", "phantom", vec![]),
                geometry_node("ok", "real", vec![]),
            ],
            ..Default::default()
        }]);

        let diag = Diagnostics::new();
        let root = instantiate(&doc, &ConvertOptions::default(), &diag);
        let top = &root.children[0];
        assert_eq!(top.children.len(), 2);
        assert!(top.children[0].submeshes.is_empty());
        assert_eq!(top.children[1].submeshes.len(), 1);
        assert_eq!(top.children[1].name, "top:ok");
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn bindings_assign_material_names_per_slot() {
        let mut doc = Document::new();
        let mut geometry = triangle_geometry("geo", 0);
        geometry.primitives.push(PrimitiveGroup {
            kind: PrimitiveKind::Triangles,
            material_slot: 1,
            position_indices: vec![0, 1, 2],
            normal_indices: None,
            texcoord_indices: None,
        });
        doc.geometry(geometry);
        doc.material(Material {
            id: "mat".to_string(),
            name: "Paint".to_string(),
            effect: "fx".to_string(),
        });
        doc.visual_scene(vec![geometry_node(
            "top",
            "geo",
            vec![MaterialBinding {
                slot: 1,
                material: "mat".to_string(),
            }],
        )]);

        let diag = Diagnostics::new();
        let root = instantiate(&doc, &ConvertOptions::default(), &diag);
        let submeshes = &root.children[0].submeshes;
        assert_eq!(submeshes.len(), 2);
        assert_eq!(submeshes[0].material, crate::output::DEFAULT_MATERIAL);
        assert_eq!(submeshes[1].material, "Paint");
    }

    #[test]
    fn instance_counts_accumulate_in_stats() {
        let mut doc = Document::new();
        doc.geometry(triangle_geometry("geo", 0));
        doc.visual_scene(vec![SceneNode {
            id: "top".to_string(),
            name: "top".to_string(),
            children: vec![
                geometry_node("a", "geo", vec![]),
                geometry_node("b", "geo", vec![]),
            ],
            ..Default::default()
        }]);

        let diag = Diagnostics::new();
        let options = ConvertOptions {
            geometry_stats: true,
            ..Default::default()
        };
        let (_, stats) = SceneInstantiator::new(&doc, &options, &diag)
            .instantiate()
            .unwrap();
        let rows = stats.unwrap().into_sorted();
        assert_eq!(rows[0].instances, 2);
        assert_eq!(rows[0].triangles, 1);
    }
}
