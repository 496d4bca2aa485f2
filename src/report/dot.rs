use std::io::{self, Write};

use itertools::Itertools;

use crate::document::{Document, SceneNode};

/// Writes the source hierarchy as a GraphViz digraph, before any
/// instantiation or collapsing happens. Solid edges are parent/child
/// relations, dashed edges point at instanced library nodes. Library
/// subtrees come first, sorted by id so the output is reproducible, then
/// the visual-scene roots.
pub fn dump_dot(doc: &Document, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "digraph scene {{")?;
    for id in doc.library_node_table().keys().sorted() {
        if let Some(node) = doc.library_node(id) {
            write_node(node, out)?;
        }
    }
    for root in doc.roots() {
        write_node(root, out)?;
    }
    writeln!(out, "}}")
}

fn write_node(node: &SceneNode, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "  \"{}\" [label=\"{}\"];", node.id, label(node))?;
    for reference in &node.node_instances {
        writeln!(
            out,
            "  \"{}\" -> \"{}\" [style=dashed];",
            node.id, reference.library_node
        )?;
    }
    for child in &node.children {
        writeln!(out, "  \"{}\" -> \"{}\";", node.id, child.id)?;
        write_node(child, out)?;
    }
    Ok(())
}

fn label(node: &SceneNode) -> String {
    let name = if node.name.is_empty() {
        &node.id
    } else {
        &node.name
    };
    match node.geometry_instances.len() {
        0 => name.clone(),
        n => format!("{name} ({n} geom)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentSink, GeometryInstance, NodeInstance};

    fn render(doc: &Document) -> String {
        let mut buffer = Vec::new();
        dump_dot(doc, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn hierarchy_and_instancing_edges() {
        let mut doc = Document::new();
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
            id: "top".to_string(),
            name: "Top".to_string(),
            children: vec![SceneNode {
                id: "inner".to_string(),
                name: "Inner".to_string(),
                node_instances: vec![NodeInstance {
                    library_node: "lib".to_string(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }]);

        let dot = render(&doc);
        assert!(dot.starts_with("digraph scene {"));
        assert!(dot.contains("  \"top\" -> \"inner\";"));
        assert!(dot.contains("  \"inner\" -> \"lib\" [style=dashed];"));
        assert!(dot.contains("\"lib\" [label=\"Shared (1 geom)\"];"));
        // library subtrees precede the visual-scene roots
        let lib = dot.find("\"lib\" [label").unwrap();
        let top = dot.find("\"top\" [label").unwrap();
        assert!(lib < top);
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn library_nodes_come_out_sorted() {
        let mut doc = Document::new();
        doc.library_nodes(
            ["zeta", "alpha", "mid"]
                .into_iter()
                .map(|id| SceneNode {
                    id: id.to_string(),
                    name: id.to_string(),
                    ..Default::default()
                })
                .collect(),
        );
        let dot = render(&doc);
        let alpha = dot.find("\"alpha\" [label").unwrap();
        let mid = dot.find("\"mid\" [label").unwrap();
        let zeta = dot.find("\"zeta\" [label").unwrap();
        assert!(alpha < mid && mid < zeta);
    }
}
