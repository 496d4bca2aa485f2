use std::collections::HashMap;
use std::fmt::Write;

use itertools::Itertools;

use crate::document::Document;

/// Per-geometry usage numbers collected during conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeometryUsage {
    pub name: String,
    pub triangles: usize,
    pub lines: usize,
    pub instances: usize,
}

/// Accumulator for geometry usage statistics. Every ingested geometry is
/// pre-registered with zero counts so unused geometries still show up in the
/// report.
#[derive(Debug)]
pub struct UsageStats {
    order: Vec<String>,
    entries: HashMap<String, GeometryUsage>,
}

impl UsageStats {
    pub fn new(doc: &Document) -> Self {
        let mut entries = HashMap::new();
        let mut order = Vec::with_capacity(doc.geometries().len());
        for geometry in doc.geometries() {
            order.push(geometry.id.clone());
            entries.insert(
                geometry.id.clone(),
                GeometryUsage {
                    name: geometry.name.clone(),
                    triangles: 0,
                    lines: 0,
                    instances: 0,
                },
            );
        }
        Self { order, entries }
    }

    pub fn record_counts(&mut self, geometry_id: &str, triangles: usize, lines: usize) {
        if let Some(entry) = self.entries.get_mut(geometry_id) {
            entry.triangles = triangles;
            entry.lines = lines;
        }
    }

    /// Returns false when the geometry id was never registered.
    pub fn record_instance(&mut self, geometry_id: &str) -> bool {
        match self.entries.get_mut(geometry_id) {
            Some(entry) => {
                entry.instances += 1;
                true
            }
            None => false,
        }
    }

    /// Rows sorted by triangle-count x instance-count, biggest first; ties
    /// keep ingestion order.
    pub fn into_sorted(mut self) -> Vec<GeometryUsage> {
        self.order
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .sorted_by_key(|usage| std::cmp::Reverse(usage.triangles * usage.instances))
            .collect()
    }
}

/// Renders the usage rows as a tab-separated table, one geometry per line.
pub fn render_table(rows: &[GeometryUsage]) -> String {
    let mut out = String::from("name\ttriangles\tlines\tinstances\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            row.name, row.triangles, row.lines, row.instances
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentSink, Geometry};

    fn doc_with_geometries(ids: &[&str]) -> Document {
        let mut doc = Document::new();
        for id in ids {
            doc.geometry(Geometry {
                id: id.to_string(),
                name: id.to_string(),
                positions: vec![],
                normals: vec![],
                texcoords: vec![],
                primitives: vec![],
            });
        }
        doc
    }

    #[test]
    fn sorts_by_triangles_times_instances_descending() {
        let doc = doc_with_geometries(&["small", "big", "unused"]);
        let mut stats = UsageStats::new(&doc);
        stats.record_counts("small", 10, 0);
        stats.record_instance("small");
        stats.record_counts("big", 4, 0);
        for _ in 0..5 {
            stats.record_instance("big");
        }
        let rows = stats.into_sorted();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        // 20 > 10 > 0
        assert_eq!(names, ["big", "small", "unused"]);
    }

    #[test]
    fn unknown_geometry_instance_is_reported() {
        let doc = doc_with_geometries(&["a"]);
        let mut stats = UsageStats::new(&doc);
        assert!(stats.record_instance("a"));
        assert!(!stats.record_instance("phantom"));
    }

    #[test]
    fn table_renders_one_row_per_geometry() {
        let doc = doc_with_geometries(&["a", "b"]);
        let stats = UsageStats::new(&doc);
        let table = render_table(&stats.into_sorted());
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("a\t0\t0\t0"));
    }
}
