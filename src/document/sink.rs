use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::document::{Camera, Effect, Geometry, GlobalAsset, Image, Material, SceneNode};

/// Vendor-extension profile carrying the out-of-band double-sided flag.
pub const DOUBLE_SIDED_PROFILE: &str = "GOOGLEEARTH";
pub const DOUBLE_SIDED_ELEMENT: &str = "double_sided";

/// Receiver for parser events, one method per entity kind. Every method has
/// a no-op default so a pass only implements the events it cares about;
/// wrap-and-forward composition replaces subclass overriding.
pub trait DocumentSink {
    fn global_asset(&mut self, _asset: GlobalAsset) {}
    fn geometry(&mut self, _geometry: Geometry) {}
    fn material(&mut self, _material: Material) {}
    fn effect(&mut self, _effect: Effect) {}
    fn image(&mut self, _image: Image) {}
    fn camera(&mut self, _camera: Camera) {}
    fn library_nodes(&mut self, _nodes: Vec<SceneNode>) {}
    fn visual_scene(&mut self, _roots: Vec<SceneNode>) {}
    /// Side channel for vendor `<extra>` data, keyed by profile and element
    /// name. Values are scoped to the most recently ingested effect.
    fn vendor_extra(&mut self, _profile: &str, _element: &str, _text: &str) {}
}

/// The conversion context: every lookup table the pipeline needs, filled by
/// a single ingestion pass and read-only afterwards.
#[derive(Default)]
pub struct Document {
    asset: GlobalAsset,
    geometries: Vec<Geometry>,
    geometry_index: HashMap<String, usize>,
    materials: Vec<Material>,
    material_index: HashMap<String, usize>,
    effects: HashMap<String, Effect>,
    images: HashMap<String, String>,
    cameras: HashMap<String, Camera>,
    library_nodes: HashMap<String, SceneNode>,
    roots: Vec<SceneNode>,
    double_sided_effects: HashSet<String>,
    last_effect: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset(&self) -> &GlobalAsset {
        &self.asset
    }

    /// Geometries in ingestion order.
    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn find_geometry(&self, id: &str) -> Option<&Geometry> {
        self.geometry_index.get(id).map(|&i| &self.geometries[i])
    }

    /// Materials in ingestion order.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn find_material(&self, id: &str) -> Option<&Material> {
        self.material_index.get(id).map(|&i| &self.materials[i])
    }

    pub fn find_effect(&self, id: &str) -> Option<&Effect> {
        self.effects.get(id)
    }

    /// Target-engine texture name recorded for an image id.
    pub fn texture_name(&self, image_id: &str) -> Option<&str> {
        self.images.get(image_id).map(String::as_str)
    }

    pub fn find_camera(&self, id: &str) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn library_node(&self, id: &str) -> Option<&SceneNode> {
        self.library_nodes.get(id)
    }

    /// The full library-node table. Named apart from the
    /// [`DocumentSink::library_nodes`] ingestion method, which would otherwise
    /// shadow it on `Document`.
    pub fn library_node_table(&self) -> &HashMap<String, SceneNode> {
        &self.library_nodes
    }

    /// Root nodes of the visual scene, in ingestion order.
    pub fn roots(&self) -> &[SceneNode] {
        &self.roots
    }

    pub fn is_double_sided(&self, effect_id: &str) -> bool {
        self.double_sided_effects.contains(effect_id)
    }
}

impl DocumentSink for Document {
    fn global_asset(&mut self, asset: GlobalAsset) {
        self.asset = asset;
    }

    fn geometry(&mut self, geometry: Geometry) {
        self.geometry_index
            .insert(geometry.id.clone(), self.geometries.len());
        self.geometries.push(geometry);
    }

    fn material(&mut self, material: Material) {
        self.material_index
            .insert(material.id.clone(), self.materials.len());
        self.materials.push(material);
    }

    fn effect(&mut self, effect: Effect) {
        self.last_effect = Some(effect.id.clone());
        self.effects.insert(effect.id.clone(), effect);
    }

    fn image(&mut self, image: Image) {
        self.images.insert(image.id, image.uri);
    }

    fn camera(&mut self, camera: Camera) {
        self.cameras.insert(camera.id.clone(), camera);
    }

    fn library_nodes(&mut self, nodes: Vec<SceneNode>) {
        for node in nodes {
            if node.name.is_empty() {
                // seems strange that a library node wouldn't have a name
                warn!("library node '{}' has no name, skipping it", node.id);
                continue;
            }
            self.library_nodes.insert(node.id.clone(), node);
        }
    }

    fn visual_scene(&mut self, mut roots: Vec<SceneNode>) {
        self.roots.append(&mut roots);
    }

    fn vendor_extra(&mut self, profile: &str, element: &str, text: &str) {
        if profile != DOUBLE_SIDED_PROFILE || element != DOUBLE_SIDED_ELEMENT {
            return;
        }
        if text.trim() != "1" {
            return;
        }
        match &self.last_effect {
            Some(effect) => {
                self.double_sided_effects.insert(effect.clone());
            }
            None => debug!("double-sided flag seen before any effect, ignoring"),
        }
    }
}
