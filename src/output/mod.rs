use std::fmt::{Debug, Formatter};

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::document::Camera;

/// Material name assigned to submeshes that no binding matched.
pub const DEFAULT_MATERIAL: &str = "DefaultUnlit";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Topology {
    TriangleList,
    LineList,
}

/// Deduplicated single-index vertex data. Normals and texcoords are either
/// empty or exactly as long as the position buffer, depending on which
/// attribute streams the source primitive group carried.
#[derive(Clone, Default)]
pub struct VertexData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
}

impl VertexData {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Debug for VertexData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ positions: [{}], ", self.positions.len())?;
        write!(f, "normals: [{}], ", self.normals.len())?;
        write!(f, "texcoords: [{}] }}", self.texcoords.len())
    }
}

/// One contiguous run of geometry sharing a topology and a material slot.
#[derive(Clone)]
pub struct Submesh {
    pub topology: Topology,
    /// Slot identifier used for binding lookup, not a global material id.
    pub material_slot: u32,
    /// Resolved material name; [`DEFAULT_MATERIAL`] until a binding matches.
    pub material: String,
    pub vertices: VertexData,
    pub indices: Vec<u32>,
}

impl Debug for Submesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ topology: {:?}, slot: {}, material: {}, vertices: {:?}, indices: [{}] }}",
            self.topology,
            self.material_slot,
            self.material,
            self.vertices,
            self.indices.len()
        )
    }
}

/// A single combined mesh with world transforms baked into the vertices.
#[derive(Clone, Debug)]
pub struct FlatMesh {
    pub name: String,
    pub submeshes: Vec<Submesh>,
}

/// One node of the instantiated scene graph. Transforms are local; the
/// effective transform of a node is the composition down from the root.
#[derive(Clone)]
pub struct GraphNode {
    pub name: String,
    pub transform: Mat4,
    /// Name of the library subtree this node was replayed from, if any.
    pub library_source: Option<String>,
    pub submeshes: Vec<Submesh>,
    pub cameras: Vec<Camera>,
    pub children: Vec<GraphNode>,
}

impl GraphNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            library_source: None,
            submeshes: Vec::new(),
            cameras: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl Debug for GraphNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ name: {}, submeshes: [{}], cameras: [{}], children: {:?} }}",
            self.name,
            self.submeshes.len(),
            self.cameras.len(),
            self.children
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShadingMode {
    /// Smooth per-pixel shading (source Blinn and Phong both land here).
    Phong,
    /// Flat/per-vertex shading (source Constant and Lambert).
    Gouraud,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ChannelValue {
    Color(Vec4),
    /// Name of a previously ingested texture image.
    Texture(String),
}

/// One rendering pass of a resolved material.
#[derive(Clone, Debug)]
pub struct MaterialPass {
    pub shading: ShadingMode,
    pub ambient: Option<ChannelValue>,
    pub diffuse: Option<ChannelValue>,
    pub specular: Option<ChannelValue>,
    pub emissive: Option<ChannelValue>,
    pub shininess: Option<f32>,
    pub alpha_blend: bool,
    pub depth_write: bool,
}

impl Default for MaterialPass {
    fn default() -> Self {
        Self {
            shading: ShadingMode::Gouraud,
            ambient: None,
            diffuse: None,
            specular: None,
            emissive: None,
            shininess: None,
            alpha_blend: false,
            depth_write: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedMaterial {
    pub name: String,
    /// Back-face culling disabled for the whole material.
    pub two_sided: bool,
    pub passes: Vec<MaterialPass>,
}
