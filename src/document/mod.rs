//! Input data model: the entities an external scene-description parser
//! delivers, in arbitrary order, through [`sink::DocumentSink`]. All entities
//! are immutable once ingested; conversion only reads them.

pub mod sink;

use glam::{Mat4, Vec3, Vec4};

pub use sink::{Document, DocumentSink};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

/// Global document metadata: coordinate convention, unit scale, and the
/// authoring-tool string used for exporter quirk detection.
#[derive(Clone, Debug)]
pub struct GlobalAsset {
    pub up_axis: UpAxis,
    /// Length of one document unit in meters.
    pub unit_scale_meters: f32,
    pub authoring_tool: Option<String>,
}

impl Default for GlobalAsset {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            unit_scale_meters: 1.0,
            authoring_tool: None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PrimitiveKind {
    Triangles,
    Lines,
    /// Arbitrary polygons with a per-polygon vertex count; only supported
    /// when every polygon is a triangle.
    Polylist { vertex_counts: Vec<u32> },
}

/// One primitive group of a geometry: a topology, a material slot, and one
/// raw index stream per attribute present. Streams are expected to have
/// equal length.
#[derive(Clone, Debug)]
pub struct PrimitiveGroup {
    pub kind: PrimitiveKind,
    /// Binding-lookup slot scoped to the geometry instance, not a global
    /// material identifier.
    pub material_slot: u32,
    pub position_indices: Vec<u32>,
    pub normal_indices: Option<Vec<u32>>,
    pub texcoord_indices: Option<Vec<u32>>,
}

/// A geometry: flat attribute arrays (3 floats per position/normal, 2 per
/// texcoord) and the primitive groups indexing into them independently.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub id: String,
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub primitives: Vec<PrimitiveGroup>,
}

#[derive(Clone, Debug)]
pub enum NodeTransform {
    Matrix(Mat4),
    /// Camera-style placement, resolved to a matrix during traversal.
    LookAt { eye: Vec3, target: Vec3, up: Vec3 },
}

/// Pairs a primitive group's material slot with a concrete material id,
/// scoped to one geometry instance.
#[derive(Clone, Debug)]
pub struct MaterialBinding {
    pub slot: u32,
    pub material: String,
}

#[derive(Clone, Debug)]
pub struct GeometryInstance {
    pub geometry: String,
    pub bindings: Vec<MaterialBinding>,
}

/// Reference to a library node (a shared subtree) by identifier.
#[derive(Clone, Debug)]
pub struct NodeInstance {
    pub library_node: String,
}

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub id: String,
    pub name: String,
    /// Zero or one entries are supported; more produce a warning and are
    /// ignored entirely.
    pub transforms: Vec<NodeTransform>,
    pub geometry_instances: Vec<GeometryInstance>,
    pub node_instances: Vec<NodeInstance>,
    pub camera_instances: Vec<String>,
    pub children: Vec<SceneNode>,
}

#[derive(Clone, Debug)]
pub struct Material {
    pub id: String,
    pub name: String,
    /// Identifier of the effect carrying the shading parameters; joined at
    /// resolution time.
    pub effect: String,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ColorOrTexture {
    Color(Vec4),
    /// Reference to an ingested image by identifier.
    Texture { image: String },
}

#[derive(Clone, PartialEq, Debug)]
pub enum FloatOrParam {
    Float(f32),
    Param(String),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShaderClass {
    Blinn,
    Phong,
    Constant,
    Lambert,
    Other,
}

/// One common-profile record of an effect; each becomes one rendering pass
/// of the resolved material.
#[derive(Clone, Debug)]
pub struct EffectPass {
    pub shader: ShaderClass,
    pub ambient: Option<ColorOrTexture>,
    pub diffuse: Option<ColorOrTexture>,
    pub specular: Option<ColorOrTexture>,
    pub emissive: Option<ColorOrTexture>,
    pub opacity: Option<ColorOrTexture>,
    pub shininess: Option<FloatOrParam>,
}

impl Default for EffectPass {
    fn default() -> Self {
        Self {
            shader: ShaderClass::Other,
            ambient: None,
            diffuse: None,
            specular: None,
            emissive: None,
            opacity: None,
            shininess: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Effect {
    pub id: String,
    pub passes: Vec<EffectPass>,
}

/// A texture image reference. Decoding is out of scope; the URI doubles as
/// the texture name handed to the target engine.
#[derive(Clone, Debug)]
pub struct Image {
    pub id: String,
    pub uri: String,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub y_fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}
