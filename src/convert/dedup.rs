use std::collections::HashMap;

use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::convert::transform::normal_matrix;
use crate::output::VertexData;

/// The per-attribute raw indices identifying one logical vertex occurrence.
/// Which attributes are present is fixed for one primitive group.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IndexTuple {
    pub position: u32,
    pub normal: Option<u32>,
    pub texcoord: Option<u32>,
}

/// Borrowed views of a geometry's flat attribute arrays.
#[derive(Clone, Copy)]
pub struct AttributeArrays<'a> {
    pub positions: &'a [f32],
    pub normals: Option<&'a [f32]>,
    pub texcoords: Option<&'a [f32]>,
}

/// Collapses index tuples into a single output vertex index space, scoped to
/// one submesh. The first occurrence of a tuple gathers and transforms the
/// attribute values and allocates the next output index; repeats return the
/// index allocated before. Two distinct tuples never share an output index,
/// even when the gathered values coincide.
pub struct VertexInterner<'a> {
    arrays: AttributeArrays<'a>,
    transform: Mat4,
    rotscale: Mat3,
    lookup: HashMap<IndexTuple, u32>,
    vertices: VertexData,
}

impl<'a> VertexInterner<'a> {
    pub fn new(arrays: AttributeArrays<'a>, transform: Mat4) -> Self {
        Self {
            arrays,
            transform,
            rotscale: normal_matrix(&transform),
            lookup: HashMap::new(),
            vertices: VertexData::default(),
        }
    }

    /// Maps an index tuple to its output vertex index, allocating one in
    /// first-seen order if needed. Returns `None` when a raw index points
    /// outside its attribute array (or the array is missing entirely), which
    /// invalidates the submesh being built.
    pub fn resolve(&mut self, tuple: IndexTuple) -> Option<u32> {
        if let Some(&index) = self.lookup.get(&tuple) {
            return Some(index);
        }

        let position = self
            .transform
            .transform_point3(fetch_vec3(self.arrays.positions, tuple.position)?);
        let normal = match tuple.normal {
            Some(ni) => {
                let raw = fetch_vec3(self.arrays.normals?, ni)?;
                Some(self.rotscale.mul_vec3(raw).normalize())
            }
            None => None,
        };
        let texcoord = match tuple.texcoord {
            Some(ti) => {
                let raw = fetch_vec2(self.arrays.texcoords?, ti)?;
                // V flips to match the target engine convention
                Some(Vec2::new(raw.x, 1.0 - raw.y))
            }
            None => None,
        };

        let index = self.vertices.positions.len() as u32;
        self.vertices.positions.push(position);
        if let Some(normal) = normal {
            self.vertices.normals.push(normal);
        }
        if let Some(texcoord) = texcoord {
            self.vertices.texcoords.push(texcoord);
        }
        self.lookup.insert(tuple, index);
        Some(index)
    }

    pub fn vertices(&self) -> &VertexData {
        &self.vertices
    }

    pub fn into_vertices(self) -> VertexData {
        self.vertices
    }
}

fn fetch_vec3(values: &[f32], index: u32) -> Option<Vec3> {
    let at = index as usize * 3;
    values.get(at..at + 3).map(Vec3::from_slice)
}

fn fetch_vec2(values: &[f32], index: u32) -> Option<Vec2> {
    let at = index as usize * 2;
    values.get(at..at + 2).map(Vec2::from_slice)
}
