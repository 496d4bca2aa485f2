//! Flattens a hierarchical, multi-attribute 3D scene description into
//! render-engine-ready data: single-index vertex/index buffers grouped by
//! material slot, resolved materials, and either an instantiated scene graph
//! (scene mode) or one combined mesh with world transforms baked in
//! (mesh mode).
//!
//! The scene-description parser is an external collaborator: it feeds
//! entities into a [`document::Document`] through the
//! [`document::sink::DocumentSink`] trait, in any order. Once ingestion is
//! complete, [`convert::convert_scene`] or [`convert::convert_mesh`] runs the
//! in-memory pipeline over the read-only document.

pub mod convert;
pub mod diag;
pub mod document;
pub mod output;
pub mod report;

pub use convert::{ConvertOptions, MeshOutput, SceneOutput, convert_mesh, convert_scene};
pub use diag::Outcome;
pub use document::Document;
pub use document::sink::DocumentSink;
