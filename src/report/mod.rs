//! Optional debug artifacts: the GraphViz hierarchy dump and the geometry
//! usage statistics table.

pub mod dot;
pub mod stats;
