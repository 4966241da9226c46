//! Geometry module for tympanic membrane mesh generation.
//!
//! The membrane is approximated as a shallow cone. The umbo sits at its apex.

mod mesh;

pub use mesh::MembraneMesh;
