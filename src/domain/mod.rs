//! Domain types shared by every installation stage.

pub mod model;

pub use model::*;
