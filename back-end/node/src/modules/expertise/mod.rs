//! Expertise data model and the process-wide store holding it.

mod model;
mod store;

pub use model::{DimensionError, Embedding, Expertise, VECTOR_DIMENSION, Vector};
pub use store::ExpertiseStore;
