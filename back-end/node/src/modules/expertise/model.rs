use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Number of slots every embedding vector carries.
pub const VECTOR_DIMENSION: usize = 768;

/// Rejection raised when a vector does not have exactly [`VECTOR_DIMENSION`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("vector must have exactly {expected} values, got {actual}")]
pub struct DimensionError {
    pub expected: usize,
    pub actual: usize,
}

/// A fixed-dimension embedding vector.
///
/// The length is checked once, when the value is built or deserialized.
/// Everything downstream can rely on `len() == VECTOR_DIMENSION`.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Vector(Vec<f64>);

impl Vector {
    /// The all-zero vector.
    pub fn zeros() -> Self {
        Self(vec![0.0; VECTOR_DIMENSION])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<f64>> for Vector {
    type Error = DimensionError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        if values.len() != VECTOR_DIMENSION {
            return Err(DimensionError {
                expected: VECTOR_DIMENSION,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }
}

impl Serialize for Vector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// 768 floats drown every log line; show the shape instead.
impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector(len={})", self.0.len())
    }
}

/// One named vector contributed by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Identifier of the thing being embedded.
    pub key: String,

    /// Domain/topic tag.
    #[serde(rename = "expertise")]
    pub expertise_label: String,

    /// Embedding model the vector was produced with.
    pub model: String,

    pub vector: Vector,
}

impl Embedding {
    pub fn new(
        key: impl Into<String>,
        expertise_label: impl Into<String>,
        model: impl Into<String>,
        vector: Vector,
    ) -> Self {
        Self {
            key: key.into(),
            expertise_label: expertise_label.into(),
            model: model.into(),
            vector,
        }
    }
}

/// A batch of embeddings advertised to the swarm as one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expertise {
    pub embeddings: Vec<Embedding>,
}

impl Expertise {
    pub fn new(embeddings: Vec<Embedding>) -> Self {
        Self { embeddings }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Keys of the contained embeddings, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.embeddings.iter().map(|e| e.key.as_str())
    }
}
