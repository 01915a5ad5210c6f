//! Wire shape of a gossiped expertise record: `{"data": <Expertise>}`.

use crate::modules::expertise::Expertise;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Wrap and encode one record for the broadcast channel.
pub fn encode(expertise: &Expertise) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&Envelope { data: expertise })
}

/// Decode a broadcast payload back into the record it carries.
///
/// Unknown sibling fields are ignored. Vectors of the wrong dimension are rejected.
pub fn decode(bytes: &[u8]) -> Result<Expertise, serde_json::Error> {
    serde_json::from_slice::<Envelope<Expertise>>(bytes).map(|envelope| envelope.data)
}
