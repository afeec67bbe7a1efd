pub mod evolution;

pub use evolution::{decode_messages, EvolutionClient};
