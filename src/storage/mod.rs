// Persistence for node state: the replay store is the only storage this
// crate's ambient stack needs (5).
pub mod replay_store;

pub use replay_store::{FileReplayStore, ReplayStoreError};
