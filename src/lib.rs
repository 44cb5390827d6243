pub mod cli;
pub mod config;
pub mod logging;
pub mod sphinx;
pub mod storage;

pub use sphinx::{
    create_forward_message, BuiltMessage, CodecError, HopMaterial, InMemoryReplayCache, Node, NodeKeys, NymServer,
    PacketFormatError, ReplayCache, RoutingCommand, SharedReplayCache, SphinxPacket, SphinxParams, Surb, SurbHeader,
    UnwrapOutcome,
};
