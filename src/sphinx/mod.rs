pub mod builder;
pub mod codec;
pub mod error;
pub mod group;
pub mod lioness;
pub mod node;
pub mod nymserver;
pub mod packet;
pub mod params;
pub mod primitives;
pub mod replay;
pub mod surb;

pub use builder::{create_forward_message, BuiltMessage, HopMaterial};
pub use codec::{CodecError, RoutingCommand};
pub use node::{Node, NodeKeys, UnwrapOutcome};
pub use nymserver::{Dispatch, NymServer};
pub use packet::{PacketFormatError, SphinxPacket};
pub use params::SphinxParams;
pub use replay::{InMemoryReplayCache, ReplayCache, SharedReplayCache};
pub use surb::{Surb, SurbHeader};
