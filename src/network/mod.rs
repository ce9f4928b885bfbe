pub mod channel;
pub mod fib;
pub mod link_arch;
pub mod node;
pub mod topology;

pub use channel::{CChannel, QChannel};
pub use fib::{FibEntry, ForwardingInformationBase};
pub use link_arch::LinkArchitecture;
pub use node::{Node, NodeApps, NodeId, PathId, RequestId};
pub use topology::{distance_distribution, CChannelSpec, DistanceProportion, NetworkTopology, QChannelSpec};
