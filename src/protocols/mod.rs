pub mod controller;
pub mod forwarder;
pub mod link_layer;
pub mod messages;
pub mod timing;

pub use controller::install_path;
pub use forwarder::{ForwarderState, ParallelSwapRecord};
pub use link_layer::LinkLayerState;
pub use messages::{ClassicMessage, MuxScheme, PathInstructions};
pub use timing::{SyncDriver, TimingMode};
