//! Deterministic test harness for the Mingle chat core.
//!
//! A virtual clock, a transport that records every call instead of touching
//! the network, and a reference model of the connection lifecycle for
//! model-based testing.

pub mod model;
pub mod probe;
pub mod sim_env;
pub mod sim_transport;
pub mod world;

pub use model::{ModelConnection, Operation};
pub use probe::CallbackProbe;
pub use sim_env::SimEnv;
pub use sim_transport::{RecordingConnector, RecordingTransport, TransportCall, TransportLog};
pub use world::World;
