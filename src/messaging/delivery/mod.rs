//! Delivery acknowledgements: the transport interface and its implementations.

pub mod manual;
pub mod simulated;
pub mod transport;

pub use manual::ManualTransport;
pub use simulated::SimulatedTransport;
pub use transport::{DeliverySink, DeliveryTransport};
