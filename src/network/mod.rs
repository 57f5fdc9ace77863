//! Network Layer: lookup entry points
//!
//! Transport sendiri (socket, framing, reconnect) berada di luar crate ini;
//! modul ini hanya mendefinisikan batasnya dan memetakan hasil decode ke
//! status NSS.

mod client;
mod transport;

pub use client::{LookupOutcome, NssStatus, ServiceClient};
pub use transport::{Transport, TransportError};
