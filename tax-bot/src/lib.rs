pub mod commands;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod logging;
pub mod report;
pub mod transport;

pub use dispatcher::{Dispatched, Dispatcher};
pub use transport::{ChatTransport, ConsoleTransport, Inbound, TransportError};
