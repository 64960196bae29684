//! Serial byte relay and channel abstraction.
//!
//! This is the lowest layer of the SIPF gateway. The host MCU talks to the
//! gateway over a UART; everything above this crate sees that link through
//! the [`ByteChannel`] trait:
//! - [`UartBroker`] relays a real stream through bounded queues on two threads
//! - [`MemoryChannel`] is a scripted in-memory channel for tests and one-shot use
//!
//! The only state shared between the relay threads and the control loop is
//! the [`EchoFlag`].

pub mod broker;
pub mod channel;
pub mod error;
pub mod memory;
pub mod stream;

#[cfg(unix)]
pub mod uds;

pub use broker::{BrokerConfig, UartBroker, DEFAULT_QUEUE_CAPACITY};
pub use channel::{ByteChannel, EchoFlag};
pub use error::{Result, TransportError};
pub use memory::MemoryChannel;
pub use stream::SerialStream;

#[cfg(unix)]
pub use uds::SerialListener;
