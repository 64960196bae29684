//! XMODEM block transfer over a [`ByteChannel`](sipf_transport::ByteChannel).
//!
//! Classic 128-byte XMODEM with an 8-bit additive checksum:
//!
//! ```text
//! ┌─────┬─────┬──────┬───────────────┬─────┐
//! │ SOH │ BN  │ !BN  │ payload (128) │ SUM │
//! └─────┴─────┴──────┴───────────────┴─────┘
//! ```
//!
//! [`XmodemReceiver`] and [`XmodemSender`] are independent state machines.
//! Both expect to run inside a [`TransferGuard`], which keeps relay echo off
//! for the duration of the transfer.

pub mod block;
pub mod config;
pub mod error;
pub mod guard;
pub mod receiver;
pub mod sender;

pub use block::{checksum, BLOCK_LEN, PAYLOAD_LEN};
pub use config::XmodemConfig;
pub use error::{Result, XmodemError};
pub use guard::TransferGuard;
pub use receiver::{RecvStatus, XmodemReceiver};
pub use sender::{SendStatus, XmodemSender};
