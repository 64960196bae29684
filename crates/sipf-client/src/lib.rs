//! SIPF messaging and file-transfer client.
//!
//! The client composes requests and interprets responses; the HTTP exchange
//! itself goes through the [`HttpTransport`] trait so it can be swapped for
//! a scripted transport in tests. [`ReqwestTransport`] is the production
//! implementation.
//!
//! - [`SipfClient`] uploads and downloads objects ([`ObjectClient`])
//! - [`HttpFileTransfer`] streams files through pre-signed URLs ([`FileTransfer`])
//! - [`Credentials`] carries the Basic-Auth identity for both

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod http;

#[cfg(test)]
mod testing;

pub use auth::Credentials;
pub use client::{ObjectClient, SipfClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use file::{
    validate_file_id, ChunkSink, ChunkSource, FileTransfer, HttpFileTransfer, DOWNLOAD_CHUNK_LEN,
    MAX_FILE_ID_LEN,
};
pub use http::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, RequestBody,
    StreamResponse,
};
