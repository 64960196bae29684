use std::io::{self, Read};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::{HttpRequest, HttpTransport, Method};

/// Longest accepted file id.
pub const MAX_FILE_ID_LEN: usize = 64;

/// Read size used when streaming a download.
pub const DOWNLOAD_CHUNK_LEN: usize = 1024;

/// Upload chunks buffered between the source and the HTTP body.
const UPLOAD_QUEUE_DEPTH: usize = 8;

/// Check that a file id is non-empty, at most [`MAX_FILE_ID_LEN`] long and
/// made of `[A-Za-z0-9._-]` only.
pub fn validate_file_id(file_id: &str) -> Result<()> {
    let valid = !file_id.is_empty()
        && file_id.len() <= MAX_FILE_ID_LEN
        && file_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(ClientError::InvalidFileId(file_id.to_string()))
    }
}

/// Supplies upload data one chunk at a time.
pub trait ChunkSource {
    /// The next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> Result<Option<&[u8]>>;
}

/// Consumes download data one chunk at a time.
pub trait ChunkSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;
}

/// File upload/download through the file service.
pub trait FileTransfer {
    fn set_credentials(&mut self, credentials: Option<Credentials>);

    /// Upload `size` bytes pulled from `source`. Data past `size` is
    /// discarded. Returns the number of bytes sent.
    fn upload(&mut self, file_id: &str, size: u32, source: &mut dyn ChunkSource) -> Result<u32>;

    /// Download a file into `sink`. Returns the number of bytes written.
    fn download(&mut self, file_id: &str, sink: &mut dyn ChunkSink) -> Result<u32>;
}

/// [`FileTransfer`] that requests a transfer URL and then streams the body.
pub struct HttpFileTransfer<T> {
    transport: Arc<T>,
    config: ClientConfig,
    credentials: Option<Credentials>,
}

impl<T: HttpTransport + 'static> HttpFileTransfer<T> {
    pub fn new(transport: Arc<T>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            credentials: None,
        }
    }

    /// Ask the file service for a transfer URL. GET yields a download URL,
    /// PUT an upload URL.
    fn request_url(&self, method: Method, file_id: &str) -> Result<String> {
        let request = HttpRequest::new(method, self.config.file_url_for(file_id), self.config.timeout)
            .header("Content-Type", "text/plain")
            .auth(self.credentials.as_ref());
        let response = self.transport.send(request)?;
        if let Err(err) = response.check_status() {
            warn!(file_id, status = response.status_code, "file URL request rejected");
            return Err(err);
        }

        let url = std::str::from_utf8(&response.body)
            .map_err(|_| ClientError::InvalidResponse("file URL is not UTF-8".into()))?
            .trim();
        if url.is_empty() {
            return Err(ClientError::InvalidResponse("empty file URL".into()));
        }
        debug!(file_id, method = method.as_str(), "file URL acquired");
        Ok(url.to_string())
    }
}

impl<T: HttpTransport + 'static> FileTransfer for HttpFileTransfer<T> {
    fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    fn upload(&mut self, file_id: &str, size: u32, source: &mut dyn ChunkSource) -> Result<u32> {
        validate_file_id(file_id)?;
        let url = self.request_url(Method::Put, file_id)?;

        let (tx, rx) = bounded(UPLOAD_QUEUE_DEPTH);
        let request = HttpRequest::new(Method::Put, url, self.config.transfer_timeout)
            .header("Content-Type", "application/octet-stream")
            .stream(ChunkReader::new(rx, u64::from(size)), u64::from(size));
        let transport = Arc::clone(&self.transport);
        let handle = thread::Builder::new()
            .name("file-upload".into())
            .spawn(move || transport.send(request))?;

        let pumped = pump(source, &tx, size);
        drop(tx);
        let response = handle
            .join()
            .map_err(|_| ClientError::Aborted("upload thread panicked".into()))?;

        let sent = pumped?;
        response?.check_status()?;
        if sent < size {
            return Err(ClientError::Incomplete {
                sent: u64::from(sent),
                expected: u64::from(size),
            });
        }
        info!(file_id, size = sent, "file uploaded");
        Ok(sent)
    }

    fn download(&mut self, file_id: &str, sink: &mut dyn ChunkSink) -> Result<u32> {
        validate_file_id(file_id)?;
        let url = self.request_url(Method::Get, file_id)?;

        let request = HttpRequest::new(Method::Get, url, self.config.transfer_timeout);
        let mut response = self.transport.open(request)?;
        response.check_status()?;

        let mut buf = [0u8; DOWNLOAD_CHUNK_LEN];
        let mut total: u32 = 0;
        loop {
            let n = match response.body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            sink.write_chunk(&buf[..n])?;
            total = total.saturating_add(n as u32);
        }
        info!(file_id, size = total, "file downloaded");
        Ok(total)
    }
}

/// Move chunks from `source` into the body queue until `size` bytes are sent.
fn pump(source: &mut dyn ChunkSource, tx: &Sender<Bytes>, size: u32) -> Result<u32> {
    let mut sent: u32 = 0;
    while sent < size {
        let Some(chunk) = source.next_chunk()? else {
            break;
        };
        let take = chunk.len().min((size - sent) as usize);
        if take == 0 {
            continue;
        }
        tx.send(Bytes::copy_from_slice(&chunk[..take]))
            .map_err(|_| ClientError::Aborted("upload connection closed".into()))?;
        sent += take as u32;
    }
    Ok(sent)
}

/// [`Read`] over a queue of chunks. Ending the queue before `expected`
/// bytes were read is an error so a short upload is never committed.
struct ChunkReader {
    rx: Receiver<Bytes>,
    current: Bytes,
    remaining: u64,
}

impl ChunkReader {
    fn new(rx: Receiver<Bytes>, expected: u64) -> Self {
        Self {
            rx,
            current: Bytes::new(),
            remaining: expected,
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.current.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.current = chunk,
                Err(_) if self.remaining == 0 => return Ok(0),
                Err(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("upload source ended with {} bytes missing", self.remaining),
                    ))
                }
            }
        }
        let n = buf.len().min(self.current.len());
        let chunk = self.current.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}
