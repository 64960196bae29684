#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sipf_client::{
    ChunkSink, ChunkSource, ClientError, Credentials, FileTransfer, ObjectClient,
};
use sipf_cmd::{
    BankedRegisters, CommandSession, FirmwareUpdater, FotaError, SessionConfig,
};
use sipf_object::{DownloadResult, Otid};
use sipf_transport::MemoryChannel;
use sipf_xmodem::{checksum, XmodemConfig, BLOCK_LEN, PAYLOAD_LEN};

pub const OTID: [u8; 16] = [
    0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF,
];
pub const OTID_HEX: &str = "0123456789ABCDEF0123456789ABCDEF";

/// Everything the stub collaborators saw.
#[derive(Default)]
pub struct Backend {
    pub uploads: Vec<Vec<u8>>,
    pub upload_failure: Option<fn() -> ClientError>,
    pub downloads: Vec<DownloadResult>,
    pub session_key: Option<Credentials>,
    pub session_key_requests: usize,
    pub object_credentials: Option<Credentials>,
    pub file_credentials: Option<Credentials>,
    pub files: HashMap<String, Vec<u8>>,
    pub updates: Vec<String>,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct StubObjects(pub Shared);

impl ObjectClient for StubObjects {
    fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.0.lock().unwrap().object_credentials = credentials;
    }

    fn request_session_key(&mut self) -> sipf_client::Result<Credentials> {
        let mut backend = self.0.lock().unwrap();
        backend.session_key_requests += 1;
        backend.session_key.clone().ok_or(ClientError::Status {
            code: 403,
            text: "Forbidden".into(),
        })
    }

    fn upload_raw(&mut self, payload: &[u8]) -> sipf_client::Result<Otid> {
        let mut backend = self.0.lock().unwrap();
        if let Some(failure) = backend.upload_failure {
            return Err(failure());
        }
        backend.uploads.push(payload.to_vec());
        Ok(Otid::new(OTID))
    }

    fn download(&mut self) -> sipf_client::Result<DownloadResult> {
        let mut backend = self.0.lock().unwrap();
        if backend.downloads.is_empty() {
            return Ok(DownloadResult {
                otid: Otid::new([0; 16]),
                user_send_datetime: [0; 8],
                received_datetime: [0; 8],
                remains: 0,
                objects: Vec::new(),
            });
        }
        Ok(backend.downloads.remove(0))
    }
}

/// In-memory file service with the same truncation rule as the HTTP one.
pub struct StubFiles(pub Shared);

impl FileTransfer for StubFiles {
    fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.0.lock().unwrap().file_credentials = credentials;
    }

    fn upload(
        &mut self,
        file_id: &str,
        size: u32,
        source: &mut dyn ChunkSource,
    ) -> sipf_client::Result<u32> {
        let mut data = Vec::new();
        while data.len() < size as usize {
            let Some(chunk) = source.next_chunk()? else {
                break;
            };
            let take = chunk.len().min(size as usize - data.len());
            data.extend_from_slice(&chunk[..take]);
        }
        if data.len() < size as usize {
            return Err(ClientError::Incomplete {
                sent: data.len() as u64,
                expected: u64::from(size),
            });
        }
        self.0.lock().unwrap().files.insert(file_id.to_string(), data);
        Ok(size)
    }

    fn download(&mut self, file_id: &str, sink: &mut dyn ChunkSink) -> sipf_client::Result<u32> {
        let data = self
            .0
            .lock()
            .unwrap()
            .files
            .get(file_id)
            .cloned()
            .ok_or(ClientError::Status {
                code: 404,
                text: "Not Found".into(),
            })?;
        for chunk in data.chunks(100) {
            sink.write_chunk(chunk)?;
        }
        Ok(data.len() as u32)
    }
}

pub struct RecordingUpdater(pub Shared);

impl FirmwareUpdater for RecordingUpdater {
    fn update(&mut self, image: &str) -> Result<Infallible, FotaError> {
        self.0.lock().unwrap().updates.push(image.to_string());
        Err(FotaError::Rejected {
            image: image.to_string(),
            reason: "no image server".into(),
        })
    }
}

pub fn quick_config() -> SessionConfig {
    SessionConfig {
        xmodem: XmodemConfig {
            request_timeout: Duration::from_millis(50),
            request_poll: Duration::from_millis(5),
            ..XmodemConfig::default()
        },
        transfer_settle: Duration::ZERO,
    }
}

/// A session over a scripted channel, plus the shared backend state.
pub fn session(input: &[u8]) -> (CommandSession<MemoryChannel>, Shared) {
    let backend = Shared::default();
    let session = CommandSession::new(
        MemoryChannel::with_input(input),
        BankedRegisters::default(),
        StubObjects(Arc::clone(&backend)),
        StubFiles(Arc::clone(&backend)),
    )
    .with_firmware(RecordingUpdater(Arc::clone(&backend)))
    .with_config(quick_config());
    (session, backend)
}

/// One XMODEM block carrying `data`, padded with 0x1A.
pub fn block(bn: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = [0x1Au8; PAYLOAD_LEN];
    payload[..data.len()].copy_from_slice(data);
    let mut block = Vec::with_capacity(BLOCK_LEN);
    block.push(0x01);
    block.push(bn);
    block.push(!bn);
    block.extend_from_slice(&payload);
    block.push(checksum(&payload));
    block
}
