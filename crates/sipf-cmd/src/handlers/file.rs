use std::thread;

use sipf_client::{validate_file_id, ChunkSink, ChunkSource, ClientError, FileTransfer};
use sipf_transport::ByteChannel;
use sipf_xmodem::{
    RecvStatus, SendStatus, TransferGuard, XmodemError, XmodemReceiver, XmodemSender, PAYLOAD_LEN,
};
use tracing::{debug, info, warn};

use crate::args;
use crate::error::{CmdError, Result};
use crate::response;
use crate::session::CommandSession;

impl<C: ByteChannel> CommandSession<C> {
    /// `FPUT <file_id> <size:8hex>`: receive blocks from the host and stream
    /// them into an upload.
    pub(crate) fn cmd_file_put(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        let params = args::params(rest)?;
        let Some(split) = params.iter().rposition(|&b| b == b' ') else {
            return Err(CmdError::IllegalParameter("expected <file_id> <size>"));
        };
        let file_id = args::text(&params[..split])?;
        let size = args::hex_u32(&params[split + 1..])?;
        validate_file_id(file_id).map_err(|_| CmdError::IllegalParameter("invalid file id"))?;

        self.refresh_credentials();
        thread::sleep(self.config.transfer_settle);
        let result = self.receive_upload(file_id, size);
        thread::sleep(self.config.transfer_settle);

        match result {
            Ok(()) => {
                info!(file_id, size, "FPUT complete");
                Ok(response::file_size(size, false))
            }
            Err(err) => {
                if let CmdError::Client(client_err) = &err {
                    self.note_client_error(client_err);
                }
                Err(CmdError::Failed(err.to_string()))
            }
        }
    }

    fn receive_upload(&mut self, file_id: &str, size: u32) -> Result<()> {
        let files = &mut *self.files;
        let mut guard = TransferGuard::begin(&mut self.channel);
        let mut receiver = XmodemReceiver::new(&mut *guard, self.config.xmodem.clone());

        let result = stream_upload(&mut receiver, files, file_id, size);
        if let Err(err) = &result {
            warn!(file_id, error = %err, "block receive aborted");
            if let Err(cancel_err) = receiver.cancel() {
                warn!(error = %cancel_err, "cancel not sent");
            }
        }
        result
    }

    /// `FGET <file_id>`: stream a download to the host as blocks.
    pub(crate) fn cmd_file_get(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        let file_id = args::text(args::params(rest)?)?;
        validate_file_id(file_id).map_err(|_| CmdError::IllegalParameter("invalid file id"))?;

        self.refresh_credentials();
        thread::sleep(self.config.transfer_settle);
        let result = self.send_download(file_id);
        thread::sleep(self.config.transfer_settle);

        match result {
            Ok(size) => {
                info!(file_id, size, "FGET complete");
                Ok(response::file_size(size, true))
            }
            Err(err) => {
                if let CmdError::Client(client_err) = &err {
                    self.note_client_error(client_err);
                }
                Err(CmdError::TransferFailed(err.to_string()))
            }
        }
    }

    fn send_download(&mut self, file_id: &str) -> Result<u32> {
        let files = &mut *self.files;
        let mut guard = TransferGuard::begin(&mut self.channel);
        let mut sender = XmodemSender::new(&mut *guard, self.config.xmodem.clone());

        let result = stream_download(&mut sender, files, file_id);
        if let Err(err) = &result {
            warn!(file_id, error = %err, "block send aborted");
            if let Err(cancel_err) = sender.cancel() {
                warn!(error = %cancel_err, "cancel not sent");
            }
        }
        result
    }
}

/// Start request, blocks into the upload, then drain to EOT. Every error
/// leaves the cancel to the caller.
fn stream_upload<C: ByteChannel>(
    receiver: &mut XmodemReceiver<C>,
    files: &mut dyn FileTransfer,
    file_id: &str,
    size: u32,
) -> Result<()> {
    receiver.start()?;
    let first = receive_first(receiver)?;

    let mut source = BlockSource::new(receiver, first, size);
    let sent = files.upload(file_id, size, &mut source)?;
    source.drain()?;
    debug!(file_id, sent, "upload body complete");
    Ok(())
}

fn stream_download<C: ByteChannel>(
    sender: &mut XmodemSender<C>,
    files: &mut dyn FileTransfer,
    file_id: &str,
) -> Result<u32> {
    match sender.wait_request()? {
        SendStatus::Ok => {}
        SendStatus::Canceled => return Err(XmodemError::Canceled.into()),
        SendStatus::Failed => {
            return Err(CmdError::Failed("no start request from receiver".into()))
        }
    }

    let mut sink = BlockSink::new(sender);
    let size = files.download(file_id, &mut sink)?;
    sink.flush()?;

    match sender.finish()? {
        SendStatus::Ok => Ok(size),
        status => {
            warn!(?status, "end of transfer not acknowledged");
            Err(CmdError::Failed("end of transfer not acknowledged".into()))
        }
    }
}

/// Where the upload stream stands between chunk requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    /// A block is in the receiver and has not been handed out yet.
    Pending,
    /// The last handed-out block still needs its ACK.
    Streaming,
    /// The last handed-out block was ACKed when it was handed out.
    Acknowledged,
    /// EOT seen.
    Finished,
}

/// Wait for the first block, NAKing up to the retry limit.
fn receive_first<C: ByteChannel>(receiver: &mut XmodemReceiver<C>) -> Result<SourceState> {
    let timeout = receiver.config().first_block_timeout;
    let max = receiver.config().max_receive_retries;
    let mut retries = 0;
    loop {
        match receiver.receive_block(timeout)? {
            RecvStatus::Ok => return Ok(SourceState::Pending),
            RecvStatus::Finished => return Ok(SourceState::Finished),
            RecvStatus::Canceled => return Err(XmodemError::Canceled.into()),
            RecvStatus::Retry | RecvStatus::Duplicate => {
                retries += 1;
                if retries > max {
                    return Err(XmodemError::RetryExceeded { retries: max }.into());
                }
                debug!(retries, "waiting for first block");
                receiver.nak()?;
            }
        }
    }
}

fn aborted(err: XmodemError) -> ClientError {
    ClientError::Aborted(err.to_string())
}

/// [`ChunkSource`] that pulls XMODEM blocks on demand. Each block is
/// acknowledged only when the next one is requested, so the host is held
/// off while the upload consumes the current block. The block that completes
/// the declared size is acknowledged as soon as it is handed out.
struct BlockSource<'r, C: ByteChannel> {
    receiver: &'r mut XmodemReceiver<C>,
    state: SourceState,
    remaining: usize,
}

impl<'r, C: ByteChannel> BlockSource<'r, C> {
    fn new(receiver: &'r mut XmodemReceiver<C>, state: SourceState, size: u32) -> Self {
        Self {
            receiver,
            state,
            remaining: size as usize,
        }
    }

    /// Acknowledge and discard blocks until EOT.
    fn drain(&mut self) -> sipf_client::Result<()> {
        while self.next_chunk()?.is_some() {}
        Ok(())
    }

    fn hand_out(&mut self) -> sipf_client::Result<Option<&[u8]>> {
        self.remaining = self.remaining.saturating_sub(self.receiver.payload().len());
        if self.remaining == 0 {
            self.receiver.ack().map_err(aborted)?;
            self.state = SourceState::Acknowledged;
        } else {
            self.state = SourceState::Streaming;
        }
        Ok(Some(self.receiver.payload()))
    }
}

impl<C: ByteChannel> ChunkSource for BlockSource<'_, C> {
    fn next_chunk(&mut self) -> sipf_client::Result<Option<&[u8]>> {
        match self.state {
            SourceState::Finished => return Ok(None),
            SourceState::Pending => return self.hand_out(),
            SourceState::Streaming => self.receiver.ack().map_err(aborted)?,
            SourceState::Acknowledged => {}
        }

        let timeout = self.receiver.config().block_timeout;
        let max = self.receiver.config().max_receive_retries;
        // Bad blocks and resent duplicates share one budget.
        let mut retries = 0;
        loop {
            let status = self.receiver.receive_block(timeout).map_err(aborted)?;
            match status {
                RecvStatus::Ok => return self.hand_out(),
                RecvStatus::Finished => {
                    self.state = SourceState::Finished;
                    return Ok(None);
                }
                RecvStatus::Canceled => return Err(aborted(XmodemError::Canceled)),
                RecvStatus::Duplicate | RecvStatus::Retry => {
                    retries += 1;
                    if retries > max {
                        return Err(aborted(XmodemError::RetryExceeded { retries: max }));
                    }
                    if status == RecvStatus::Duplicate {
                        self.receiver.ack().map_err(aborted)?;
                    } else {
                        self.receiver.nak().map_err(aborted)?;
                    }
                }
            }
        }
    }
}

/// [`ChunkSink`] that regroups download data into full blocks; the last
/// partial block goes out on [`flush`](BlockSink::flush).
struct BlockSink<'s, C: ByteChannel> {
    sender: &'s mut XmodemSender<C>,
    buf: Vec<u8>,
}

impl<'s, C: ByteChannel> BlockSink<'s, C> {
    fn new(sender: &'s mut XmodemSender<C>) -> Self {
        Self {
            sender,
            buf: Vec::with_capacity(PAYLOAD_LEN),
        }
    }

    fn send(&mut self, len: usize) -> sipf_client::Result<()> {
        let status = self.sender.send_block(&self.buf[..len]).map_err(aborted)?;
        self.buf.drain(..len);
        match status {
            SendStatus::Ok => Ok(()),
            SendStatus::Canceled => Err(aborted(XmodemError::Canceled)),
            SendStatus::Failed => Err(ClientError::Aborted("block not acknowledged".into())),
        }
    }

    fn flush(&mut self) -> sipf_client::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.send(self.buf.len())
    }
}

impl<C: ByteChannel> ChunkSink for BlockSink<'_, C> {
    fn write_chunk(&mut self, chunk: &[u8]) -> sipf_client::Result<()> {
        self.buf.extend_from_slice(chunk);
        while self.buf.len() >= PAYLOAD_LEN {
            self.send(PAYLOAD_LEN)?;
        }
        Ok(())
    }
}
