use sipf_transport::ByteChannel;
use tracing::{info, warn};

use crate::args;
use crate::error::{CmdError, Result};
use crate::fota::DEFAULT_IMAGE;
use crate::response::OK;
use crate::session::CommandSession;

const UNLOCK_PARAM: &[u8] = b" UNLOCK";
const UPDATE_PARAM: &[u8] = b" UPDATE";
const VERSION_PREFIX: &[u8] = b" VERSION ";

impl<C: ByteChannel> CommandSession<C> {
    /// `UNLOCK UNLOCK`
    pub(crate) fn cmd_unlock(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        if rest == UNLOCK_PARAM {
            self.unlocked = true;
            info!("session unlocked");
            Ok(OK.to_vec())
        } else {
            self.unlocked = false;
            Err(CmdError::IllegalParameter("expected UNLOCK"))
        }
    }

    /// `UPDATE UPDATE` or `UPDATE VERSION <suffix>`
    pub(crate) fn cmd_update(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        if !self.unlocked {
            return Err(CmdError::Locked);
        }

        let image = if rest == UPDATE_PARAM {
            DEFAULT_IMAGE
        } else if let Some(suffix) = rest.strip_prefix(VERSION_PREFIX) {
            if suffix.is_empty() {
                return Err(CmdError::IllegalParameter("missing version suffix"));
            }
            args::text(suffix)?
        } else {
            return Err(CmdError::IllegalParameter("expected UPDATE or VERSION <suffix>"));
        };

        info!(image, "firmware update requested");
        match self.firmware.update(image) {
            Ok(never) => match never {},
            Err(err) => {
                warn!(image, error = %err, "firmware update failed");
                Err(CmdError::Failed(err.to_string()))
            }
        }
    }
}
