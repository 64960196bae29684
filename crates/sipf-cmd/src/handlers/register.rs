use sipf_transport::ByteChannel;
use tracing::debug;

use crate::args;
use crate::error::{CmdError, Result};
use crate::response::{self, OK};
use crate::session::CommandSession;

impl<C: ByteChannel> CommandSession<C> {
    /// `W <addr> <value>`
    pub(crate) fn cmd_write_register(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        self.unlocked = false;
        let params = args::params(rest)?;
        let fields = args::fields(params);
        let [addr, value] = fields[..] else {
            return Err(CmdError::IllegalParameter("expected <addr> <value>"));
        };
        let addr = args::hex_u8(addr)?;
        let value = args::hex_u8(value)?;

        self.registers.write(addr, value)?;
        debug!(addr, value, "register written");
        Ok(OK.to_vec())
    }

    /// `R <addr>`
    pub(crate) fn cmd_read_register(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        self.unlocked = false;
        let addr = args::hex_u8(args::params(rest)?)?;
        let value = self
            .registers
            .read(addr)
            .map_err(|_| CmdError::IllegalParameter("unreadable register"))?;
        Ok(response::register_value(value))
    }
}
