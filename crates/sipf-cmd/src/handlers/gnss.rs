use sipf_transport::ByteChannel;

use crate::args;
use crate::error::{CmdError, Result};
use crate::response::OK;
use crate::session::CommandSession;

impl<C: ByteChannel> CommandSession<C> {
    /// `GNSSEN 0|1`
    pub(crate) fn cmd_gnss_enable(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        let result = match args::params(rest)? {
            b"0" => self.gnss.stop(),
            b"1" => self.gnss.start(),
            _ => return Err(CmdError::IllegalParameter("expected 0 or 1")),
        };
        result.map_err(|err| CmdError::Failed(err.to_string()))?;
        Ok(OK.to_vec())
    }

    /// `GNSSSTAT`
    pub(crate) fn cmd_gnss_status(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        args::none(rest)?;
        let mut out = self.gnss.status().render().into_bytes();
        out.extend_from_slice(OK);
        Ok(out)
    }

    /// `GNSSLOC`
    pub(crate) fn cmd_gnss_location(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        args::none(rest)?;
        Ok(format!("{}\r\nOK\r\n", self.gnss.location().render()).into_bytes())
    }

    /// `GNSSNMEA`
    pub(crate) fn cmd_gnss_nmea(&mut self, rest: &[u8]) -> Result<Vec<u8>> {
        args::none(rest)?;
        Ok(format!("{}\r\nOK\r\n", self.gnss.nmea()).into_bytes())
    }
}
