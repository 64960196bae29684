use sipf_frame::{CommandFramer, START_MARKER};
use sipf_transport::{ByteChannel, MemoryChannel};

use crate::cmd::ExecArgs;
use crate::exit::{CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_exec, OutputFormat};

/// Feed one command line through the framer as if it arrived on the UART.
pub fn run(args: ExecArgs, format: OutputFormat) -> CliResult<i32> {
    let line = args.line.trim();
    let line = line.strip_prefix(START_MARKER as char).unwrap_or(line);
    if line.is_empty() || line.contains(['\r', '\n']) {
        return Err(CliError::new(USAGE, "expected a single non-empty command line"));
    }

    let mut session = args.backend.session(MemoryChannel::new())?;
    session.channel_mut().set_echo(false);

    let mut input = Vec::with_capacity(line.len() + 2);
    input.push(START_MARKER);
    input.extend_from_slice(line.as_bytes());
    input.push(b'\r');

    let mut framer = CommandFramer::new();
    let mut response = Vec::new();
    for chunk in framer.feed(&input, &mut session) {
        response.extend_from_slice(&chunk);
    }
    response.extend_from_slice(&session.channel_mut().take_output());

    print_exec(line, &response, format);
    if response.ends_with(b"OK\r\n") {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
