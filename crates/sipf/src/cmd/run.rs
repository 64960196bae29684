use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sipf_cmd::{Gateway, GatewayConfig};
use sipf_transport::{BrokerConfig, SerialStream, UartBroker};
use tracing::{info, warn};

use crate::cmd::{parse_duration, BackendArgs, RunArgs};
use crate::exit::{transport_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn run(args: RunArgs) -> CliResult<i32> {
    let config = GatewayConfig {
        heartbeat_interval: parse_duration(&args.heartbeat)?,
        ..GatewayConfig::default()
    };
    // Validate endpoints before touching the link.
    args.backend.client_config()?;

    let reset = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(reset.clone())?;

    if let Some(device) = &args.device {
        let stream =
            SerialStream::open(device).map_err(|err| transport_error("open failed", err))?;
        serve(stream, &args.backend, &config, &reset)?;
        return Ok(SUCCESS);
    }

    if let Some(path) = &args.listen {
        listen(path, &args.backend, &config, &reset)?;
        return Ok(SUCCESS);
    }

    Err(CliError::new(USAGE, "no serial link: pass --device or --listen"))
}

#[cfg(unix)]
fn listen(
    path: &Path,
    backend: &BackendArgs,
    config: &GatewayConfig,
    reset: &AtomicBool,
) -> CliResult<()> {
    let listener = sipf_transport::SerialListener::bind(path)
        .map_err(|err| transport_error("bind failed", err))?;
    while !reset.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        serve(stream, backend, config, reset)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn listen(_: &Path, _: &BackendArgs, _: &GatewayConfig, _: &AtomicBool) -> CliResult<()> {
    Err(CliError::new(USAGE, "--listen needs unix domain sockets"))
}

fn serve(
    stream: SerialStream,
    backend: &BackendArgs,
    config: &GatewayConfig,
    reset: &AtomicBool,
) -> CliResult<()> {
    let kind = stream.kind();
    let writer = stream
        .try_clone()
        .map_err(|err| transport_error("stream clone failed", err))?;
    let broker = UartBroker::spawn(stream, writer, BrokerConfig::default())
        .map_err(|err| transport_error("relay start failed", err))?;
    info!(link = kind, "serial link up");

    let mut gateway = Gateway::new(backend.session(broker)?, config.clone());
    gateway
        .run(reset)
        .map_err(|err| transport_error("gateway stopped", err))?;

    let broker = gateway.into_session().into_channel();
    if let Err(err) = broker.flush(DRAIN_TIMEOUT) {
        warn!(error = %err, "outbound bytes left unsent");
    }
    Ok(())
}

/// First Ctrl-C requests a reset; a second one exits at once.
fn install_ctrlc_handler(reset: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if reset.swap(true, Ordering::SeqCst) {
            std::process::exit(FAILURE);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
