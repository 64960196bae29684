use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Crates that make up the gateway; `--log-level` applies to these.
const GATEWAY_TARGETS: &[&str] = &[
    "sipf",
    "sipf_cmd",
    "sipf_client",
    "sipf_frame",
    "sipf_object",
    "sipf_transport",
    "sipf_xmodem",
];

/// HTTP stack crates, held at `warn` unless `RUST_LOG` says otherwise.
const HTTP_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// HTTP stack level: `error` when only errors are wanted, `warn` otherwise.
    fn http_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            _ => "warn",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Filter directives used when `RUST_LOG` is unset: gateway crates at
/// `level`, the HTTP stack at `warn`, everything else at `warn`.
pub fn default_directives(level: LogLevel) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        GATEWAY_TARGETS
            .iter()
            .map(|target| format!("{target}={}", level.directive())),
    );
    directives.extend(
        HTTP_TARGETS
            .iter()
            .map(|target| format!("{target}={}", level.http_directive())),
    );
    directives.join(",")
}

fn build_filter(level: LogLevel) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from(level).into())),
    }
}

/// `RUST_LOG` wins over `--log-level` when it is set.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level))
        .with_ansi(false)
        .with_target(level == LogLevel::Trace || level == LogLevel::Debug);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
