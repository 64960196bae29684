use std::fmt;

/// ASCII commands understood by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    WriteRegister,
    ReadRegister,
    TxRaw,
    Tx,
    Rx,
    FilePut,
    FileGet,
    Unlock,
    Update,
    GnssEnable,
    GnssLocation,
    GnssNmea,
    GnssStatus,
}

/// Lookup order. The first name that prefixes the line and is followed by
/// end-of-line or a space wins.
pub const COMMAND_TABLE: [CommandKind; 13] = [
    CommandKind::WriteRegister,
    CommandKind::ReadRegister,
    CommandKind::TxRaw,
    CommandKind::Tx,
    CommandKind::Rx,
    CommandKind::FilePut,
    CommandKind::FileGet,
    CommandKind::Unlock,
    CommandKind::Update,
    CommandKind::GnssEnable,
    CommandKind::GnssLocation,
    CommandKind::GnssNmea,
    CommandKind::GnssStatus,
];

impl CommandKind {
    /// Name as typed after `$`.
    pub const fn name(self) -> &'static str {
        match self {
            CommandKind::WriteRegister => "W",
            CommandKind::ReadRegister => "R",
            CommandKind::TxRaw => "TXRAW",
            CommandKind::Tx => "TX",
            CommandKind::Rx => "RX",
            CommandKind::FilePut => "FPUT",
            CommandKind::FileGet => "FGET",
            CommandKind::Unlock => "UNLOCK",
            CommandKind::Update => "UPDATE",
            CommandKind::GnssEnable => "GNSSEN",
            CommandKind::GnssLocation => "GNSSLOC",
            CommandKind::GnssNmea => "GNSSNMEA",
            CommandKind::GnssStatus => "GNSSSTAT",
        }
    }

    /// Match a command line. Returns the command and everything after its
    /// name, including the separating space.
    pub fn lookup(line: &[u8]) -> Option<(CommandKind, &[u8])> {
        COMMAND_TABLE.iter().find_map(|&kind| {
            let rest = line.strip_prefix(kind.name().as_bytes())?;
            match rest.first() {
                None | Some(b' ') => Some((kind, rest)),
                Some(_) => None,
            }
        })
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
