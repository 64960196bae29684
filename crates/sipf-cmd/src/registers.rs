use sipf_client::Credentials;
use tracing::debug;

use crate::error::RegisterError;

/// Authentication mode register (bank 0).
pub const REG_MODE: u8 = 0x00;
/// User-name length register (bank 0).
pub const REG_USER_LEN: u8 = 0x10;
/// First user-name byte (bank 0).
pub const REG_USER_NAME: u8 = 0x20;
/// Password length register (bank 0).
pub const REG_PASSWORD_LEN: u8 = 0x80;
/// First password byte (bank 0).
pub const REG_PASSWORD: u8 = 0x90;
/// Room for the user name or the password.
pub const CREDENTIAL_MAX_LEN: usize = 0x60;

/// First common register; everything below is banked.
pub const COMMON_BASE: u8 = 0xF0;
pub const REG_FW_TYPE: u8 = 0xF0;
pub const REG_VERSION_MAJOR: u8 = 0xF1;
pub const REG_VERSION_MINOR: u8 = 0xF2;
/// Release number, little-endian over 0xF3..=0xF4.
pub const REG_VERSION_RELEASE: u8 = 0xF3;
/// Bank select, the only writable common register.
pub const REG_BANK_SELECT: u8 = 0xFF;

/// Size of one register bank.
pub const BANK_LEN: usize = COMMON_BASE as usize;

/// How the gateway authenticates to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Credentials come from the user-name and password registers.
    Password,
    /// Credentials come from the session-key endpoint.
    SessionKey,
}

impl AuthMode {
    pub fn from_register(value: u8) -> Self {
        match value {
            0x01 => AuthMode::SessionKey,
            _ => AuthMode::Password,
        }
    }

    pub fn register_value(self) -> u8 {
        match self {
            AuthMode::Password => 0x00,
            AuthMode::SessionKey => 0x01,
        }
    }
}

/// Byte-addressed register file shared with the host MCU.
pub trait RegisterStore {
    fn write(&mut self, addr: u8, value: u8) -> Result<(), RegisterError>;

    fn read(&self, addr: u8) -> Result<u8, RegisterError>;

    /// Zero every bank.
    fn reset(&mut self);

    fn auth_mode(&self) -> AuthMode {
        AuthMode::from_register(self.read(REG_MODE).unwrap_or(0))
    }

    fn set_auth_mode(&mut self, mode: AuthMode) -> Result<(), RegisterError> {
        self.write(REG_MODE, mode.register_value())
    }

    /// User name and password from the registers; `None` if either is empty.
    fn credentials(&self) -> Option<Credentials> {
        let user = read_field(self, REG_USER_LEN, REG_USER_NAME)?;
        let password = read_field(self, REG_PASSWORD_LEN, REG_PASSWORD)?;
        Some(Credentials::new(user, password))
    }

    /// Write a user name and password into the credential registers.
    fn store_credentials(&mut self, user: &str, password: &str) -> Result<(), RegisterError> {
        write_field(self, REG_USER_LEN, REG_USER_NAME, user.as_bytes())?;
        write_field(self, REG_PASSWORD_LEN, REG_PASSWORD, password.as_bytes())
    }
}

fn read_field<S: RegisterStore + ?Sized>(store: &S, len_addr: u8, base: u8) -> Option<String> {
    let len = usize::from(store.read(len_addr).ok()?).min(CREDENTIAL_MAX_LEN);
    if len == 0 {
        return None;
    }
    let bytes = (0..len as u8)
        .map(|offset| store.read(base + offset))
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_field<S: RegisterStore + ?Sized>(
    store: &mut S,
    len_addr: u8,
    base: u8,
    value: &[u8],
) -> Result<(), RegisterError> {
    let value = &value[..value.len().min(CREDENTIAL_MAX_LEN)];
    for (offset, &byte) in value.iter().enumerate() {
        store.write(base + offset as u8, byte)?;
    }
    store.write(len_addr, value.len() as u8)
}

/// Firmware identity exposed through the common registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub fw_type: u8,
    pub major: u8,
    pub minor: u8,
    pub release: u16,
}

impl Default for FirmwareInfo {
    fn default() -> Self {
        Self {
            fw_type: 0x01,
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            release: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }
}

/// In-memory [`RegisterStore`] with one 240-byte bank and the common block.
#[derive(Debug, Clone)]
pub struct BankedRegisters {
    banks: Vec<[u8; BANK_LEN]>,
    selected: u8,
    firmware: FirmwareInfo,
}

impl BankedRegisters {
    pub fn new(firmware: FirmwareInfo) -> Self {
        Self {
            banks: vec![[0u8; BANK_LEN]],
            selected: 0,
            firmware,
        }
    }

    pub fn firmware(&self) -> FirmwareInfo {
        self.firmware
    }

    fn read_common(&self, addr: u8) -> u8 {
        let [release_lo, release_hi] = self.firmware.release.to_le_bytes();
        match addr {
            REG_FW_TYPE => self.firmware.fw_type,
            REG_VERSION_MAJOR => self.firmware.major,
            REG_VERSION_MINOR => self.firmware.minor,
            REG_VERSION_RELEASE => release_lo,
            0xF4 => release_hi,
            REG_BANK_SELECT => self.selected,
            _ => 0x00,
        }
    }
}

impl Default for BankedRegisters {
    fn default() -> Self {
        Self::new(FirmwareInfo::default())
    }
}

impl RegisterStore for BankedRegisters {
    fn write(&mut self, addr: u8, value: u8) -> Result<(), RegisterError> {
        if addr >= COMMON_BASE {
            if addr != REG_BANK_SELECT {
                return Err(RegisterError::ReadOnly(addr));
            }
            if usize::from(value) >= self.banks.len() {
                return Err(RegisterError::NoSuchBank(value));
            }
            debug!(bank = value, "register bank selected");
            self.selected = value;
            return Ok(());
        }

        let bank = self
            .banks
            .get_mut(usize::from(self.selected))
            .ok_or(RegisterError::NoSuchBank(self.selected))?;
        bank[usize::from(addr)] = value;
        Ok(())
    }

    fn read(&self, addr: u8) -> Result<u8, RegisterError> {
        if addr >= COMMON_BASE {
            return Ok(self.read_common(addr));
        }
        let bank = self
            .banks
            .get(usize::from(self.selected))
            .ok_or(RegisterError::NoSuchBank(self.selected))?;
        bank.get(usize::from(addr))
            .copied()
            .ok_or(RegisterError::OutOfRange(addr))
    }

    fn reset(&mut self) {
        for bank in &mut self.banks {
            bank.fill(0);
        }
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firmware() -> FirmwareInfo {
        FirmwareInfo {
            fw_type: 0x01,
            major: 0,
            minor: 3,
            release: 0x0102,
        }
    }

    #[test]
    fn bank_registers_round_trip() {
        let mut regs = BankedRegisters::new(firmware());
        regs.write(0x42, 0x99).unwrap();
        assert_eq!(regs.read(0x42).unwrap(), 0x99);
        assert_eq!(regs.read(0x43).unwrap(), 0x00);
    }

    #[test]
    fn common_registers_are_read_only() {
        let mut regs = BankedRegisters::new(firmware());
        assert_eq!(regs.write(REG_FW_TYPE, 7), Err(RegisterError::ReadOnly(REG_FW_TYPE)));
        assert_eq!(regs.read(REG_FW_TYPE).unwrap(), 0x01);
        assert_eq!(regs.read(REG_VERSION_MINOR).unwrap(), 3);
        assert_eq!(regs.read(REG_VERSION_RELEASE).unwrap(), 0x02);
        assert_eq!(regs.read(0xF4).unwrap(), 0x01);
    }

    #[test]
    fn bank_select_accepts_existing_banks_only() {
        let mut regs = BankedRegisters::new(firmware());
        assert!(regs.write(REG_BANK_SELECT, 0).is_ok());
        assert_eq!(regs.write(REG_BANK_SELECT, 1), Err(RegisterError::NoSuchBank(1)));
        assert_eq!(regs.read(REG_BANK_SELECT).unwrap(), 0);
    }

    #[test]
    fn reset_zeroes_banks() {
        let mut regs = BankedRegisters::new(firmware());
        regs.write(0x01, 0xFF).unwrap();
        regs.reset();
        assert_eq!(regs.read(0x01).unwrap(), 0);
        assert_eq!(regs.read(REG_VERSION_MINOR).unwrap(), 3);
    }

    #[test]
    fn credentials_need_both_fields() {
        let mut regs = BankedRegisters::default();
        assert!(regs.credentials().is_none());

        regs.store_credentials("device", "").unwrap();
        assert!(regs.credentials().is_none());

        regs.store_credentials("device", "secret").unwrap();
        let credentials = regs.credentials().unwrap();
        assert_eq!(credentials.user(), "device");
        assert_eq!(credentials.password(), "secret");
        assert_eq!(regs.read(REG_USER_LEN).unwrap(), 6);
        assert_eq!(regs.read(REG_USER_NAME).unwrap(), b'd');
    }

    #[test]
    fn auth_mode_register() {
        let mut regs = BankedRegisters::default();
        assert_eq!(regs.auth_mode(), AuthMode::Password);
        regs.write(REG_MODE, 0x01).unwrap();
        assert_eq!(regs.auth_mode(), AuthMode::SessionKey);
        regs.set_auth_mode(AuthMode::Password).unwrap();
        assert_eq!(regs.read(REG_MODE).unwrap(), 0x00);
    }
}
