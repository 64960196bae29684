use std::convert::Infallible;

use crate::error::FotaError;

/// Image used when `UPDATE UPDATE` names none.
pub const DEFAULT_IMAGE: &str = "app_update.bin";

/// Firmware-over-the-air installer.
///
/// A successful update restarts the device, so `update` only ever returns
/// an error.
pub trait FirmwareUpdater {
    fn update(&mut self, image: &str) -> Result<Infallible, FotaError>;
}

/// Updater for hosts that cannot flash themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFirmwareUpdate;

impl FirmwareUpdater for NoFirmwareUpdate {
    fn update(&mut self, _image: &str) -> Result<Infallible, FotaError> {
        Err(FotaError::Unsupported)
    }
}
