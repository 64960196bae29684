use std::ops::{Deref, DerefMut};

use sipf_transport::ByteChannel;
use tracing::debug;

/// Keeps relay echo off while a transfer runs.
///
/// Echo is switched off on creation and back on when the guard drops, on
/// every exit path.
pub struct TransferGuard<'a, C: ByteChannel + ?Sized> {
    channel: &'a mut C,
}

impl<'a, C: ByteChannel + ?Sized> TransferGuard<'a, C> {
    pub fn begin(channel: &'a mut C) -> Self {
        channel.set_echo(false);
        debug!("transfer begin; echo off");
        Self { channel }
    }
}

impl<C: ByteChannel + ?Sized> Deref for TransferGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.channel
    }
}

impl<C: ByteChannel + ?Sized> DerefMut for TransferGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.channel
    }
}

impl<C: ByteChannel + ?Sized> Drop for TransferGuard<'_, C> {
    fn drop(&mut self) {
        self.channel.set_echo(true);
        debug!("transfer end; echo on");
    }
}
