//! Modifier synchronization with the paired peer keypad.
//!
//! Two keypads can act as one logical keyboard: each broadcasts its local
//! modifier mask over a best-effort datagram link, and each folds the last
//! mask it heard into every outbound HID report. Pairing, discovery and
//! the radio itself live outside this crate; the transport only has to
//! implement [`SyncReader`]/[`SyncWriter`] and let [`PeerSync`] pump the
//! messages, or call [`update_remote_modifiers`] straight from its
//! receive callback.
//!
//! Nothing here blocks report emission: until the first message arrives
//! the remote mask is simply 0.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_futures::select::{Either, select};
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};
use tapdeck_types::modifier::HidModifiers;

use crate::channel::MODIFIER_BROADCAST_CHANNEL;

/// Wire size of an encoded [`SyncMessage`].
pub const SYNC_MESSAGE_MAX_SIZE: usize = SyncMessage::POSTCARD_MAX_SIZE;

/// Messages exchanged between paired keypads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncMessage {
    /// The sender's current local modifier mask.
    ModifierUpdate(HidModifiers),
}

impl SyncMessage {
    /// Serialize into `buf`, returning the used prefix.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8], SyncError> {
        postcard::to_slice(self, buf).map_err(|_| SyncError::SerializeError).map(|b| &*b)
    }

    /// Deserialize one message from a received datagram.
    pub fn decode(buf: &[u8]) -> Result<Self, SyncError> {
        postcard::from_bytes(buf).map_err(|_| SyncError::DeserializeError)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    SerializeError,
    DeserializeError,
    /// The radio reported a send/receive failure. Updates are fire and
    /// forget, so the caller just logs this.
    TransportError,
    Disconnected,
}

/// Inbound message source of the peer transport.
pub trait SyncReader {
    async fn read(&mut self) -> Result<SyncMessage, SyncError>;
}

/// Outbound message sink of the peer transport.
pub trait SyncWriter {
    async fn write(&mut self, message: &SyncMessage) -> Result<usize, SyncError>;
}

/// Last modifier mask received from the peer. 0 until the first message.
///
/// Written from the transport's receive context, read by the report path;
/// "eventually visible to the next report" is all that is required, hence
/// relaxed ordering.
static REMOTE_MODIFIER_MASK: AtomicU8 = AtomicU8::new(0);

/// Record a modifier mask received from the peer.
pub fn update_remote_modifiers(mask: u8) {
    REMOTE_MODIFIER_MASK.store(mask, Ordering::Relaxed);
}

/// The peer's current modifier mask as last heard.
pub fn remote_modifiers() -> HidModifiers {
    HidModifiers::from_bits(REMOTE_MODIFIER_MASK.load(Ordering::Relaxed))
}

/// Queue the local mask for broadcast. Best-effort: dropped if the
/// outbound queue is full or no transport is pumping it.
pub(crate) fn broadcast_modifiers(mask: HidModifiers) {
    if MODIFIER_BROADCAST_CHANNEL
        .try_send(SyncMessage::ModifierUpdate(mask))
        .is_err()
    {
        debug!("modifier broadcast queue full, dropping update");
    }
}

/// Pump between the peer transport and the rest of the firmware: inbound
/// masks land in the remote-modifier atomic, queued local updates go out.
pub struct PeerSync<T: SyncReader + SyncWriter> {
    transport: T,
}

impl<T: SyncReader + SyncWriter> PeerSync<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn run(&mut self) {
        loop {
            match select(
                self.transport.read(),
                MODIFIER_BROADCAST_CHANNEL.receive(),
            )
            .await
            {
                Either::First(Ok(SyncMessage::ModifierUpdate(mask))) => {
                    debug!("peer modifier mask: {}", mask.into_bits());
                    update_remote_modifiers(mask.into_bits());
                }
                Either::First(Err(SyncError::Disconnected)) => {
                    info!("peer link closed");
                    return;
                }
                Either::First(Err(e)) => {
                    warn!("peer read error: {:?}", e);
                }
                Either::Second(message) => {
                    if let Err(e) = self.transport.write(&message).await {
                        // Best effort by contract; the next modifier
                        // change re-syncs the peer anyway.
                        warn!("peer write error: {:?}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tapdeck_types::modifier::{LEFT_CTRL, RIGHT_SHIFT};

    #[test]
    fn sync_message_round_trips_through_postcard() {
        let message = SyncMessage::ModifierUpdate(LEFT_CTRL | RIGHT_SHIFT);
        let mut buf = [0u8; SYNC_MESSAGE_MAX_SIZE];
        let encoded = message.encode(&mut buf).unwrap();
        assert_eq!(SyncMessage::decode(encoded).unwrap(), message);
    }

    #[test]
    fn truncated_datagram_is_an_error() {
        assert_eq!(SyncMessage::decode(&[]), Err(SyncError::DeserializeError));
    }
}
