//! HID report type and the reporter seam towards the wireless transport.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use crate::channel::KEYBOARD_REPORT_CHANNEL;
use crate::state;

/// A boot-protocol keyboard report: modifier bits plus up to six held keys.
/// Unused key slots are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub reserved: u8,
    pub keycodes: [u8; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    Disconnected,
    BufferOverflow,
    TransportError,
}

/// Implemented by the HID transport (the BLE stack glue).
///
/// The transport guarantees that consecutive writes from this task are not
/// reordered; it offers no delivery acknowledgment, and none is needed.
pub trait HidReporter {
    /// Write one report to the host.
    async fn write_report(&mut self, report: KeyboardReport) -> Result<usize, HidError>;

    /// Drain the report channel into the transport.
    ///
    /// Reports generated while no host is connected are dropped, so a
    /// reconnecting host never receives a backlog of stale key states.
    async fn run_reporter(&mut self) {
        loop {
            let report = KEYBOARD_REPORT_CHANNEL.receive().await;
            if !state::is_connected() {
                continue;
            }
            if let Err(e) = self.write_report(report).await {
                error!("HID report write failed: {:?}", e);
            }
        }
    }
}
