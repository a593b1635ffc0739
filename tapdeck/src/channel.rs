//! Static channels connecting the state machine to its collaborators.

use embassy_sync::channel::Channel;

use crate::event::ButtonEvent;
use crate::hid::KeyboardReport;
use crate::layout::LayoutName;
use crate::peer::SyncMessage;
use crate::{EVENT_CHANNEL_SIZE, RawMutex, REPORT_CHANNEL_SIZE, SYNC_CHANNEL_SIZE};

/// Button gestures from the touch UI to the key state machine.
pub static BUTTON_EVENT_CHANNEL: Channel<RawMutex, ButtonEvent, EVENT_CHANNEL_SIZE> = Channel::new();

/// Keyboard reports from the state machine to the HID transport.
pub static KEYBOARD_REPORT_CHANNEL: Channel<RawMutex, KeyboardReport, REPORT_CHANNEL_SIZE> =
    Channel::new();

/// Local modifier-mask updates to be broadcast to the peer device.
/// Best-effort: the sender drops updates when the channel is full.
pub static MODIFIER_BROADCAST_CHANNEL: Channel<RawMutex, SyncMessage, SYNC_CHANNEL_SIZE> =
    Channel::new();

/// Layout-load requests from navigation buttons to the UI glue.
pub static LAYOUT_REQUEST_CHANNEL: Channel<RawMutex, LayoutName, 2> = Channel::new();
