//! Tapdeck is the logic core of a wireless touchscreen macro keypad: it
//! parses a line-oriented layout file into a grid of buttons, compiles each
//! button's action string into a sequence of keyboard operations, and runs
//! the key/modifier state machine that turns button gestures into HID
//! reports.
//!
//! The crate deliberately stops at the transport seams. The BLE HID stack,
//! the peer datagram link and the touch UI are collaborators that plug into
//! the traits and channels exported here:
//!
//! - the UI feeds [`event::ButtonEvent`]s into
//!   [`channel::BUTTON_EVENT_CHANNEL`] and consumes layout-load requests
//!   from [`channel::LAYOUT_REQUEST_CHANNEL`]
//! - the HID transport implements [`hid::HidReporter`] and drains
//!   [`channel::KEYBOARD_REPORT_CHANNEL`]
//! - the peer link implements [`peer::SyncReader`]/[`peer::SyncWriter`] and
//!   is pumped by [`peer::PeerSync`]
//!
//! All key-state mutation happens on the single task running
//! [`keyboard::Keyboard::run`]; in-sequence delays are cooperative awaits,
//! so a running action sequence is never interleaved with another button.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod action;
pub mod channel;
pub mod config;
pub mod event;
pub mod grid;
pub mod hid;
pub mod keyboard;
pub mod layout;
pub mod peer;
pub mod state;

/// The raw mutex type used by all channels in this crate.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Size of the inbound button-event channel.
pub const EVENT_CHANNEL_SIZE: usize = 16;
/// Size of the outbound HID report channel.
pub const REPORT_CHANNEL_SIZE: usize = 16;
/// Size of the outbound peer modifier-broadcast channel.
pub const SYNC_CHANNEL_SIZE: usize = 8;
