use core::sync::atomic::{AtomicBool, Ordering};

/// Whether a HID host is currently connected.
///
/// Written by the transport glue on connect/disconnect, read by the report
/// pump before every write. Reports produced while disconnected are drained
/// and dropped rather than queued indefinitely.
pub static CONNECTION_STATE: AtomicBool = AtomicBool::new(false);

pub fn set_connected(connected: bool) {
    CONNECTION_STATE.store(connected, Ordering::Release);
}

pub fn is_connected() -> bool {
    CONNECTION_STATE.load(Ordering::Acquire)
}
