use core::cell::RefCell;

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use futures::join;
use tapdeck::channel::{BUTTON_EVENT_CHANNEL, KEYBOARD_REPORT_CHANNEL};
use tapdeck::config::BehaviorConfig;
use tapdeck::event::{ButtonEvent, Gesture};
use tapdeck::hid::KeyboardReport;
use tapdeck::keyboard::Keyboard;
use tapdeck::layout::Layout;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const KC_LSHIFT: u8 = 1 << 1;
pub const KC_LCTRL: u8 = 1 << 0;

#[derive(Debug, Clone)]
pub struct TestGesture {
    pub button: u8,
    pub gesture: Gesture,
    /// Delay before this gesture is sent, in milliseconds.
    pub delay: u64,
}

pub fn gesture(button: u8, gesture: Gesture, delay: u64) -> TestGesture {
    TestGesture { button, gesture, delay }
}

/// Build a keyboard over a leaked layout; leaking is acceptable in tests.
pub fn create_test_keyboard(cfg: &str) -> Keyboard<'static> {
    create_test_keyboard_with_layout(cfg).0
}

/// Like [`create_test_keyboard`], but also hand back the layout cell for
/// tests that inspect button state.
pub fn create_test_keyboard_with_layout(
    cfg: &str,
) -> (Keyboard<'static>, &'static RefCell<Layout>) {
    let layout = Layout::parse_str(cfg).expect("test layout must parse");
    let cell: &'static RefCell<Layout> = Box::leak(Box::new(RefCell::new(layout)));
    (Keyboard::new(cell, BehaviorConfig::default()), cell)
}

pub fn report(modifier: u8, keycodes: [u8; 6]) -> KeyboardReport {
    KeyboardReport {
        modifier,
        reserved: 0,
        keycodes,
    }
}

/// Feed a gesture sequence into the running keyboard and verify the exact
/// stream of HID reports it produces.
pub async fn run_gesture_sequence_test(
    keyboard: &mut Keyboard<'static>,
    gestures: &[TestGesture],
    expected_reports: &[KeyboardReport],
) {
    static REPORTS_DONE: Mutex<CriticalSectionRawMutex, bool> = Mutex::new(false);

    BUTTON_EVENT_CHANNEL.clear();
    KEYBOARD_REPORT_CHANNEL.clear();
    const MAX_TEST_TIMEOUT: Duration = Duration::from_secs(10);

    join!(
        // Run the keyboard until all reports are verified
        async {
            select(keyboard.run(), async {
                select(
                    async {
                        Timer::after(MAX_TEST_TIMEOUT).await;
                        panic!("test timeout reached");
                    },
                    async {
                        while !*REPORTS_DONE.lock().await {
                            Timer::after(Duration::from_millis(20)).await;
                        }
                    },
                )
                .await;
            })
            .await;
        },
        // Send all gestures with their delays
        async {
            for g in gestures {
                Timer::after(Duration::from_millis(g.delay)).await;
                BUTTON_EVENT_CHANNEL
                    .send(ButtonEvent::new(g.button, g.gesture))
                    .await;
            }
        },
        // Verify reports in order
        async {
            for (index, expected) in expected_reports.iter().enumerate() {
                match select(
                    Timer::after(Duration::from_secs(2)),
                    KEYBOARD_REPORT_CHANNEL.receive(),
                )
                .await
                {
                    Either::First(_) => panic!("timed out waiting for report #{}", index),
                    Either::Second(received) => {
                        assert_eq!(
                            expected, &received,
                            "on report #{}, expected left but got right",
                            index
                        );
                    }
                }
            }
            *REPORTS_DONE.lock().await = true;
        }
    );
}
