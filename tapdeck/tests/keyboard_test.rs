pub mod common;

mod keyboard_integration {
    use embassy_futures::block_on;
    use embassy_time::Instant;
    use rusty_fork::rusty_fork_test;
    use tapdeck::event::Gesture;
    use tapdeck::peer;
    use tapdeck_types::keycode::{KC_A, KC_ESCAPE};

    use crate::common::{
        KC_LCTRL, create_test_keyboard, gesture, report, run_gesture_sequence_test,
    };

    rusty_fork_test! {

        #[test]
        fn momentary_press_and_implicit_release() {
            let mut keyboard = create_test_keyboard("2x2 (0)\n11MA\tLC{ESC}\n");

            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Press, 0),
                    gesture(0, Gesture::Release, 50),
                ],
                &[
                    // Modifier press reports before the key lands
                    report(KC_LCTRL, [0, 0, 0, 0, 0, 0]),
                    report(KC_LCTRL, [KC_ESCAPE, 0, 0, 0, 0, 0]),
                    // Implicit release undoes both in one report
                    report(0, [0, 0, 0, 0, 0, 0]),
                ],
            ));

            // Round-trip idempotence: state is exactly as before the press.
            assert!(keyboard.held_keys().is_empty());
            assert!(keyboard.local_modifiers().is_empty());
        }

        #[test]
        fn chord_is_one_report_per_transition() {
            let mut keyboard = create_test_keyboard("2x2 (0)\n11MA\t'ab'\n");

            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Press, 0),
                    gesture(0, Gesture::Release, 50),
                ],
                &[
                    report(0, [KC_A, KC_A + 1, 0, 0, 0, 0]),
                    report(0, [0, 0, 0, 0, 0, 0]),
                ],
            ));
        }

        #[test]
        fn seventh_key_is_dropped_not_queued() {
            let cfg = "2x2 (0)\n11MA\t'abcdef'\n11MB\t'g'\n";
            let mut keyboard = create_test_keyboard(cfg);

            let full = [KC_A, KC_A + 1, KC_A + 2, KC_A + 3, KC_A + 4, KC_A + 5];
            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Press, 0),
                    // B's key cannot be added and produces no report at all.
                    gesture(1, Gesture::Press, 30),
                    gesture(1, Gesture::Release, 30),
                    gesture(0, Gesture::Release, 30),
                ],
                &[
                    report(0, full),
                    report(0, [0, 0, 0, 0, 0, 0]),
                ],
            ));

            assert!(keyboard.held_keys().is_empty());
        }

        #[test]
        fn explicit_release_waits_its_delay() {
            let mut keyboard = create_test_keyboard("2x2 (0)\n11MA\t'a'|(150)'a'\n");

            let start = Instant::now();
            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Press, 0),
                    gesture(0, Gesture::Release, 10),
                ],
                &[
                    report(0, [KC_A, 0, 0, 0, 0, 0]),
                    report(0, [0, 0, 0, 0, 0, 0]),
                ],
            ));
            assert!(
                start.elapsed().as_millis() >= 150,
                "release sequence ran before its delay"
            );
        }

        #[test]
        fn remote_modifiers_are_merged_into_every_report() {
            let mut keyboard = create_test_keyboard("2x2 (0)\n11MA\t'a'\n");
            peer::update_remote_modifiers(0x10);

            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Press, 0),
                    gesture(0, Gesture::Release, 30),
                ],
                &[
                    report(0x10, [KC_A, 0, 0, 0, 0, 0]),
                    report(0x10, [0, 0, 0, 0, 0, 0]),
                ],
            ));

            // The remote mask lives in the transport, not in our state.
            assert!(keyboard.local_modifiers().is_empty());
        }

        #[test]
        fn toggle_holds_until_second_click() {
            let mut keyboard = create_test_keyboard("2x2 (0)\nT11MA\t'a'\n");

            block_on(run_gesture_sequence_test(
                &mut keyboard,
                &[
                    gesture(0, Gesture::Click, 0),
                    gesture(0, Gesture::Click, 50),
                ],
                &[
                    report(0, [KC_A, 0, 0, 0, 0, 0]),
                    report(0, [0, 0, 0, 0, 0, 0]),
                ],
            ));
            assert!(keyboard.held_keys().is_empty());
        }
    }
}
