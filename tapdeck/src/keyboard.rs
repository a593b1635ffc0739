//! The key/modifier state machine.
//!
//! One [`Keyboard`] instance owns the live key state of the device: the up
//! to six held non-modifier keys and the local modifier mask. Button
//! gestures arrive over [`BUTTON_EVENT_CHANNEL`], reports leave over
//! [`KEYBOARD_REPORT_CHANNEL`], and every report folds in the peer's
//! modifier mask at the moment it is built.
//!
//! All processing is serialized on the task running [`Keyboard::run`]:
//! delays inside a sequence suspend the task, so a long text literal
//! blocks other buttons until it finishes. That is a deliberate latency
//! tradeoff; see the crate docs before changing it.

use core::cell::RefCell;

use embassy_time::Timer;
use heapless::Vec;
use tapdeck_types::keycode::char_to_keycode;
use tapdeck_types::modifier::{self, HidModifiers};

use crate::action::{ActionComponent, ActionSequence};
use crate::channel::{BUTTON_EVENT_CHANNEL, KEYBOARD_REPORT_CHANNEL, LAYOUT_REQUEST_CHANNEL};
use crate::config::BehaviorConfig;
use crate::event::{ButtonEvent, Gesture};
use crate::hid::KeyboardReport;
use crate::layout::{ButtonKind, Layout};
use crate::peer;

/// What a press-sequence run activated, stored on the button so its
/// release can undo exactly that.
struct SequenceResult {
    modifier_delta: HidModifiers,
    keys_pressed: Vec<u8, 6>,
}

pub struct Keyboard<'a> {
    /// The active layout. The UI glue owns the cell and swaps its content
    /// on navigation; both sides only borrow it transiently.
    layout: &'a RefCell<Layout>,

    /// Held non-modifier keys, insertion ordered, no duplicates, never 0.
    held_keys: Vec<u8, 6>,

    /// Modifier bits this device currently asserts.
    local_modifiers: HidModifiers,

    behavior: BehaviorConfig,
}

impl<'a> Keyboard<'a> {
    pub fn new(layout: &'a RefCell<Layout>, behavior: BehaviorConfig) -> Self {
        Self {
            layout,
            held_keys: Vec::new(),
            local_modifiers: HidModifiers::new(),
            behavior,
        }
    }

    /// Process button gestures forever.
    pub async fn run(&mut self) {
        loop {
            let event = BUTTON_EVENT_CHANNEL.receive().await;
            self.process_event(event).await;
        }
    }

    /// Drop all held keys and modifiers. The UI glue calls this after
    /// installing a new layout so nothing leaks across layouts.
    pub fn reset(&mut self) {
        self.held_keys.clear();
        self.local_modifiers = HidModifiers::new();
    }

    /// Currently held non-modifier keys, oldest first.
    pub fn held_keys(&self) -> &[u8] {
        &self.held_keys
    }

    /// Modifier bits asserted by this device alone.
    pub fn local_modifiers(&self) -> HidModifiers {
        self.local_modifiers
    }

    /// The mask that goes on the wire: local bits or'ed with the peer's
    /// last known mask. Computed fresh for every report, never cached.
    pub fn effective_modifiers(&self) -> HidModifiers {
        self.local_modifiers | peer::remote_modifiers()
    }

    async fn process_event(&mut self, event: ButtonEvent) {
        let index = event.button as usize;
        let kind = match self.layout.borrow().buttons.get(index) {
            Some(button) => button.kind,
            None => {
                warn!("gesture for unknown button {}", event.button);
                return;
            }
        };

        match (kind, event.gesture) {
            (ButtonKind::Momentary, Gesture::Press) => self.press_button(index).await,
            (ButtonKind::Momentary, Gesture::Release) => self.release_button(index).await,
            (ButtonKind::Toggle, Gesture::Click) => self.toggle_button(index).await,
            (ButtonKind::Navigation, Gesture::Click) => self.navigate(index).await,
            _ => {}
        }
    }

    /// Momentary press / toggle-on: run the press sequence and remember
    /// what it activated.
    async fn press_button(&mut self, index: usize) {
        let (sequence, default_delay_ms) = {
            let layout = self.layout.borrow();
            (layout.buttons[index].press_sequence.clone(), layout.default_delay_ms)
        };
        let result = self.execute_sequence(&sequence, true, default_delay_ms).await;
        debug!(
            "press stored {} keys, modifier delta {}",
            result.keys_pressed.len(),
            result.modifier_delta.into_bits()
        );
        let mut layout = self.layout.borrow_mut();
        let button = &mut layout.buttons[index];
        button.held = result.keys_pressed;
        button.modifier_delta = result.modifier_delta;
    }

    /// Momentary release / toggle-off: undo the stored press effects, or
    /// run the explicit release sequence which is fully self-describing.
    async fn release_button(&mut self, index: usize) {
        let (sequence, release_delay_ms, default_delay_ms, stored_keys, stored_delta) = {
            let mut layout = self.layout.borrow_mut();
            let default_delay_ms = layout.default_delay_ms;
            let button = &mut layout.buttons[index];
            let stored_keys = core::mem::take(&mut button.held);
            let stored_delta = core::mem::take(&mut button.modifier_delta);
            (
                button.release_sequence.clone(),
                button.release_delay_ms,
                default_delay_ms,
                stored_keys,
                stored_delta,
            )
        };

        if sequence.is_empty() {
            let mut changed = false;
            for code in &stored_keys {
                self.remove_held_key(*code);
                changed = true;
            }
            if !stored_delta.is_empty() {
                self.local_modifiers &= !stored_delta;
                changed = true;
                peer::broadcast_modifiers(self.local_modifiers);
            }
            if changed {
                self.send_keyboard_report().await;
            }
        } else {
            if release_delay_ms > 0 {
                Timer::after_millis(release_delay_ms as u64).await;
            }
            self.execute_sequence(&sequence, false, default_delay_ms).await;
        }
    }

    async fn toggle_button(&mut self, index: usize) {
        let turning_on = {
            let mut layout = self.layout.borrow_mut();
            let button = &mut layout.buttons[index];
            button.toggle_on = !button.toggle_on;
            button.toggle_on
        };
        info!("toggle {} now {}", index, turning_on);
        if turning_on {
            self.press_button(index).await;
        } else {
            self.release_button(index).await;
        }
    }

    /// Navigation click: full reset of the key state, one report of the
    /// cleared state, then hand the target name to the UI glue. Nothing
    /// from the outgoing layout survives into the incoming one.
    async fn navigate(&mut self, index: usize) {
        let target = {
            let layout = self.layout.borrow();
            layout.buttons[index].navigation_target.clone()
        };
        let Some(target) = target else {
            error!("navigation button {} has no target", index);
            return;
        };
        info!("navigating to '{}', resetting key state", target.as_str());

        self.held_keys.clear();
        self.local_modifiers = HidModifiers::new();
        self.layout.borrow_mut().reset_runtime_state();
        self.send_keyboard_report().await;

        LAYOUT_REQUEST_CHANNEL.send(target).await;
    }

    /// Run one sequence. Press runs add keys and set modifiers; release
    /// runs remove and clear them. Returns the net additions so the
    /// caller can undo them later.
    async fn execute_sequence(
        &mut self,
        sequence: &ActionSequence,
        is_press: bool,
        default_delay_ms: u32,
    ) -> SequenceResult {
        let initial_modifiers = self.local_modifiers;
        let mut keys_pressed: Vec<u8, 6> = Vec::new();

        for component in sequence {
            match component {
                ActionComponent::Key(code) | ActionComponent::SpecialKey(code) => {
                    if is_press {
                        if self.add_held_key(*code) {
                            keys_pressed.push(*code).ok();
                        }
                    } else {
                        self.remove_held_key(*code);
                    }
                    self.send_keyboard_report().await;
                }
                ActionComponent::ModifierPress(mask) => {
                    self.local_modifiers |= *mask;
                    self.send_keyboard_report().await;
                    peer::broadcast_modifiers(self.local_modifiers);
                }
                ActionComponent::ModifierRelease(mask) => {
                    self.local_modifiers &= !*mask;
                    self.send_keyboard_report().await;
                    peer::broadcast_modifiers(self.local_modifiers);
                }
                ActionComponent::Delay(ms) => {
                    if *ms > 0 {
                        Timer::after_millis(*ms as u64).await;
                    }
                }
                ActionComponent::Text(text) => {
                    self.type_text(text.as_str()).await;
                }
                ActionComponent::Chord(keys) => {
                    let mut any_added = false;
                    if is_press {
                        for code in keys {
                            if self.add_held_key(*code) {
                                keys_pressed.push(*code).ok();
                                any_added = true;
                            }
                        }
                    } else {
                        for code in keys {
                            self.remove_held_key(*code);
                        }
                    }
                    // One report for the whole chord, and none at all if a
                    // press added nothing.
                    if any_added || !is_press {
                        self.send_keyboard_report().await;
                    }
                }
            }

            // The layout-wide pacing delay; a Delay component governs its
            // own timing.
            if !matches!(component, ActionComponent::Delay(_)) && default_delay_ms > 0 {
                Timer::after_millis(default_delay_ms as u64).await;
            }
        }

        SequenceResult {
            modifier_delta: self.local_modifiers & !initial_modifiers,
            keys_pressed,
        }
    }

    /// Type a text literal character by character.
    ///
    /// For every character whose shift requirement differs from the
    /// persistent mask, shift is toggled for just that character and the
    /// persistent mask is restored afterwards, each step as its own
    /// report. The temporary shift changes are never broadcast to the
    /// peer. This is the most timing-sensitive path in the firmware;
    /// the intervals come from [`BehaviorConfig`].
    async fn type_text(&mut self, text: &str) {
        let key_event_interval = self.behavior.typing.key_event_interval;
        let inter_char_interval = self.behavior.typing.inter_char_interval;

        for c in text.chars() {
            let Some((code, needs_shift)) = char_to_keycode(c) else {
                warn!("cannot type '{}', no keycode for it", c);
                Timer::after(inter_char_interval).await;
                continue;
            };

            let persistent = self.local_modifiers;
            let toggle_shift = needs_shift != persistent.any_shift();

            if toggle_shift {
                if needs_shift {
                    self.local_modifiers |= modifier::LEFT_SHIFT;
                } else {
                    self.local_modifiers &= !(modifier::LEFT_SHIFT | modifier::RIGHT_SHIFT);
                }
                self.send_keyboard_report().await;
                Timer::after(key_event_interval).await;
            }

            self.add_held_key(code);
            self.send_keyboard_report().await;
            Timer::after(key_event_interval).await;

            self.remove_held_key(code);
            self.send_keyboard_report().await;
            Timer::after(key_event_interval).await;

            self.local_modifiers = persistent;
            if toggle_shift {
                self.send_keyboard_report().await;
                Timer::after(key_event_interval).await;
            }

            Timer::after(inter_char_interval).await;
        }
    }

    /// Add a key to the held set. 0 is "no key" and succeeds as a no-op,
    /// as does a key that is already held. Fails when six keys are held:
    /// the key is dropped, not queued.
    fn add_held_key(&mut self, code: u8) -> bool {
        if code == 0 || self.held_keys.contains(&code) {
            return true;
        }
        if self.held_keys.push(code).is_err() {
            warn!("6-key limit reached, dropping keycode {}", code);
            return false;
        }
        true
    }

    /// Remove a held key, keeping the relative order of the rest.
    fn remove_held_key(&mut self, code: u8) {
        if code == 0 {
            return;
        }
        if let Some(position) = self.held_keys.iter().position(|&k| k == code) {
            self.held_keys.remove(position);
        }
    }

    async fn send_keyboard_report(&self) {
        let mut keycodes = [0u8; 6];
        keycodes[..self.held_keys.len()].copy_from_slice(&self.held_keys);
        let report = KeyboardReport {
            modifier: self.effective_modifiers().into_bits(),
            reserved: 0,
            keycodes,
        };
        KEYBOARD_REPORT_CHANNEL.send(report).await;
    }
}
