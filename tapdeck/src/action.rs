//! The per-button action mini-language and its parser.
//!
//! An action string describes what a button does, split by `|` into a press
//! part and an optional release part:
//!
//! ```text
//! LC'c'            hold left-ctrl, press c (copy)
//! LS               sticky left-shift (standalone modifier press)
//! {ESC}            named special key
//! "hello"(500)"!"  type text, wait, type more
//! LC{F4}|\LC       press ctrl-F4, on release drop ctrl
//! A|(200)B         press a; 200 ms after release, press b
//! ```
//!
//! Components, left to right, longest match:
//! - a run of two-letter modifier names (`LC`, `RS`, ...) forms a prefix.
//!   Followed by a main component it becomes the `ModifierPress` applied
//!   before it; standing alone it is itself the component. This is how
//!   sticky modifiers are authored: `{LC}`/`LC` press the modifier and
//!   nothing releases it until an explicit `\LC` or an implicit button
//!   release does.
//! - `'...'` a chord of up to six simultaneous keys
//! - `{NAME}` a special key, or a modifier press if the name is only in the
//!   modifier table
//! - `"..."` a text literal, resolved character-by-character at execution
//!   time so unmappable characters degrade to warnings
//! - `(<ms>)` a delay
//! - `\XX` a modifier release
//! - a bare mappable character is the key itself (base keycode, no shift)
//!
//! A hard parse failure invalidates the whole button; the layout loader
//! records it and moves on to the next line.

use heapless::{String, Vec};
use tapdeck_types::keycode::{char_to_keycode, resolve_modifier, resolve_special};
use tapdeck_types::modifier::HidModifiers;

use crate::layout::LayoutName;

/// Most components a single press or release sequence can hold.
pub const SEQUENCE_MAX_LEN: usize = 8;
/// Longest text literal.
pub const TEXT_MAX_LEN: usize = 64;
/// A HID report fits six keys, so a chord cannot be wider.
pub const CHORD_MAX_KEYS: usize = 6;

/// One step of an action sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionComponent {
    /// A single key by usage id, from a bare character in the DSL.
    Key(u8),
    /// A single key by usage id, from a `{NAME}` lookup.
    SpecialKey(u8),
    /// Add modifier bits to the persistent mask.
    ModifierPress(HidModifiers),
    /// Remove modifier bits from the persistent mask.
    ModifierRelease(HidModifiers),
    /// Type a string character by character.
    Text(String<TEXT_MAX_LEN>),
    /// Wait this many milliseconds.
    Delay(u32),
    /// Press or release several keys as one report.
    Chord(Vec<u8, CHORD_MAX_KEYS>),
}

/// An ordered list of components. Empty sequences are legal no-ops.
pub type ActionSequence = Vec<ActionComponent, SEQUENCE_MAX_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    UnterminatedChord,
    UnterminatedName,
    UnterminatedText,
    UnknownName,
    UnknownModifierCode,
    TruncatedModifierCode,
    InvalidDelay,
    UnexpectedChar(char),
    SequenceFull,
    TextTooLong,
    InvalidFilename,
    FilenameTooLong,
}

/// The compiled press/release halves of a non-navigation action string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSequences {
    pub press: ActionSequence,
    pub release: ActionSequence,
    /// Waited before the release sequence runs, not before an implicit
    /// release.
    pub release_delay_ms: u32,
}

/// Validate a navigation button's action string as a layout file name.
///
/// Only alphanumerics, `.`, `_` and `-` are accepted. A missing `.cfg`
/// suffix is suspicious but legal, so it only warns.
pub fn parse_navigation_target(action: &str) -> Result<LayoutName, ParseError> {
    if action.is_empty() {
        return Err(ParseError::InvalidFilename);
    }
    if !action
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ParseError::InvalidFilename);
    }
    if !action.ends_with(".cfg") {
        warn!("navigation target '{}' does not end with .cfg", action);
    }
    let mut name = LayoutName::new();
    name.push_str(action).map_err(|_| ParseError::FilenameTooLong)?;
    Ok(name)
}

/// Compile a momentary/toggle action string.
///
/// On any error the partially built sequences are discarded; a button is
/// either fully compiled or invalid.
pub fn parse_sequences(action: &str) -> Result<ParsedSequences, ParseError> {
    let (press_part, release_part) = split_at_pipe(action);

    let mut parsed = ParsedSequences::default();
    parse_part(press_part, &mut parsed.press)?;

    if let Some(release_part) = release_part {
        let mut rest = release_part.trim_start();
        if rest.starts_with('(') {
            let (delay, after) = parse_delay(rest)?;
            parsed.release_delay_ms = delay;
            rest = after;
        }
        parse_part(rest, &mut parsed.release)?;
    }

    Ok(parsed)
}

/// Split at the first `|` that is not inside a `'...'` or `"..."` literal.
fn split_at_pipe(action: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    for (i, c) in action.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '|' => return (&action[..i], Some(&action[i + 1..])),
                _ => {}
            },
        }
    }
    (action, None)
}

fn parse_part(part: &str, seq: &mut ActionSequence) -> Result<(), ParseError> {
    let mut rest = part.trim_start();
    while !rest.is_empty() {
        rest = parse_component(rest, seq)?.trim_start();
    }
    Ok(())
}

fn push(seq: &mut ActionSequence, component: ActionComponent) -> Result<(), ParseError> {
    seq.push(component).map_err(|_| ParseError::SequenceFull)
}

/// Consume one component from the front of `input`, returning the rest.
fn parse_component<'a>(
    input: &'a str,
    seq: &mut ActionSequence,
) -> Result<&'a str, ParseError> {
    // Tentatively collect a run of modifier-name prefixes.
    let mut prefix = HidModifiers::new();
    let mut rest = input;
    while let Some(mask) = rest.get(0..2).and_then(resolve_modifier) {
        prefix |= mask;
        rest = rest[2..].trim_start();
    }

    if !prefix.is_empty() {
        push(seq, ActionComponent::ModifierPress(prefix))?;
        // The prefix only binds to a directly following main component;
        // otherwise it is a standalone (sticky) modifier press.
        if !matches!(rest.chars().next(), Some('\'' | '{' | '"' | '(' | '\\')) {
            debug!("parsed standalone modifier press {}", prefix.into_bits());
            return Ok(rest);
        }
    }

    let c = match rest.chars().next() {
        Some(c) => c,
        None => return Ok(rest),
    };

    match c {
        '\'' => {
            let body_end = rest[1..].find('\'').ok_or(ParseError::UnterminatedChord)?;
            let body = &rest[1..1 + body_end];
            let mut keys: Vec<u8, CHORD_MAX_KEYS> = Vec::new();
            for ch in body.chars() {
                match char_to_keycode(ch) {
                    Some((code, _)) => {
                        if keys.push(code).is_err() {
                            warn!("chord '{}' holds more than {} keys, rest dropped", body, CHORD_MAX_KEYS);
                            break;
                        }
                    }
                    None => warn!("ignoring unmappable char '{}' in chord", ch),
                }
            }
            if keys.is_empty() {
                if body.is_empty() {
                    warn!("empty key literal '' in action string");
                }
            } else {
                push(seq, ActionComponent::Chord(keys))?;
            }
            Ok(&rest[body_end + 2..])
        }
        '{' => {
            let name_end = rest[1..].find('}').ok_or(ParseError::UnterminatedName)?;
            let name = &rest[1..1 + name_end];
            if let Some(code) = resolve_special(name) {
                push(seq, ActionComponent::SpecialKey(code))?;
            } else if let Some(mask) = resolve_modifier(name) {
                // A modifier in braces presses without a paired release;
                // pair it with `\XX` for a momentary tap.
                push(seq, ActionComponent::ModifierPress(mask))?;
            } else {
                error!("unknown key name '{{{}}}' in action string", name);
                return Err(ParseError::UnknownName);
            }
            Ok(&rest[name_end + 2..])
        }
        '"' => {
            let text_end = rest[1..].find('"').ok_or(ParseError::UnterminatedText)?;
            let mut text: String<TEXT_MAX_LEN> = String::new();
            text.push_str(&rest[1..1 + text_end])
                .map_err(|_| ParseError::TextTooLong)?;
            push(seq, ActionComponent::Text(text))?;
            Ok(&rest[text_end + 2..])
        }
        '(' => {
            let (delay, after) = parse_delay(rest)?;
            push(seq, ActionComponent::Delay(delay))?;
            Ok(after)
        }
        '\\' => {
            if rest.len() < 3 {
                return Err(ParseError::TruncatedModifierCode);
            }
            let mask = rest
                .get(1..3)
                .and_then(resolve_modifier)
                .ok_or(ParseError::UnknownModifierCode)?;
            push(seq, ActionComponent::ModifierRelease(mask))?;
            Ok(&rest[3..])
        }
        c => match char_to_keycode(c) {
            Some((code, _)) => {
                push(seq, ActionComponent::Key(code))?;
                Ok(&rest[c.len_utf8()..])
            }
            None => {
                error!("unexpected char '{}' in action string", c);
                Err(ParseError::UnexpectedChar(c))
            }
        },
    }
}

/// Parse `(<digits>)` from the front of `input`, returning the value and
/// the rest.
fn parse_delay(input: &str) -> Result<(u32, &str), ParseError> {
    let close = input[1..].find(')').ok_or(ParseError::InvalidDelay)?;
    let digits = &input[1..1 + close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidDelay);
    }
    let value: u32 = digits.parse().map_err(|_| ParseError::InvalidDelay)?;
    Ok((value, &input[close + 2..]))
}
