//! Layout file loading.
//!
//! A layout file is line oriented. The first line is the grid header,
//! `<cols>x<rows>` with an optional default inter-component delay in
//! parentheses; every further non-blank, non-`#` line defines one button:
//!
//! ```text
//! 4x3 (50)
//! # marker, grid digits, font char, label, TAB, action string
//! T22MCopy mode	LC
//! 01S$UP	{PGUP}
//! G11Smenu	menu.cfg
//! ```
//!
//! The loader never stops at the first bad line: it records a
//! [`LineError`] per failure, keeps placing the remaining buttons, and
//! reports overall failure at the end so an author sees every problem in
//! one pass.

use heapless::{String, Vec};

use crate::action::{ActionSequence, ParseError, parse_navigation_target, parse_sequences};
use crate::grid::GridState;

/// Most buttons a single layout can define.
pub const MAX_BUTTONS: usize = 32;
/// Most line errors kept per load; further failing lines still fail the
/// load but are no longer listed individually.
pub const MAX_LINE_ERRORS: usize = 16;
/// Longest run of literal text in one label part.
pub const LABEL_TEXT_MAX: usize = 32;
/// Most text/icon segments per label.
pub const MAX_LABEL_PARTS: usize = 4;
/// Longest layout file name.
pub const FILENAME_MAX_LEN: usize = 32;

/// Inter-component delay when the header does not set one.
pub const DEFAULT_ACTION_DELAY_MS: u32 = 50;

/// A layout file name, as referenced by navigation buttons.
pub type LayoutName = String<FILENAME_MAX_LEN>;

/// Icon names a label may reference as `$NAME`. Resolution to actual
/// glyphs is the display layer's business; the loader only tokenizes.
const ICON_NAMES: &[&str] = &[
    "AUDIO", "BACKSPACE", "BATTERY_1", "BATTERY_2", "BATTERY_3", "BATTERY_EMPTY",
    "BATTERY_FULL", "BELL", "BLUETOOTH", "BULLET", "CALL", "CHARGE", "CLOSE", "COPY",
    "CUT", "DIRECTORY", "DOWN", "DOWNLOAD", "DRIVE", "EDIT", "EJECT", "EYE_CLOSE",
    "EYE_OPEN", "FILE", "GPS", "HOME", "IMAGE", "KEYBOARD", "LEFT", "LIST", "LOOP",
    "MINUS", "MUTE", "NEW_LINE", "NEXT", "OK", "PASTE", "PAUSE", "PLAY", "PLUS",
    "POWER", "PREV", "REFRESH", "RIGHT", "SAVE", "SD_CARD", "SETTINGS", "SHUFFLE",
    "STOP", "TRASH", "UP", "UPLOAD", "USB", "VIDEO", "VOLUME_MAX", "VOLUME_MID",
    "WARNING", "WIFI",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonKind {
    /// Press runs the press sequence, release undoes it (implicitly or via
    /// an explicit release sequence).
    Momentary,
    /// Click alternates between the press and release behavior.
    Toggle,
    /// Click requests a different layout file.
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    Small,
    Medium,
    Large,
    Jumbo,
}

impl FontSize {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Small),
            'M' => Some(Self::Medium),
            'L' => Some(Self::Large),
            'J' => Some(Self::Jumbo),
            _ => None,
        }
    }
}

/// One segment of a button label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelPart {
    Text(String<LABEL_TEXT_MAX>),
    /// A `$NAME` icon token, stored by canonical name.
    Icon(&'static str),
}

/// Everything the UI and the state machine need to know about one button.
#[derive(Debug, Clone)]
pub struct ButtonDefinition {
    pub kind: ButtonKind,
    pub font_size: FontSize,
    pub label: Vec<LabelPart, MAX_LABEL_PARTS>,
    pub press_sequence: ActionSequence,
    pub release_sequence: ActionSequence,
    /// Waited before the explicit release sequence runs.
    pub release_delay_ms: u32,
    /// Only set for [`ButtonKind::Navigation`].
    pub navigation_target: Option<LayoutName>,
    pub col: u8,
    pub row: u8,
    pub col_span: u8,
    pub row_span: u8,

    // Runtime state, owned by the state machine. Records what this
    // button's press activated so an implicit release can undo exactly
    // that; cleared on release and on layout reset.
    pub(crate) toggle_on: bool,
    pub(crate) held: Vec<u8, 6>,
    pub(crate) modifier_delta: tapdeck_types::modifier::HidModifiers,
}

impl ButtonDefinition {
    /// Current on/off state of a toggle button, for the UI's checked style.
    pub fn is_toggled(&self) -> bool {
        self.toggle_on
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineErrorKind {
    /// The digit run was not 0, 2 or 4 digits long.
    BadGridInfo,
    /// Missing or invalid font-size character.
    BadFontSize,
    /// No TAB between label and action string.
    MissingTab,
    /// Explicit placement outside the grid.
    OutOfBounds,
    /// Explicit placement over an occupied cell.
    Overlap,
    /// No free slot for an auto-placed button.
    NoSpace,
    /// The action string failed to compile.
    Action(ParseError),
    /// A bounded buffer (buttons, label parts, label text) ran out.
    Capacity,
}

/// A failed line: 1-based line number plus what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineError {
    pub line: u16,
    pub kind: LineErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The file was empty.
    MissingHeader,
    /// The first line did not parse as `<cols>x<rows>[ (<delay>)]`.
    InvalidHeader,
    /// Grid dimensions outside `1..=10`.
    InvalidDimensions { cols: u8, rows: u8 },
    /// One or more lines failed; the rest of the file was still checked.
    Invalid(Vec<LineError, MAX_LINE_ERRORS>),
}

/// A fully loaded layout. Owned by the UI glue; the state machine borrows
/// it through a `RefCell`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub cols: u8,
    pub rows: u8,
    /// Applied after every non-delay component of a running sequence.
    pub default_delay_ms: u32,
    pub buttons: Vec<ButtonDefinition, MAX_BUTTONS>,
}

impl Layout {
    /// Load a layout from an iterator of text lines.
    pub fn parse_lines<'a>(mut lines: impl Iterator<Item = &'a str>) -> Result<Self, LayoutError> {
        let header = lines.next().ok_or(LayoutError::MissingHeader)?;
        let (cols, rows, default_delay_ms) = parse_header(header)?;
        let mut grid =
            GridState::new(cols, rows).ok_or(LayoutError::InvalidDimensions { cols, rows })?;

        let mut layout = Layout {
            cols,
            rows,
            default_delay_ms,
            buttons: Vec::new(),
        };
        let mut errors: Vec<LineError, MAX_LINE_ERRORS> = Vec::new();
        let mut failed = false;

        for (idx, raw_line) in lines.enumerate() {
            let line_no = (idx + 2) as u16;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_button_line(line, &mut grid) {
                Ok(button) => {
                    if layout.buttons.push(button).is_err() {
                        error!("L{}: more than {} buttons", line_no, MAX_BUTTONS);
                        failed = true;
                        errors
                            .push(LineError { line: line_no, kind: LineErrorKind::Capacity })
                            .ok();
                    }
                }
                Err(kind) => {
                    error!("L{}: rejected line: {:?}", line_no, kind);
                    failed = true;
                    errors.push(LineError { line: line_no, kind }).ok();
                }
            }
        }

        if failed {
            Err(LayoutError::Invalid(errors))
        } else {
            info!(
                "layout loaded: {}x{} grid, {} buttons, default delay {} ms",
                cols,
                rows,
                layout.buttons.len(),
                default_delay_ms
            );
            Ok(layout)
        }
    }

    /// Load a layout from the raw file text.
    pub fn parse_str(text: &str) -> Result<Self, LayoutError> {
        Self::parse_lines(text.lines())
    }

    /// Clear every button's runtime state (toggle flags and stored
    /// press results). Used on the implicit reset before a navigation.
    pub(crate) fn reset_runtime_state(&mut self) {
        for button in &mut self.buttons {
            button.toggle_on = false;
            button.held.clear();
            button.modifier_delta = tapdeck_types::modifier::HidModifiers::new();
        }
    }
}

/// Parse `<cols>x<rows>[ (<delay_ms>)]`.
fn parse_header(line: &str) -> Result<(u8, u8, u32), LayoutError> {
    let line = line.trim();
    let x = line.find('x').ok_or(LayoutError::InvalidHeader)?;
    let cols: u8 = line[..x].parse().map_err(|_| LayoutError::InvalidHeader)?;
    let rest = &line[x + 1..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let rows: u8 = rest[..digits_end]
        .parse()
        .map_err(|_| LayoutError::InvalidHeader)?;

    let mut default_delay_ms = DEFAULT_ACTION_DELAY_MS;
    let tail = rest[digits_end..].trim();
    if !tail.is_empty() {
        match parse_header_delay(tail) {
            Some(delay) => default_delay_ms = delay,
            // Junk after the dimensions is tolerated, the delay just
            // stays at its default.
            None => warn!("ignoring malformed header suffix '{}'", tail),
        }
    }
    Ok((cols, rows, default_delay_ms))
}

fn parse_header_delay(tail: &str) -> Option<u32> {
    let inner = tail.strip_prefix('(')?.strip_suffix(')')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// Parse one body line and place its button on the grid.
fn parse_button_line(line: &str, grid: &mut GridState) -> Result<ButtonDefinition, LineErrorKind> {
    let mut rest = line;

    let kind = match rest.as_bytes().first() {
        Some(&b'T') => {
            rest = &rest[1..];
            ButtonKind::Toggle
        }
        Some(&b'G') => {
            rest = &rest[1..];
            ButtonKind::Navigation
        }
        _ => ButtonKind::Momentary,
    };

    // 0 digits: 1x1 auto. 2 digits: col_span,row_span auto. 4 digits:
    // col,row,col_span,row_span explicit. Each is a single digit.
    let digit_count = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    let digits = &rest.as_bytes()[..digit_count];
    rest = &rest[digit_count..];

    let (explicit, mut col, mut row, col_span, row_span) = match digit_count {
        0 => (false, 0, 0, 1, 1),
        2 => (false, 0, 0, digits[0] - b'0', digits[1] - b'0'),
        4 => (
            true,
            digits[0] - b'0',
            digits[1] - b'0',
            digits[2] - b'0',
            digits[3] - b'0',
        ),
        _ => return Err(LineErrorKind::BadGridInfo),
    };
    let col_span = col_span.max(1);
    let row_span = row_span.max(1);

    let font_size = rest
        .chars()
        .next()
        .and_then(FontSize::from_char)
        .ok_or(LineErrorKind::BadFontSize)?;
    rest = &rest[1..];

    let (label_text, action_text) = rest.split_once('\t').ok_or(LineErrorKind::MissingTab)?;
    let action_text = action_text.trim();

    if explicit {
        if col + col_span > grid.cols() || row + row_span > grid.rows() {
            return Err(LineErrorKind::OutOfBounds);
        }
        if !grid.occupy(row, col, row_span, col_span) {
            return Err(LineErrorKind::Overlap);
        }
    } else {
        let (r, c) = grid
            .find_first_fit(row_span, col_span)
            .ok_or(LineErrorKind::NoSpace)?;
        row = r;
        col = c;
    }

    let label = parse_label(label_text).map_err(|_| LineErrorKind::Capacity)?;

    let mut button = ButtonDefinition {
        kind,
        font_size,
        label,
        press_sequence: ActionSequence::new(),
        release_sequence: ActionSequence::new(),
        release_delay_ms: 0,
        navigation_target: None,
        col,
        row,
        col_span,
        row_span,
        toggle_on: false,
        held: Vec::new(),
        modifier_delta: tapdeck_types::modifier::HidModifiers::new(),
    };

    if kind == ButtonKind::Navigation {
        button.navigation_target =
            Some(parse_navigation_target(action_text).map_err(LineErrorKind::Action)?);
    } else {
        let parsed = parse_sequences(action_text).map_err(LineErrorKind::Action)?;
        button.press_sequence = parsed.press;
        button.release_sequence = parsed.release;
        button.release_delay_ms = parsed.release_delay_ms;
    }

    Ok(button)
}

/// Split a label into text and `$NAME` icon parts.
///
/// `$$` escapes a literal dollar, an unrecognized `$NAME` stays literal
/// text, and a run of two or more spaces becomes a line break.
fn parse_label(label: &str) -> Result<Vec<LabelPart, MAX_LABEL_PARTS>, ()> {
    let mut parts: Vec<LabelPart, MAX_LABEL_PARTS> = Vec::new();
    let mut text: String<LABEL_TEXT_MAX> = String::new();
    let mut rest = label;

    while let Some(c) = rest.chars().next() {
        if c == '$' {
            if rest.as_bytes().get(1) == Some(&b'$') {
                text.push('$').map_err(|_| ())?;
                rest = &rest[2..];
                continue;
            }
            if let Some(name) = longest_icon_match(&rest[1..]) {
                if !text.is_empty() {
                    parts.push(LabelPart::Text(text.clone())).map_err(|_| ())?;
                    text.clear();
                }
                parts.push(LabelPart::Icon(name)).map_err(|_| ())?;
                rest = &rest[1 + name.len()..];
                continue;
            }
            text.push('$').map_err(|_| ())?;
            rest = &rest[1..];
        } else if c == ' ' && rest.as_bytes().get(1) == Some(&b' ') {
            text.push('\n').map_err(|_| ())?;
            rest = rest.trim_start_matches(' ');
        } else {
            text.push(c).map_err(|_| ())?;
            rest = &rest[c.len_utf8()..];
        }
    }

    if !text.is_empty() {
        parts.push(LabelPart::Text(text)).map_err(|_| ())?;
    }
    Ok(parts)
}

fn longest_icon_match(after_dollar: &str) -> Option<&'static str> {
    let mut best: Option<&'static str> = None;
    for name in ICON_NAMES {
        if after_dollar.starts_with(name)
            && best.is_none_or(|b| name.len() > b.len())
        {
            best = Some(name);
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action::ActionComponent;
    use tapdeck_types::keycode::KC_PAGE_UP;

    fn text_part(s: &str) -> LabelPart {
        let mut t: String<LABEL_TEXT_MAX> = String::new();
        t.push_str(s).unwrap();
        LabelPart::Text(t)
    }

    #[test]
    fn loads_a_minimal_layout() {
        let cfg = "2x2 (10)\n11MA\t'a'\nT11MB\tLS\nG11Smenu\tmenu.cfg\n";
        let layout = Layout::parse_str(cfg).unwrap();
        assert_eq!((layout.cols, layout.rows), (2, 2));
        assert_eq!(layout.default_delay_ms, 10);
        assert_eq!(layout.buttons.len(), 3);
        assert_eq!(layout.buttons[0].kind, ButtonKind::Momentary);
        assert_eq!(layout.buttons[1].kind, ButtonKind::Toggle);
        assert_eq!(layout.buttons[2].kind, ButtonKind::Navigation);
        assert_eq!(
            layout.buttons[2].navigation_target.as_ref().unwrap().as_str(),
            "menu.cfg"
        );
    }

    #[test]
    fn header_without_delay_uses_the_default() {
        let layout = Layout::parse_str("3x3\n").unwrap();
        assert_eq!(layout.default_delay_ms, DEFAULT_ACTION_DELAY_MS);
    }

    #[test]
    fn malformed_header_delay_warns_and_falls_back() {
        let layout = Layout::parse_str("3x3 (abc)\n").unwrap();
        assert_eq!(layout.default_delay_ms, DEFAULT_ACTION_DELAY_MS);
    }

    #[test]
    fn dimensions_outside_range_fail_the_whole_load() {
        assert_eq!(
            Layout::parse_str("11x2\n").unwrap_err(),
            LayoutError::InvalidDimensions { cols: 11, rows: 2 }
        );
        assert_eq!(
            Layout::parse_str("4x0\n").unwrap_err(),
            LayoutError::InvalidDimensions { cols: 4, rows: 0 }
        );
        assert_eq!(Layout::parse_str("wat\n").unwrap_err(), LayoutError::InvalidHeader);
        assert_eq!(Layout::parse_str("").unwrap_err(), LayoutError::MissingHeader);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let cfg = "2x1\n\n# a comment\n  # indented comment\n11MA\t'a'\n";
        let layout = Layout::parse_str(cfg).unwrap();
        assert_eq!(layout.buttons.len(), 1);
    }

    #[test]
    fn auto_placement_follows_file_order_row_major() {
        let cfg = "3x2\n11MA\t'a'\n21MB\t'b'\n11MC\t'c'\n11MD\t'd'\n";
        let layout = Layout::parse_str(cfg).unwrap();
        let placed: std::vec::Vec<_> = layout
            .buttons
            .iter()
            .map(|b| (b.row, b.col, b.col_span))
            .collect();
        // A takes (0,0); B is 2 wide and lands at (0,1); C fills (1,0)
        // because row 0 is full; D follows at (1,1).
        assert_eq!(placed, vec![(0, 0, 1), (0, 1, 2), (1, 0, 1), (1, 1, 1)]);
    }

    #[test]
    fn explicit_placement_errors_accumulate_without_stopping_the_load() {
        let cfg = concat!(
            "2x2\n",
            "0011MA\t'a'\n",   // 4 digits: col 0, row 0, 1x1
            "0011MB\t'b'\n",   // overlaps A
            "3011MC\t'c'\n",   // out of bounds
            "11MD\t{OOPS\n",   // bad action string
            "11ME\t'e'\n",     // fine, still processed
        );
        let err = Layout::parse_str(cfg).unwrap_err();
        let LayoutError::Invalid(errors) = err else {
            panic!("expected line errors");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], LineError { line: 3, kind: LineErrorKind::Overlap });
        assert_eq!(errors[1], LineError { line: 4, kind: LineErrorKind::OutOfBounds });
        assert_eq!(
            errors[2],
            LineError { line: 5, kind: LineErrorKind::Action(ParseError::UnterminatedName) }
        );
    }

    #[test]
    fn missing_tab_and_font_size_are_line_errors() {
        let cfg = "2x2\n11MA 'a'\n11?B\t'b'\n";
        let LayoutError::Invalid(errors) = Layout::parse_str(cfg).unwrap_err() else {
            panic!("expected line errors");
        };
        assert_eq!(errors[0].kind, LineErrorKind::MissingTab);
        assert_eq!(errors[1].kind, LineErrorKind::BadFontSize);
    }

    #[test]
    fn zero_spans_clamp_to_one() {
        let layout = Layout::parse_str("2x2\n00MA\t'a'\n").unwrap();
        assert_eq!(layout.buttons[0].col_span, 1);
        assert_eq!(layout.buttons[0].row_span, 1);
    }

    #[test]
    fn span_less_line_defaults_to_1x1() {
        let layout = Layout::parse_str("2x2\nMA\t'a'\n").unwrap();
        assert_eq!((layout.buttons[0].col_span, layout.buttons[0].row_span), (1, 1));
    }

    #[test]
    fn grid_full_is_a_line_error() {
        let cfg = "1x1\n11MA\t'a'\n11MB\t'b'\n";
        let LayoutError::Invalid(errors) = Layout::parse_str(cfg).unwrap_err() else {
            panic!("expected line errors");
        };
        assert_eq!(errors[0], LineError { line: 3, kind: LineErrorKind::NoSpace });
    }

    #[test]
    fn navigation_action_is_validated_as_filename() {
        let cfg = "2x2\nG11MX\tbad name.cfg\n";
        let LayoutError::Invalid(errors) = Layout::parse_str(cfg).unwrap_err() else {
            panic!("expected line errors");
        };
        assert_eq!(
            errors[0].kind,
            LineErrorKind::Action(ParseError::InvalidFilename)
        );
    }

    #[test]
    fn button_sequences_are_compiled() {
        let layout = Layout::parse_str("2x2\n11MA\t{PGUP}|(100){PGUP}\n").unwrap();
        let b = &layout.buttons[0];
        assert_eq!(b.press_sequence.as_slice(), &[ActionComponent::SpecialKey(KC_PAGE_UP)]);
        assert_eq!(b.release_delay_ms, 100);
        assert_eq!(b.release_sequence.as_slice(), &[ActionComponent::SpecialKey(KC_PAGE_UP)]);
    }

    #[test]
    fn labels_tokenize_icons_escapes_and_line_breaks() {
        let layout = Layout::parse_str("2x2\n11MVol $UPLOAD\t'a'\n").unwrap();
        // $UPLOAD must win over the shorter $UP.
        assert_eq!(
            layout.buttons[0].label.as_slice(),
            &[text_part("Vol "), LabelPart::Icon("UPLOAD")]
        );

        let layout = Layout::parse_str("2x2\n11M$$5  off\t'a'\n").unwrap();
        assert_eq!(layout.buttons[0].label.as_slice(), &[text_part("$5\noff")]);

        let layout = Layout::parse_str("2x2\n11M$WAT\t'a'\n").unwrap();
        assert_eq!(layout.buttons[0].label.as_slice(), &[text_part("$WAT")]);
    }
}
