use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use bitfield_struct::bitfield;
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Modifier bits of a HID keyboard report, LSB first.
///
/// | bit7 | bit6 | bit5 | bit4 | bit3 | bit2 | bit1 | bit0 |
/// | ---- | ---- | ---- | ---- | ---- | ---- | ---- | ---- |
/// | RGUI | RALT | RSHF | RCTL | LGUI | LALT | LSHF | LCTL |
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Serialize, Deserialize, MaxSize, Eq, PartialEq)]
pub struct HidModifiers {
    #[bits(1)]
    pub left_ctrl: bool,
    #[bits(1)]
    pub left_shift: bool,
    #[bits(1)]
    pub left_alt: bool,
    #[bits(1)]
    pub left_gui: bool,
    #[bits(1)]
    pub right_ctrl: bool,
    #[bits(1)]
    pub right_shift: bool,
    #[bits(1)]
    pub right_alt: bool,
    #[bits(1)]
    pub right_gui: bool,
}

impl BitOr for HidModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

impl BitAnd for HidModifiers {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() & rhs.into_bits())
    }
}

impl Not for HidModifiers {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::from_bits(!self.into_bits())
    }
}

impl BitOrAssign for HidModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl BitAndAssign for HidModifiers {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

pub const LEFT_CTRL: HidModifiers = HidModifiers::new().with_left_ctrl(true);
pub const LEFT_SHIFT: HidModifiers = HidModifiers::new().with_left_shift(true);
pub const LEFT_ALT: HidModifiers = HidModifiers::new().with_left_alt(true);
pub const LEFT_GUI: HidModifiers = HidModifiers::new().with_left_gui(true);
pub const RIGHT_CTRL: HidModifiers = HidModifiers::new().with_right_ctrl(true);
pub const RIGHT_SHIFT: HidModifiers = HidModifiers::new().with_right_shift(true);
pub const RIGHT_ALT: HidModifiers = HidModifiers::new().with_right_alt(true);
pub const RIGHT_GUI: HidModifiers = HidModifiers::new().with_right_gui(true);

impl HidModifiers {
    /// No modifier bit is set.
    pub const fn is_empty(self) -> bool {
        self.into_bits() == 0
    }

    /// Either shift bit is set.
    pub const fn any_shift(self) -> bool {
        self.into_bits() & (LEFT_SHIFT.into_bits() | RIGHT_SHIFT.into_bits()) != 0
    }
}
