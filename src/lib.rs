//! Software emulation of the x87 floating point instruction set.
//!
//! This crate implements the arithmetic core of an x87 FPU emulator: the
//! 80-bit extended value type with its full load/store/conversion matrix,
//! a 64-bit fast-path value type, and the transcendental instruction
//! kernels (`fxtract`, `fscale`, `fprem`/`fprem1`, `f2xm1`,
//! `fyl2x`/`fyl2xp1`, `fsin`/`fcos`/`fsincos`/`fptan`, `fpatan`).
//!
//! Loads, stores and integer conversions are bit-exact against a real x87;
//! the transcendentals agree to within 1-2 ULP on the hard cases. The
//! register stack, tag word and exception trap delivery are left to the
//! embedding opcode dispatcher: every operation here takes a control word,
//! returns its result values, and ORs the exceptions it raised into a
//! status word. The host is assumed to use IEEE 754 binary64 arithmetic
//! and little-endian memory order.

#![warn(missing_debug_implementations)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;
extern crate ieee754;

mod bits;
#[path = "fp64.rs"]
mod fp64_impl;
mod fp64_trans;
#[path = "fp80.rs"]
mod fp80_impl;
mod fp80_conv;
mod fp80_trans;
mod fpext;
mod fpround;

pub use fp64_impl::fp64;
pub use fp80_impl::fp80;
pub use fpround::RoundGuard;

/// The different rounding modes supported by the x87.
///
/// The discriminants match the 2-bit `RC` field of the control word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round results to the nearest representable number. If both
    /// surrounding numbers have the same distance, round to the even
    /// number ("ties to even").
    Nearest = 0b00,
    /// Round towards `-Inf`.
    Down = 0b01,
    /// Round towards `+Inf`.
    Up = 0b10,
    /// Round towards 0 (truncate).
    Zero = 0b11,
}

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::Nearest
    }
}

/// The precision settings encodable in the control word's `PC` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    /// 24-bit significand (32-bit values).
    Single,
    /// 53-bit significand (64-bit values).
    Double,
    /// 64-bit significand (80-bit values) - the reset default.
    Extended,
}

bitflags! {
    /// The x87 status word.
    ///
    /// Bits 0-5 are the exception flags; every operation in this crate ORs
    /// the exceptions it raised into the caller's status word and never
    /// clears anything. C0-C3 carry per-instruction condition codes. The
    /// `TOP` field belongs to the register stack machine and is never
    /// written by this crate.
    pub struct StatusWord: u16 {
        /// FPU busy.
        const BUSY = 1 << 15;
        /// Condition code C3.
        const C3 = 1 << 14;
        /// `TOP` value mask (not modeled here; masked off by callers).
        const TOP = 0b0011_1000_0000_0000;
        /// Condition code C2 (incomplete reduction / out-of-range trig).
        const C2 = 1 << 10;
        /// Condition code C1 (rounding direction; quotient bit 0 for
        /// `fprem`/`fprem1`).
        const C1 = 1 << 9;
        /// Condition code C0.
        const C0 = 1 << 8;
        /// Exception summary: set iff an unmasked exception was generated.
        const ES = 1 << 7;
        /// Stack fault (raised by the register stack machine, not here).
        const SF = 1 << 6;
        /// Precision (inexact result) exception.
        const PE = 1 << 5;
        /// Numeric underflow exception.
        const UE = 1 << 4;
        /// Numeric overflow exception.
        const OE = 1 << 3;
        /// Zero divide exception.
        const ZE = 1 << 2;
        /// Denormalized operand exception.
        const DE = 1 << 1;
        /// Invalid operation exception.
        const IE = 1 << 0;
    }
}

impl StatusWord {
    /// Bit position of C0.
    pub(crate) const C0_BIT: u32 = 8;
    /// Bit position of C1.
    pub(crate) const C1_BIT: u32 = 9;
    /// Bit position of C3.
    pub(crate) const C3_BIT: u32 = 14;
}

impl Default for StatusWord {
    fn default() -> Self {
        StatusWord::empty()
    }
}

bitflags! {
    /// The x87 control word.
    ///
    /// Only the rounding field is consulted by the conversion code; the
    /// exception masks exist for the embedding dispatcher to decide whether
    /// a raised flag becomes a fault.
    pub struct ControlWord: u16 {
        /// Infinity control. Ignored by everything after the 80287.
        const X = 1 << 12;
        /// Rounding control field.
        ///
        /// * `0b00`: round to nearest (even) - default value.
        /// * `0b01`: round down (towards `-Inf`).
        /// * `0b10`: round up (towards `+Inf`).
        /// * `0b11`: round toward zero (truncate).
        const RC = 0b0000_1100_0000_0000;
        /// Precision control field.
        ///
        /// * `0b00`: single precision.
        /// * `0b01`: reserved.
        /// * `0b10`: double precision.
        /// * `0b11`: extended precision - default value.
        const PC = 0b0000_0011_0000_0000;
        /// Bit 6 is reserved but initializes to 1.
        const RESERVED_6 = 1 << 6;
        /// Precision exception mask.
        const PM = 1 << 5;
        /// Numeric underflow exception mask.
        const UM = 1 << 4;
        /// Numeric overflow exception mask.
        const OM = 1 << 3;
        /// Zero divide exception mask.
        const ZM = 1 << 2;
        /// Denormalized operand exception mask.
        const DM = 1 << 1;
        /// Invalid operation exception mask.
        const IM = 1 << 0;
        /// All exception mask bits.
        const EXCEPTION_MASKS = 0b0011_1111;
    }
}

impl ControlWord {
    const ROUNDING_SHIFT: u32 = 10;
    const PRECISION_SHIFT: u32 = 8;

    /// Decodes the rounding control field.
    pub fn rounding(&self) -> RoundingMode {
        match (self.bits() >> Self::ROUNDING_SHIFT) & 0b11 {
            0b00 => RoundingMode::Nearest,
            0b01 => RoundingMode::Down,
            0b10 => RoundingMode::Up,
            _ => RoundingMode::Zero,
        }
    }

    /// Decodes the precision control field.
    ///
    /// The reserved encoding `0b01` decodes as `Extended`, which is what
    /// actual silicon does with it.
    pub fn precision(&self) -> Precision {
        match (self.bits() >> Self::PRECISION_SHIFT) & 0b11 {
            0b00 => Precision::Single,
            0b10 => Precision::Double,
            _ => Precision::Extended,
        }
    }

    /// Builds a control word with the given rounding mode and everything
    /// else at its reset value.
    pub fn with_rounding(mode: RoundingMode) -> ControlWord {
        let bits = (ControlWord::default().bits() & !ControlWord::RC.bits())
            | ((mode as u16) << Self::ROUNDING_SHIFT);
        ControlWord::from_bits_truncate(bits)
    }
}

/// The reset state of the control word masks all exceptions, sets the
/// rounding mode to "round to nearest (even)" and the precision to 64 bits
/// (yielding the full 80 bit values).
impl Default for ControlWord {
    fn default() -> Self {
        ControlWord::from_bits_truncate(0x037F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_word_reset() {
        let cw = ControlWord::default();
        assert_eq!(cw.rounding(), RoundingMode::Nearest);
        assert_eq!(cw.precision(), Precision::Extended);
        assert!(cw.contains(ControlWord::EXCEPTION_MASKS));
    }

    #[test]
    fn control_word_rounding_field() {
        for &mode in &[
            RoundingMode::Nearest,
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::Zero,
        ] {
            assert_eq!(ControlWord::with_rounding(mode).rounding(), mode);
        }
    }

    #[test]
    fn status_word_layout() {
        assert_eq!(StatusWord::C0.bits(), 1 << StatusWord::C0_BIT);
        assert_eq!(StatusWord::C1.bits(), 1 << StatusWord::C1_BIT);
        assert_eq!(StatusWord::C3.bits(), 1 << StatusWord::C3_BIT);
        assert_eq!(StatusWord::TOP.bits(), 0x3800);
    }
}
