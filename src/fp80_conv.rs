//! The load/store conversion matrix of the 80-bit value type.
//!
//! One body per direction, instantiated per source or target width through
//! a layout descriptor carrying the format constants; the dispatchers are
//! thin wrappers that pick the descriptor.

use fp64_impl::fp64;
use fp80_impl::{
    fp80, FP80_EXPLICIT_ONE, FP80_EXPONENT_BIAS, FP80_EXPONENT_MASK, FP80_EXPONENT_MAX_BIASED,
    FP80_MANTISSA_MASK, FP80_SIGN_MASK, FP80_SIGN_SHIFT,
};
use {ControlWord, RoundingMode, StatusWord};

/// Field layout of a narrower (32- or 64-bit) IEEE format, expressed in the
/// bit positions of the raw integer image.
struct FpLayout {
    exponent_shift: u32,
    sign_shift: u32,
    exponent_bias: i32,
    exponent_max_biased: i32,
    exponent_mask: u64,
    mantissa_mask: u64,
}

const FP32_LAYOUT: FpLayout = FpLayout {
    exponent_shift: 23,
    sign_shift: 31,
    exponent_bias: 0x7f,
    exponent_max_biased: 0xff,
    exponent_mask: 0x7f80_0000,
    mantissa_mask: 0x007f_ffff,
};

const FP64_LAYOUT: FpLayout = FpLayout {
    exponent_shift: 52,
    sign_shift: 63,
    exponent_bias: 0x3ff,
    exponent_max_biased: 0x7ff,
    exponent_mask: 0x7ff0_0000_0000_0000,
    mantissa_mask: 0x000f_ffff_ffff_ffff,
};

/// Which rounding class `round_in_place` applied.
///
/// The discriminants are load-bearing: the store paths derive C1 and the
/// overflow/zero-saturation results from them arithmetically.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Rounded {
    Nearest = 0,
    TowardZero = 1,
    TowardInfHard = 2,
}

/// Applies rounding to the 63-bit mantissa value provided, given that its
/// lowest `bits` bits are about to be discarded. Handles carry into the
/// exponent and reports what sort of rounding was applied.
pub(crate) fn round_in_place(
    mantissa: &mut u64,
    exponent: &mut i32,
    sign: u8,
    rmode: RoundingMode,
    bits: u32,
) -> Rounded {
    debug_assert!(*mantissa & FP80_EXPLICIT_ONE == 0);
    debug_assert!(bits >= 1 && bits <= 63);

    let applied = match rmode {
        // add 1/2 so that midway values round up, unless the target LSB is
        // already even, in which case add 1/2 - 1
        RoundingMode::Nearest => {
            *mantissa += (1u64 << (bits - 1)) - ((!(*mantissa | FP80_EXPLICIT_ONE) >> bits) & 1);
            Rounded::Nearest
        }
        RoundingMode::Zero => Rounded::TowardZero,
        // directed rounding adds just less than 1 when it points away from
        // zero for this sign, and truncates otherwise
        RoundingMode::Down | RoundingMode::Up => {
            let toward_inf = match rmode {
                RoundingMode::Down => sign != 0,
                _ => sign == 0,
            };
            if toward_inf {
                *mantissa += (1u64 << bits) - 1;
                Rounded::TowardInfHard
            } else {
                Rounded::TowardZero
            }
        }
    };

    // if rounding overflowed into the integer bit, bump the exponent; the
    // overflow value is guaranteed less than (1 << bits), so clearing the
    // top bit is the whole renormalization
    if (*mantissa as i64) < 0 {
        *exponent += 1;
        *mantissa ^= FP80_EXPLICIT_ONE;
    }
    applied
}

/// x87 FLD for 64-bit or 32-bit floating-point sources.
///
/// Exceptions: #IA if the source is an SNaN, #D if it is denormal.
fn fld_common(sw: &mut StatusWord, raw: u64, layout: &FpLayout) -> fp80 {
    let exponent = ((raw & layout.exponent_mask) >> layout.exponent_shift) as i32;
    let mantissa = (raw & layout.mantissa_mask) << (63 - layout.exponent_shift);
    let sign_exponent =
        ((raw >> (layout.sign_shift - FP80_SIGN_SHIFT)) as u16) & FP80_SIGN_MASK;

    // infinite or NaN converts to the same, quieting NaNs
    if exponent == layout.exponent_max_biased {
        if mantissa < (FP80_MANTISSA_MASK + 1) >> 1 && mantissa != 0 {
            *sw |= StatusWord::IE;
        }
        let qnan_bit = if mantissa != 0 { 0x4000_0000_0000_0000 } else { 0 };
        return fp80::new(
            FP80_EXPLICIT_ONE | mantissa | qnan_bit,
            sign_exponent | FP80_EXPONENT_MASK,
        );
    }

    if exponent == 0 {
        // explicit zero: just the sign
        if mantissa == 0 {
            return fp80::new(0, sign_exponent);
        }

        // denormal: shift the mantissa up until the leading 1 reaches the
        // integer bit
        let shift = mantissa.leading_zeros() as i32;
        *sw |= StatusWord::DE;
        return fp80::new(
            mantissa << shift,
            sign_exponent | (FP80_EXPONENT_BIAS - layout.exponent_bias + 1 - shift) as u16,
        );
    }

    // normal: re-bias the exponent and set the explicit integer bit
    fp80::new(
        FP80_EXPLICIT_ONE | mantissa,
        sign_exponent | (FP80_EXPONENT_BIAS - layout.exponent_bias + exponent) as u16,
    )
}

/// Constructs an 80-bit value from a two's-complement integer.
/// Exceptions: none.
fn fild_common(raw: i64) -> fp80 {
    let (sign_exponent, magnitude) = if raw < 0 {
        (FP80_SIGN_MASK, (raw as u64).wrapping_neg())
    } else if raw == 0 {
        return fp80::ZERO;
    } else {
        (0, raw as u64)
    };

    let shift = magnitude.leading_zeros() as i32;
    fp80::new(
        magnitude << shift,
        sign_exponent + (FP80_EXPONENT_BIAS + 63 - shift) as u16,
    )
}

/// x87 FST for 64-bit or 32-bit floating-point targets.
///
/// Exceptions: #IA for SNaN sources, #U/#O when the value is out of the
/// target's range, #P (with the direction in C1) whenever bits are lost.
fn fst_common(cw: ControlWord, sw: &mut StatusWord, src: &fp80, layout: &FpLayout) -> u64 {
    let mantissa_shift = 63 - layout.exponent_shift;

    // extract the pieces: sign moved to its target position, the 63-bit
    // mantissa without the explicit 1, and the still-biased exponent
    let sign = u64::from(src.sign_exp & FP80_SIGN_MASK) << (layout.sign_shift - FP80_SIGN_SHIFT);
    let mut mantissa = src.mantissa & FP80_MANTISSA_MASK;
    let mut exponent = src.biased_exponent();

    // infinite or NaN: preserve payload bits for QNaNs, no rounding
    if exponent == FP80_EXPONENT_MAX_BIASED {
        if mantissa < (FP80_MANTISSA_MASK + 1) >> 1 && mantissa != 0 {
            *sw |= StatusWord::IE;
        }
        if mantissa != 0 {
            mantissa = ((layout.mantissa_mask + 1) >> 1) | (mantissa >> mantissa_shift);
        }
        return sign | layout.exponent_mask | mantissa;
    }

    // zero: just the sign with all-zero exponent and mantissa
    if exponent == 0 && mantissa == 0 {
        return sign;
    }

    // shift off extra mantissa bits, applying any rounding
    let orig_mantissa = mantissa;
    let applied = round_in_place(
        &mut mantissa,
        &mut exponent,
        (sign >> layout.sign_shift) as u8,
        cw.rounding(),
        mantissa_shift,
    );

    // adjust the exponent to the target bias
    exponent = exponent - FP80_EXPONENT_BIAS + layout.exponent_bias;

    // too small: convert to denormal or zero
    if exponent <= 0 {
        trace!("fst: denormal emission, exponent={}", exponent);
        if exponent <= -(layout.exponent_shift as i32) {
            // too small even for a denormal; when rounding hard toward
            // infinity the result is the smallest non-zero denormal, with
            // C1 recording the round-up
            mantissa = (applied as u64) >> 1;
            *sw |= StatusWord::UE
                | StatusWord::from_bits_truncate(
                    ((applied as u16) << (StatusWord::C1_BIT - 1)) & StatusWord::C1.bits(),
                );
        } else {
            mantissa = (mantissa | FP80_EXPLICIT_ONE) >> (mantissa_shift as i32 + 1 - exponent);

            // the shift can still wipe the whole mantissa; same saturation
            // rule as above
            if mantissa == 0 {
                mantissa = (applied as u64) >> 1;
                *sw |= StatusWord::from_bits_truncate(
                    ((applied as u16) << (StatusWord::C1_BIT - 1)) & StatusWord::C1.bits(),
                );
            }
        }

        *sw |= StatusWord::PE;
        return sign | mantissa;
    }

    // too large: infinity, or the maximum finite value when truncating
    if exponent >= layout.exponent_max_biased {
        trace!("fst: overflow, exponent={}", exponent);
        *sw |= StatusWord::OE
            | StatusWord::PE
            | StatusWord::from_bits_truncate(
                (!(applied as u16) << StatusWord::C1_BIT) & StatusWord::C1.bits(),
            );
        return (sign | layout.exponent_mask) - (applied as u64 & Rounded::TowardZero as u64);
    }

    // in range: flag any lost bits, recording in C1 whether the kept LSB
    // was rounded up
    if orig_mantissa & ((1u64 << mantissa_shift) - 1) != 0 {
        *sw |= StatusWord::PE
            | StatusWord::from_bits_truncate(
                (((orig_mantissa ^ mantissa) >> (mantissa_shift - StatusWord::C1_BIT)) as u16)
                    & StatusWord::C1.bits(),
            );
    }

    sign | ((exponent as u64) << layout.exponent_shift) | (mantissa >> mantissa_shift)
}

/// x87 FIST for 16/32/64-bit targets. `target_bits` selects the width.
///
/// Exceptions: #IA for NaN/Inf/out-of-range sources (the result is then the
/// target-width indefinite), #P with C1 when rounding changed the value.
fn fist_common(cw: ControlWord, sw: &mut StatusWord, src: &fp80, target_bits: u32) -> i64 {
    let indefinite = (0x8000_0000_0000_0000u64 as i64) >> (64 - target_bits);

    let mut exponent = src.biased_exponent();

    // infinite or NaN: indefinite
    if exponent == FP80_EXPONENT_MAX_BIASED {
        *sw |= StatusWord::IE;
        return indefinite;
    }

    let mut mantissa = src.mantissa & FP80_MANTISSA_MASK;

    if exponent == 0 && mantissa == 0 {
        return 0;
    }

    let mut shift = FP80_EXPONENT_BIAS + 63 - exponent;

    // too large: indefinite; `<` rather than `<=` so that the maximum
    // negative value survives to the sign check below
    if shift < 64 - target_bits as i32 {
        *sw |= StatusWord::IE;
        return indefinite;
    }

    // |value| < 1 never reaches the rounder
    if shift >= 64 {
        *sw |= StatusWord::PE;
        let negative = src.sign_exp & FP80_SIGN_MASK != 0;
        let one = match cw.rounding() {
            RoundingMode::Zero => false,
            // above (but not equal to) 0.5 rounds away from zero
            RoundingMode::Nearest => shift == 64 && mantissa != 0,
            RoundingMode::Down => negative,
            RoundingMode::Up => !negative,
        };
        if one {
            *sw |= StatusWord::C1;
            return if negative { -1 } else { 1 };
        }
        return 0;
    }

    let orig_mantissa = mantissa;
    let orig_shift = shift;

    // a zero-width tail needs no rounding (|value| is exactly 2^63)
    if shift > 0 {
        round_in_place(
            &mut mantissa,
            &mut exponent,
            (src.sign_exp >> FP80_SIGN_SHIFT) as u8,
            cw.rounding(),
            shift as u32,
        );
        // the exponent may have moved under the rounder
        shift = FP80_EXPONENT_BIAS + 63 - exponent;
    }

    let mut result = ((FP80_EXPLICIT_ONE | mantissa) >> shift) as i64;
    let negative = src.sign_exp & FP80_SIGN_MASK != 0;
    if negative {
        result = result.wrapping_neg();
    }

    // overflow of the destination width is indefinite; at 64 bits the
    // width check degenerates to a sign check, which accepts -2^63 and
    // rejects +2^63
    let overflow = if target_bits < 64 {
        (result << (64 - target_bits)) >> (64 - target_bits) != result
    } else {
        result != 0 && (result < 0) != negative
    };
    if overflow {
        trace!("fist: overflow of {}-bit target", target_bits);
        *sw |= StatusWord::IE;
        return indefinite;
    }

    // flag lost bits, with C1 tracking whether we rounded away
    if orig_mantissa & ((1u64 << orig_shift) - 1) != 0 {
        *sw |= StatusWord::PE
            | StatusWord::from_bits_truncate(
                (((((orig_mantissa | FP80_EXPLICIT_ONE) >> orig_shift) ^ result as u64) & 1)
                    as u16)
                    << StatusWord::C1_BIT,
            );
    }

    result
}

impl fp80 {
    /// x87 FLD for 80-bit sources: a pure copy. No flags.
    pub fn x87_fld80(src: [u8; 10]) -> fp80 {
        fp80::from_bytes(src)
    }

    /// x87 FLD for 64-bit floating-point sources.
    pub fn x87_fld64(sw: &mut StatusWord, src: f64) -> fp80 {
        fld_common(sw, src.to_bits(), &FP64_LAYOUT)
    }

    /// x87 FLD for 32-bit floating-point sources.
    pub fn x87_fld32(sw: &mut StatusWord, src: f32) -> fp80 {
        fld_common(sw, u64::from(src.to_bits()), &FP32_LAYOUT)
    }

    /// x87 FILD for 16-bit integers. Exact, no flags.
    pub fn x87_fild16(src: i16) -> fp80 {
        fild_common(i64::from(src))
    }

    /// x87 FILD for 32-bit integers. Exact, no flags.
    pub fn x87_fild32(src: i32) -> fp80 {
        fild_common(i64::from(src))
    }

    /// x87 FILD for 64-bit integers. Exact, no flags.
    pub fn x87_fild64(src: i64) -> fp80 {
        fild_common(src)
    }

    /// x87 FST for 80-bit targets: a pure copy. No flags.
    pub fn x87_fst80(&self) -> [u8; 10] {
        self.to_bytes()
    }

    /// x87 FST for 64-bit floating-point targets.
    pub fn x87_fst64(&self, cw: ControlWord, sw: &mut StatusWord) -> f64 {
        f64::from_bits(fst_common(cw, sw, self, &FP64_LAYOUT))
    }

    /// x87 FST for 32-bit floating-point targets.
    pub fn x87_fst32(&self, cw: ControlWord, sw: &mut StatusWord) -> f32 {
        f32::from_bits(fst_common(cw, sw, self, &FP32_LAYOUT) as u32)
    }

    /// x87 FIST for 16-bit targets.
    pub fn x87_fist16(&self, cw: ControlWord, sw: &mut StatusWord) -> i16 {
        fist_common(cw, sw, self, 16) as i16
    }

    /// x87 FIST for 32-bit targets.
    pub fn x87_fist32(&self, cw: ControlWord, sw: &mut StatusWord) -> i32 {
        fist_common(cw, sw, self, 32) as i32
    }

    /// x87 FIST for 64-bit targets.
    pub fn x87_fist64(&self, cw: ControlWord, sw: &mut StatusWord) -> i64 {
        fist_common(cw, sw, self, 64)
    }

    /// Converts to an `f64` under the given control word, discarding flags.
    pub fn to_f64(&self, cw: ControlWord) -> f64 {
        let mut sw = StatusWord::empty();
        self.x87_fst64(cw, &mut sw)
    }

    /// Converts to an `f32` under the given control word, discarding flags.
    pub fn to_f32(&self, cw: ControlWord) -> f32 {
        let mut sw = StatusWord::empty();
        self.x87_fst32(cw, &mut sw)
    }
}

// Lossless loading conveniences; flags are discarded, so use the x87_fld*
// entry points when the status word matters.

impl From<f32> for fp80 {
    fn from(v: f32) -> fp80 {
        let mut sw = StatusWord::empty();
        fp80::x87_fld32(&mut sw, v)
    }
}

impl From<f64> for fp80 {
    fn from(v: f64) -> fp80 {
        let mut sw = StatusWord::empty();
        fp80::x87_fld64(&mut sw, v)
    }
}

impl From<fp64> for fp80 {
    fn from(v: fp64) -> fp80 {
        fp80::from(v.as_f64())
    }
}

impl From<fp80> for fp64 {
    fn from(v: fp80) -> fp64 {
        fp64::new(v.to_f64(ControlWord::default()))
    }
}

impl From<i16> for fp80 {
    fn from(v: i16) -> fp80 {
        fp80::x87_fild16(v)
    }
}

impl From<i32> for fp80 {
    fn from(v: i32) -> fp80 {
        fp80::x87_fild32(v)
    }
}

impl From<i64> for fp80 {
    fn from(v: i64) -> fp80 {
        fp80::x87_fild64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store64(v: fp80, mode: RoundingMode) -> (u64, StatusWord) {
        let mut sw = StatusWord::empty();
        let out = v.x87_fst64(ControlWord::with_rounding(mode), &mut sw);
        (out.to_bits(), sw)
    }

    #[test]
    fn rounder_nearest_even() {
        // 0b0.11 with a 1-bit tail: ties round to the even LSB
        let mut mantissa = 0b11u64;
        let mut exponent = 100;
        round_in_place(&mut mantissa, &mut exponent, 0, RoundingMode::Nearest, 1);
        assert_eq!(mantissa >> 1, 0b10); // 1.5 ulp -> 2 ulp

        let mut mantissa = 0b01u64;
        let mut exponent = 100;
        round_in_place(&mut mantissa, &mut exponent, 0, RoundingMode::Nearest, 1);
        assert_eq!(mantissa >> 1, 0b0); // 0.5 ulp -> 0 (even)
    }

    #[test]
    fn rounder_carries_into_exponent() {
        let mut mantissa = FP80_MANTISSA_MASK; // all fraction bits set
        let mut exponent = 50;
        let applied = round_in_place(&mut mantissa, &mut exponent, 0, RoundingMode::Nearest, 11);
        assert_eq!(applied, Rounded::Nearest);
        assert_eq!(exponent, 51);
        assert_eq!(mantissa & FP80_EXPLICIT_ONE, 0);
    }

    #[test]
    fn rounder_directed_modes() {
        for &(mode, sign, hard) in &[
            (RoundingMode::Down, 0u8, false),
            (RoundingMode::Down, 1, true),
            (RoundingMode::Up, 0, true),
            (RoundingMode::Up, 1, false),
        ] {
            let mut mantissa = 1u64;
            let mut exponent = 0;
            let applied = round_in_place(&mut mantissa, &mut exponent, sign, mode, 4);
            assert_eq!(applied == Rounded::TowardInfHard, hard, "{:?}/{}", mode, sign);
        }
    }

    #[test]
    fn fld64_one() {
        let mut sw = StatusWord::empty();
        let v = fp80::x87_fld64(&mut sw, 1.0);
        assert_eq!(v, fp80::new(0x8000_0000_0000_0000, 0x3fff));
        assert!(sw.is_empty());
    }

    #[test]
    fn fld64_denormal_normalizes() {
        let mut sw = StatusWord::empty();
        let v = fp80::x87_fld64(&mut sw, f64::from_bits(1)); // 2^-1074
        assert!(sw.contains(StatusWord::DE));
        assert_eq!(v.mantissa, FP80_EXPLICIT_ONE);
        assert_eq!(v.exponent(), -1074);
    }

    #[test]
    fn fld64_snan_quiets() {
        let mut sw = StatusWord::empty();
        let v = fp80::x87_fld64(&mut sw, f64::from_bits(0x7ff0_0000_0000_0001));
        assert!(sw.contains(StatusWord::IE));
        assert!(v.is_qnan());
    }

    #[test]
    fn fst32_minus_one() {
        let mut sw = StatusWord::empty();
        let v = fp80::new(0x8000_0000_0000_0000, 0xbfff);
        let out = v.x87_fst32(ControlWord::default(), &mut sw);
        assert_eq!(out.to_bits(), 0xbf80_0000);
        assert!(sw.is_empty());
    }

    #[test]
    fn fst64_overflow_modes() {
        // largest finite fp80, way beyond f64 range
        let big = fp80::new(0xffff_ffff_ffff_ffff, 0x7ffe);
        let (bits, sw) = store64(big, RoundingMode::Nearest);
        assert_eq!(bits, 0x7ff0_0000_0000_0000);
        assert!(sw.contains(StatusWord::OE | StatusWord::PE | StatusWord::C1));

        let (bits, sw) = store64(big, RoundingMode::Zero);
        assert_eq!(bits, 0x7fef_ffff_ffff_ffff); // max finite when truncating
        assert!(sw.contains(StatusWord::OE | StatusWord::PE));
        assert!(!sw.contains(StatusWord::C1));

        let (bits, _) = store64(fp80::chs(&big), RoundingMode::Zero);
        assert_eq!(bits, 0xffef_ffff_ffff_ffff);
    }

    #[test]
    fn fst64_underflow_to_zero() {
        // 2^-16000: far below the smallest f64 denormal
        let tiny = fp80::new(FP80_EXPLICIT_ONE, (FP80_EXPONENT_BIAS - 16000) as u16);
        let (bits, sw) = store64(tiny, RoundingMode::Nearest);
        assert_eq!(bits, 0);
        assert!(sw.contains(StatusWord::UE | StatusWord::PE));

        // rounding up synthesizes the smallest denormal and sets C1
        let (bits, sw) = store64(tiny, RoundingMode::Up);
        assert_eq!(bits, 1);
        assert!(sw.contains(StatusWord::UE | StatusWord::PE | StatusWord::C1));
    }

    #[test]
    fn fst64_exact_denormal() {
        // 2^-1074 round-trips through the denormal path
        let mut sw = StatusWord::empty();
        let v = fp80::x87_fld64(&mut sw, f64::from_bits(1));
        let (bits, sw) = store64(v, RoundingMode::Nearest);
        assert_eq!(bits, 1);
        assert!(sw.contains(StatusWord::PE));
    }

    #[test]
    fn fild_extremes() {
        assert_eq!(fp80::x87_fild16(0), fp80::ZERO);
        assert_eq!(
            fp80::x87_fild64(i64::min_value()),
            fp80::new(FP80_EXPLICIT_ONE, 0x8000 | (FP80_EXPONENT_BIAS + 63) as u16)
        );
        assert_eq!(fp80::x87_fild32(1), fp80::ONE);
        assert_eq!(fp80::x87_fild16(-1), fp80::chs(&fp80::ONE));
    }

    #[test]
    fn fist_rounding_modes() {
        let v = fp80::from(7.5f64);
        let cases = [
            (RoundingMode::Nearest, 8),
            (RoundingMode::Zero, 7),
            (RoundingMode::Down, 7),
            (RoundingMode::Up, 8),
        ];
        for &(mode, expected) in &cases {
            let mut sw = StatusWord::empty();
            let out = v.x87_fist32(ControlWord::with_rounding(mode), &mut sw);
            assert_eq!(out, expected, "{:?}", mode);
            assert!(sw.contains(StatusWord::PE));
        }
    }

    #[test]
    fn fist_small_magnitudes() {
        let half = fp80::from(0.5f64);
        let mut sw = StatusWord::empty();
        assert_eq!(half.x87_fist32(ControlWord::default(), &mut sw), 0);
        assert!(sw.contains(StatusWord::PE));

        let mut sw = StatusWord::empty();
        let just_above = fp80::from(0.75f64);
        assert_eq!(just_above.x87_fist32(ControlWord::default(), &mut sw), 1);
        assert!(sw.contains(StatusWord::C1));

        let mut sw = StatusWord::empty();
        let neg = fp80::from(-0.25f64);
        assert_eq!(
            neg.x87_fist32(ControlWord::with_rounding(RoundingMode::Down), &mut sw),
            -1
        );
    }

    #[test]
    fn fist_boundary_values() {
        let mut sw = StatusWord::empty();
        let min64 = fp80::x87_fild64(i64::min_value());
        assert_eq!(min64.x87_fist64(ControlWord::default(), &mut sw), i64::min_value());
        assert!(sw.is_empty());

        // +2^63 does not fit
        let mut sw = StatusWord::empty();
        let too_big = fp80::abs(&min64);
        assert_eq!(
            too_big.x87_fist64(ControlWord::default(), &mut sw),
            i64::min_value()
        );
        assert!(sw.contains(StatusWord::IE));

        let mut sw = StatusWord::empty();
        assert_eq!(
            fp80::from(40000.0f64).x87_fist16(ControlWord::default(), &mut sw),
            i16::min_value()
        );
        assert!(sw.contains(StatusWord::IE));
    }

    #[test]
    fn fist_nan_inf_indefinite() {
        for v in &[fp80::NAN, fp80::INFINITY, fp80::NEG_INFINITY] {
            let mut sw = StatusWord::empty();
            assert_eq!(v.x87_fist32(ControlWord::default(), &mut sw), i32::min_value());
            assert!(sw.contains(StatusWord::IE));
        }
    }
}
