//! Round-trip and host-comparison tests for the conversion matrix.

extern crate softx87;
#[macro_use]
extern crate proptest;

use softx87::{fp80, ControlWord, RoundingMode, StatusWord};

const MODES: [RoundingMode; 4] = [
    RoundingMode::Nearest,
    RoundingMode::Down,
    RoundingMode::Up,
    RoundingMode::Zero,
];

proptest! {
    #[test]
    fn fld80_fst80_roundtrip(bytes: [u8; 10]) {
        let f = fp80::x87_fld80(bytes);
        prop_assert_eq!(f.x87_fst80(), bytes);
    }
}

proptest! {
    /// Loading any f64 and storing it back is the identity, except that
    /// SNaNs come back quiet (with the invalid flag raised by the load).
    #[test]
    fn fld64_fst64_roundtrip(bits: u64) {
        let value = f64::from_bits(bits);
        let mut load_sw = StatusWord::empty();
        let f = fp80::x87_fld64(&mut load_sw, value);

        let exponent_all_ones = bits & 0x7ff0_0000_0000_0000 == 0x7ff0_0000_0000_0000;
        let mantissa = bits & 0x000f_ffff_ffff_ffff;
        let snan = exponent_all_ones && mantissa != 0 && mantissa < 0x0008_0000_0000_0000;

        for &mode in &MODES {
            let mut sw = StatusWord::empty();
            let back = f.x87_fst64(ControlWord::with_rounding(mode), &mut sw);
            if snan {
                prop_assert_eq!(back.to_bits(), bits | 0x0008_0000_0000_0000);
            } else {
                prop_assert_eq!(back.to_bits(), bits);
            }
        }
        prop_assert_eq!(load_sw.contains(StatusWord::IE), snan);
    }
}

proptest! {
    #[test]
    fn fld32_fst32_roundtrip(bits: u32) {
        let value = f32::from_bits(bits);
        let mut load_sw = StatusWord::empty();
        let f = fp80::x87_fld32(&mut load_sw, value);

        let exponent_all_ones = bits & 0x7f80_0000 == 0x7f80_0000;
        let mantissa = bits & 0x007f_ffff;
        let snan = exponent_all_ones && mantissa != 0 && mantissa < 0x0040_0000;

        for &mode in &MODES {
            let mut sw = StatusWord::empty();
            let back = f.x87_fst32(ControlWord::with_rounding(mode), &mut sw);
            if snan {
                prop_assert_eq!(back.to_bits(), bits | 0x0040_0000);
            } else {
                prop_assert_eq!(back.to_bits(), bits);
            }
        }
        prop_assert_eq!(load_sw.contains(StatusWord::IE), snan);
    }
}

proptest! {
    /// Every integer survives fild/fist under every rounding mode, exactly
    /// and without flags.
    #[test]
    fn fild64_fist64_roundtrip(v: i64) {
        for &mode in &MODES {
            let mut sw = StatusWord::empty();
            let f = fp80::x87_fild64(v);
            prop_assert_eq!(f.x87_fist64(ControlWord::with_rounding(mode), &mut sw), v);
            prop_assert!(sw.is_empty());
        }
    }
}

proptest! {
    #[test]
    fn fild32_fist32_roundtrip(v: i32) {
        for &mode in &MODES {
            let mut sw = StatusWord::empty();
            let f = fp80::x87_fild32(v);
            prop_assert_eq!(f.x87_fist32(ControlWord::with_rounding(mode), &mut sw), v);
            prop_assert!(sw.is_empty());
        }
    }
}

proptest! {
    #[test]
    fn fild16_fist16_roundtrip(v: i16) {
        for &mode in &MODES {
            let mut sw = StatusWord::empty();
            let f = fp80::x87_fild16(v);
            prop_assert_eq!(f.x87_fist16(ControlWord::with_rounding(mode), &mut sw), v);
            prop_assert!(sw.is_empty());
        }
    }
}

proptest! {
    /// With round-toward-zero, fist agrees with the host's truncating
    /// float-to-int conversion for everything in range.
    #[test]
    fn fist64_matches_host_truncation(bits: u64) {
        let v = f64::from_bits(bits);
        prop_assume!(v.is_finite() && v.abs() < 9.0e18);

        let mut sw = StatusWord::empty();
        let f = fp80::x87_fld64(&mut sw, v);
        let mut sw = StatusWord::empty();
        let out = f.x87_fist64(ControlWord::with_rounding(RoundingMode::Zero), &mut sw);
        prop_assert_eq!(out, v as i64);
    }
}

proptest! {
    /// Narrowing through the 80-bit store matches the host's f64-to-f32
    /// conversion wherever the result is normal, zero or infinite. (The
    /// denormal range is excluded: the x87 store rounds those differently
    /// from a host cast.)
    #[test]
    fn fst32_matches_host_narrowing(bits: u64) {
        let v = f64::from_bits(bits);
        prop_assume!(v.is_finite());
        let direct = v as f32;
        prop_assume!(
            v == 0.0 || direct.is_infinite()
                || f64::from(direct.abs()) >= f64::from(std::f32::MIN_POSITIVE)
        );

        let mut sw = StatusWord::empty();
        let f = fp80::x87_fld64(&mut sw, v);
        let mut sw = StatusWord::empty();
        let out = f.x87_fst32(ControlWord::default(), &mut sw);
        prop_assert_eq!(out.to_bits(), direct.to_bits());
    }
}

/// Loading 1.0 is exact and flag-free, independent of the
/// control word (loads never consult it).
#[test]
fn fld64_one_is_canonical() {
    let mut sw = StatusWord::empty();
    let f = fp80::x87_fld64(&mut sw, 1.0);
    assert_eq!(f.to_bytes(), fp80::new(0x8000_0000_0000_0000, 0x3fff).to_bytes());
    assert!(sw.is_empty());
}

/// Storing -1.0 as f32 gives exactly 0xBF800000.
#[test]
fn fst32_minus_one_is_canonical() {
    let mut sw = StatusWord::empty();
    let f = fp80::new(0x8000_0000_0000_0000, 0xbfff);
    for &mode in &MODES {
        let out = f.x87_fst32(ControlWord::with_rounding(mode), &mut sw);
        assert_eq!(out.to_bits(), 0xbf80_0000);
    }
    assert!(sw.is_empty());
}

/// A directed sweep over the f64 exponent boundary region: every value
/// with a one-bit mantissa near the denormal threshold round-trips.
#[test]
fn fld64_fst64_boundary_sweep() {
    for exp in 0..8u64 {
        for bit in 0..52u64 {
            for &sign in &[0u64, 1 << 63] {
                let bits = sign | (exp << 52) | (1 << bit);
                let mut sw = StatusWord::empty();
                let f = fp80::x87_fld64(&mut sw, f64::from_bits(bits));
                let mut sw = StatusWord::empty();
                let back = f.x87_fst64(ControlWord::default(), &mut sw);
                assert_eq!(back.to_bits(), bits, "bits {:#018X}", bits);
            }
        }
    }
}

/// Conversions through the `From` ladder agree with the explicit loads.
#[test]
fn from_ladder() {
    assert_eq!(fp80::from(1.0f64), fp80::new(0x8000_0000_0000_0000, 0x3fff));
    assert_eq!(fp80::from(1.0f32), fp80::from(1i32));
    assert_eq!(fp80::from(-42i16), fp80::from(-42.0f64));
    assert_eq!(fp80::from(1i64 << 40), fp80::from(1099511627776.0f64));
}
