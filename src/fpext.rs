//! Extended-precision scratch values for the transcendental kernels.
//!
//! These are "exploded" floating-point values with a 64-bit mantissa
//! (`fpext64`) or a 64-bit mantissa plus a 32-bit extension (`fpext96`), a
//! wide signed exponent and a separated sign. They have two hard
//! limitations, which is why they never escape this crate:
//!
//! * Denormals are not representable; the enormous exponent range stands
//!   in for them. Incoming denormals are renormalized, and collapsing back
//!   to `fp64`/`fp80` re-creates denormals as needed.
//!
//! * NaNs and infinities are not representable; kernels filter them out
//!   before doing scratch arithmetic. Infinities can be *produced* when
//!   collapsing a huge value back to `fp64`/`fp80`.
//!
//! The invariant everywhere: a value is either zero (mantissa and
//! extension zero, exponent pinned to `EXPONENT_MIN`) or its mantissa has
//! the explicit leading 1 in bit 63.
//!
//! `fpext64` is much faster and is what the kernels use by default;
//! `fpext96` buys 32 extra mantissa bits for the places that need them.
//! A third flavor, `fpext52`, is a plain host double behind the same
//! construction surface: it exists for the one kernel whose accuracy
//! profile was tuned at exactly 53 bits (`fptan`).

use bits::mul_64x64;
use fp64_impl::{fp64, FP64_EXPONENT_BIAS, FP64_EXPONENT_MAX_BIASED, FP64_EXPONENT_SHIFT,
           FP64_EXPONENT_MASK, FP64_MANTISSA_MASK, FP64_SIGN_SHIFT};
use fp80_impl::{fp80, FP80_EXPONENT_BIAS, FP80_EXPONENT_MASK, FP80_EXPONENT_MAX_BIASED,
           FP80_SIGN_SHIFT};
use std::ops;

/// Exponent assigned to zero values; far below anything reachable.
pub(crate) const EXPONENT_MIN: i32 = -10_000_000;
/// The explicit integer bit of a normalized mantissa.
pub(crate) const EXPLICIT_ONE: u64 = 0x8000_0000_0000_0000;

/// Scratch value with a 64-bit mantissa.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct fpext64 {
    mantissa: u64,
    exponent: i32,
    sign: u8,
}

/// Scratch value with a 64-bit mantissa and a 32-bit extension below it.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct fpext96 {
    mantissa: u64,
    extend: u32,
    exponent: i32,
    sign: u8,
}

impl fpext64 {
    pub const ZERO: fpext64 = fpext64::from_parts(0, 0, EXPONENT_MIN, 0);
    pub const ONE: fpext64 = fpext64::from_parts(EXPLICIT_ONE, 0, 0, 0);
    pub const NEG_ONE: fpext64 = fpext64::from_parts(EXPLICIT_ONE, 0, 0, 1);
    /// `pi/2`.
    pub const PIO2: fpext64 = fpext64::from_parts(0xc90f_daa2_2168_c234, 0xc000_0000, 0, 0);
    /// `pi/4`.
    pub const PIO4: fpext64 = fpext64::from_parts(0xc90f_daa2_2168_c234, 0xc000_0000, -1, 0);
    /// `ln(2)`.
    pub const LN2: fpext64 = fpext64::from_parts(0xb172_17f7_d1cf_79ab, 0xc9e3_b398, -1, 0);

    /// Builds a value from a 96-bit mantissa image; the extension's top bit
    /// rounds into the 64-bit mantissa. Constants are written this way so
    /// the same table text serves both widths.
    #[inline]
    pub const fn from_parts(high: u64, low: u32, exponent: i32, sign: u8) -> fpext64 {
        fpext64 {
            mantissa: high.wrapping_add((low >> 31) as u64),
            exponent,
            sign,
        }
    }

    /// Explodes an `fp64`. The source must not be NaN or infinite;
    /// denormals and zeros are renormalized.
    pub fn from_fp64(src: fp64) -> fpext64 {
        debug_assert!(!src.is_max_exp());
        let mut value = fpext64 {
            mantissa: src.mantissa() << (63 - FP64_EXPONENT_SHIFT),
            exponent: src.exponent(),
            sign: src.sign(),
        };
        if value.exponent != -FP64_EXPONENT_BIAS {
            value.mantissa |= EXPLICIT_ONE;
        } else {
            value.exponent += 1;
            value.normalize();
        }
        value
    }

    /// Explodes an `fp80`. The source must not be NaN or infinite;
    /// denormals and zeros are renormalized.
    pub fn from_fp80(src: &fp80) -> fpext64 {
        debug_assert!(!src.is_max_exp());
        let mut value = fpext64 {
            mantissa: src.mantissa(),
            exponent: i32::from(src.sign_exp() & FP80_EXPONENT_MASK) - FP80_EXPONENT_BIAS,
            sign: src.sign(),
        };
        if (value.mantissa as i64) >= 0 {
            value.exponent += 1;
            value.normalize();
        }
        value
    }

    /// Narrows an `fpext96`, optionally rounding on the dropped extension's
    /// top bit.
    pub fn from_wide(src: &fpext96, round: bool) -> fpext64 {
        let mut value = fpext64 {
            mantissa: src.mantissa,
            exponent: src.exponent,
            sign: src.sign,
        };
        if round && src.extend & 0x8000_0000 != 0 {
            value.round_mantissa_up();
        }
        value
    }

    /// Collapses to an `fp64`, truncating extra mantissa bits and creating
    /// denormals, zeros or infinities as the exponent demands.
    pub fn as_fp64(&self) -> fp64 {
        let result = u64::from(self.sign) << FP64_SIGN_SHIFT;
        let exp = self.exponent + FP64_EXPONENT_BIAS;

        if exp >= FP64_EXPONENT_MAX_BIASED {
            fp64::from_bits(result | FP64_EXPONENT_MASK)
        } else if exp > 0 {
            fp64::from_bits(
                result
                    | ((exp as u64) << FP64_EXPONENT_SHIFT)
                    | ((self.mantissa >> (63 - FP64_EXPONENT_SHIFT)) & FP64_MANTISSA_MASK),
            )
        } else if exp > -(FP64_EXPONENT_SHIFT as i32) {
            fp64::from_bits(result | (self.mantissa >> (64 - FP64_EXPONENT_SHIFT as i32 - exp)))
        } else {
            fp64::from_bits(result)
        }
    }

    #[inline]
    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    #[inline]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    #[inline]
    pub fn sign(&self) -> u8 {
        self.sign
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn abs(&mut self) -> &mut fpext64 {
        self.sign = 0;
        self
    }

    pub fn chs(&mut self) -> &mut fpext64 {
        self.sign ^= 1;
        self
    }

    /// Adds `dexp` to the exponent; the mantissa is untouched.
    pub fn ldexp(a: &fpext64, dexp: i32) -> fpext64 {
        let mut result = *a;
        result.exponent += dexp;
        result
    }

    /// Increments the mantissa, overflowing into the exponent.
    fn round_mantissa_up(&mut self) {
        self.mantissa = self.mantissa.wrapping_add(1);
        if self.mantissa == 0 {
            self.mantissa = EXPLICIT_ONE;
            self.exponent += 1;
        }
    }

    /// Re-establishes the explicit-one invariant after a subtraction or a
    /// denormal load.
    fn normalize(&mut self) {
        if self.mantissa == 0 {
            self.exponent = EXPONENT_MIN;
            return;
        }
        let shift = self.mantissa.leading_zeros();
        if shift != 0 {
            self.mantissa <<= shift;
            self.exponent -= shift as i32;
        }
        debug_assert!(self.mantissa & EXPLICIT_ONE != 0);
    }

    /// Magnitude sum, `a` holding the larger exponent; `src2shift` is the
    /// exponent difference. A round bit is carried in from the shifted-out
    /// tail.
    fn add_values(a: &fpext64, b: &fpext64, src2shift: i32) -> fpext64 {
        if src2shift >= 64 {
            return *a;
        }
        let mut src2m = b.mantissa >> src2shift;
        if src2shift != 0 && b.mantissa & (1u64 << (src2shift - 1)) != 0 {
            src2m += 1;
        }

        let mut result = fpext64 {
            mantissa: a.mantissa.wrapping_add(src2m),
            exponent: a.exponent,
            sign: 0,
        };
        if result.mantissa < src2m {
            result.mantissa = (result.mantissa >> 1) | EXPLICIT_ONE;
            result.exponent += 1;
        }
        result
    }

    /// Magnitude difference, `a` holding the not-smaller magnitude.
    fn sub_values(a: &fpext64, b: &fpext64, src2shift: i32) -> fpext64 {
        if src2shift >= 64 {
            return *a;
        }
        let mut src2m = b.mantissa >> src2shift;
        if src2shift != 0 && b.mantissa & (1u64 << (src2shift - 1)) != 0 {
            src2m += 1;
        }

        let mut result = fpext64 {
            mantissa: a.mantissa.wrapping_sub(src2m),
            exponent: a.exponent,
            sign: 0,
        };
        result.normalize();
        result
    }

    fn add_or_sub(a: &fpext64, b: &fpext64, subtract: bool) -> fpext64 {
        let b_sign = b.sign ^ (subtract as u8);
        let dexp = a.exponent - b.exponent;

        let mut result;
        if a.sign == b_sign {
            result = if dexp >= 0 {
                fpext64::add_values(a, b, dexp)
            } else {
                fpext64::add_values(b, a, -dexp)
            };
            result.sign = a.sign;
        } else if dexp > 0 || (dexp == 0 && a.mantissa >= b.mantissa) {
            result = fpext64::sub_values(a, b, dexp);
            result.sign = a.sign;
        } else {
            result = fpext64::sub_values(b, a, -dexp);
            result.sign = b_sign;
        }

        debug_assert!(result.is_zero() || result.mantissa & EXPLICIT_ONE != 0);
        result
    }

    fn multiply(a: &fpext64, b: &fpext64) -> fpext64 {
        let sign = a.sign ^ b.sign;
        if a.is_zero() || b.is_zero() {
            let mut zero = fpext64::ZERO;
            zero.sign = sign;
            return zero;
        }

        let (lo, hi) = mul_64x64(a.mantissa, b.mantissa);
        let mut result = fpext64 {
            mantissa: 0,
            exponent: a.exponent + b.exponent,
            sign,
        };

        // normalize the 128-bit product to the top 64 bits, carrying a
        // round bit up from the dropped tail
        if hi & EXPLICIT_ONE == 0 {
            result.mantissa = ((hi << 1) | (lo >> 63)).wrapping_add((lo >> 62) & 1);
        } else {
            result.mantissa = hi.wrapping_add((lo >> 63) & 1);
            result.exponent += 1;
        }

        debug_assert!(result.mantissa & EXPLICIT_ONE != 0);
        result
    }

    /// Quotient computed through host doubles; fine for the rational
    /// polynomial tails that need it, not a full-precision divide.
    pub fn div64(&self, b: &fpext64) -> fpext64 {
        fpext64::from_fp64(fp64::new(self.as_fp64().as_f64() / b.as_fp64().as_f64()))
    }

    /// Largest integer not greater than `a`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn floor(a: &fpext64) -> fpext64 {
        let exp = a.exponent;

        if a.sign == 0 {
            // below 1.0 floors to 0
            if exp < 0 {
                return fpext64::ZERO;
            }
            if exp <= 63 {
                let mantissa_mask = !((1u64 << (63 - exp)) - 1);
                return fpext64 {
                    mantissa: a.mantissa & mantissa_mask,
                    exponent: exp,
                    sign: 0,
                };
            }
            *a
        } else {
            // above -1.0 floors to -1
            if exp < 0 {
                return fpext64::NEG_ONE;
            }
            if exp <= 63 {
                // add one-minus-epsilon below the integer boundary, then
                // mask; a carry out means the value was an exact power of
                // two away from the next exponent
                let mantissa_mask = !((1u64 << (63 - exp)) - 1);
                let mantissa_sum = a.mantissa.wrapping_add(!mantissa_mask);
                if mantissa_sum < a.mantissa {
                    return fpext64 {
                        mantissa: EXPLICIT_ONE,
                        exponent: exp + 1,
                        sign: 1,
                    };
                }
                return fpext64 {
                    mantissa: mantissa_sum & mantissa_mask,
                    exponent: exp,
                    sign: 1,
                };
            }
            *a
        }
    }

    /// Floor of |a|, also yielding the low integer bits that were masked
    /// off. The trig reduction uses those as its quadrant index.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn floor_abs_loint(a: &fpext64) -> (fpext64, u64) {
        debug_assert!(a.exponent < 63);
        if a.exponent < 0 {
            return (fpext64::ZERO, 0);
        }

        let shift = 63 - a.exponent;
        let mantissa_mask = !((1u64 << shift) - 1);
        (
            fpext64 {
                mantissa: a.mantissa & mantissa_mask,
                exponent: a.exponent,
                sign: 0,
            },
            a.mantissa >> shift,
        )
    }
}

impl ops::Add for fpext64 {
    type Output = fpext64;
    fn add(self, rhs: fpext64) -> fpext64 {
        fpext64::add_or_sub(&self, &rhs, false)
    }
}

impl ops::Sub for fpext64 {
    type Output = fpext64;
    fn sub(self, rhs: fpext64) -> fpext64 {
        fpext64::add_or_sub(&self, &rhs, true)
    }
}

impl ops::Mul for fpext64 {
    type Output = fpext64;
    fn mul(self, rhs: fpext64) -> fpext64 {
        fpext64::multiply(&self, &rhs)
    }
}

impl ops::AddAssign for fpext64 {
    fn add_assign(&mut self, rhs: fpext64) {
        *self = fpext64::add_or_sub(self, &rhs, false);
    }
}

impl ops::SubAssign for fpext64 {
    fn sub_assign(&mut self, rhs: fpext64) {
        *self = fpext64::add_or_sub(self, &rhs, true);
    }
}

impl ops::MulAssign for fpext64 {
    fn mul_assign(&mut self, rhs: fpext64) {
        *self = fpext64::multiply(self, &rhs);
    }
}

impl fpext96 {
    pub const ZERO: fpext96 = fpext96::from_parts(0, 0, EXPONENT_MIN, 0);
    pub const NEG_ONE: fpext96 = fpext96::from_parts(EXPLICIT_ONE, 0, 0, 1);
    /// `ln(2)`.
    pub const LN2: fpext96 = fpext96::from_parts(0xb172_17f7_d1cf_79ab, 0xc9e3_b398, -1, 0);

    /// Builds a value from its raw 96-bit mantissa image.
    #[inline]
    pub const fn from_parts(high: u64, low: u32, exponent: i32, sign: u8) -> fpext96 {
        fpext96 {
            mantissa: high,
            extend: low,
            exponent,
            sign,
        }
    }

    /// Explodes an `fp80`. The source must not be NaN or infinite;
    /// denormals and zeros are renormalized.
    pub fn from_fp80(src: &fp80) -> fpext96 {
        debug_assert!(!src.is_max_exp());
        let mut value = fpext96 {
            mantissa: src.mantissa(),
            extend: 0,
            exponent: i32::from(src.sign_exp() & FP80_EXPONENT_MASK) - FP80_EXPONENT_BIAS,
            sign: src.sign(),
        };
        if (value.mantissa as i64) >= 0 {
            value.exponent += 1;
            value.normalize();
        }
        value
    }

    /// Collapses to an `fp80`, truncating the extension and creating
    /// denormals, zeros or infinities as the exponent demands.
    pub fn as_fp80(&self) -> fp80 {
        let sign_exp = u16::from(self.sign) << FP80_SIGN_SHIFT;
        let exp = self.exponent + FP80_EXPONENT_BIAS;

        if exp >= FP80_EXPONENT_MAX_BIASED {
            fp80::new(0, sign_exp | FP80_EXPONENT_MASK)
        } else if exp > 0 {
            fp80::new(self.mantissa, sign_exp | exp as u16)
        } else if exp > -63 {
            fp80::new(self.mantissa >> (1 - exp), sign_exp)
        } else {
            fp80::new(0, sign_exp)
        }
    }

    #[cfg(test)]
    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    #[cfg(test)]
    pub fn extend(&self) -> u32 {
        self.extend
    }

    #[cfg(test)]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0 && self.extend == 0
    }

    /// Increments the mantissa, overflowing into the exponent.
    fn round_mantissa_up(&mut self) {
        self.mantissa = self.mantissa.wrapping_add(1);
        if self.mantissa == 0 {
            self.mantissa = EXPLICIT_ONE;
            self.exponent += 1;
        }
    }

    /// Increments the extension, overflowing into the mantissa.
    fn round_extend_up(&mut self) {
        self.extend = self.extend.wrapping_add(1);
        if self.extend == 0 {
            self.round_mantissa_up();
        }
    }

    /// Shifts the whole 96-bit mantissa image right.
    fn shift_mantissa_right(&mut self, count: u32) {
        if count < 32 {
            self.extend = (self.extend >> count) | ((self.mantissa << (32 - count)) as u32);
            self.mantissa >>= count;
        } else {
            self.extend = (self.mantissa >> (count - 32)) as u32;
            self.mantissa = if count < 64 {
                self.mantissa >> count
            } else {
                EXPLICIT_ONE
            };
        }
    }

    /// Re-establishes the explicit-one invariant.
    fn normalize(&mut self) {
        if self.is_zero() {
            self.exponent = EXPONENT_MIN;
        } else if self.mantissa != 0 {
            let shift = self.mantissa.leading_zeros();
            if shift == 0 {
                return;
            }
            self.mantissa <<= shift;
            self.exponent -= shift as i32;
            if shift < 32 {
                self.mantissa |= u64::from(self.extend >> (32 - shift));
                self.extend <<= shift;
            } else {
                self.mantissa |= u64::from(self.extend) << (shift - 32);
                self.extend = 0;
            }
        } else {
            // only the extension holds bits; move them all the way up
            let shift = u64::from(self.extend).leading_zeros();
            self.mantissa = u64::from(self.extend) << shift;
            self.extend = 0;
            self.exponent -= shift as i32 + 32;
        }
        debug_assert!(self.is_zero() || self.mantissa & EXPLICIT_ONE != 0);
    }

    /// Shifts `b`'s 96-bit image right by `src2shift` with a carried round
    /// bit, returning the shifted (mantissa, extension) pair.
    fn shifted_operand(b: &fpext96, src2shift: i32) -> (u64, u32) {
        if src2shift == 0 {
            return (b.mantissa, b.extend);
        }
        let mut src2m;
        let mut src2e;
        if src2shift < 32 {
            src2e = (b.extend >> src2shift) | ((b.mantissa << (32 - src2shift)) as u32);
            src2m = b.mantissa >> src2shift;
            if b.extend & (1u32 << (src2shift - 1)) != 0 {
                src2e = src2e.wrapping_add(1);
                if src2e == 0 {
                    src2m += 1;
                }
            }
        } else {
            src2e = (b.mantissa >> (src2shift - 32)) as u32;
            src2m = if src2shift < 64 {
                b.mantissa >> src2shift
            } else {
                0
            };
            if src2shift != 32 && b.mantissa & (1u64 << (src2shift - 33)) != 0 {
                src2e = src2e.wrapping_add(1);
                if src2e == 0 {
                    src2m += 1;
                }
            }
        }
        (src2m, src2e)
    }

    fn add_values(a: &fpext96, b: &fpext96, src2shift: i32) -> fpext96 {
        if src2shift >= 96 {
            return *a;
        }
        let (src2m, src2e) = fpext96::shifted_operand(b, src2shift);

        let mut result = fpext96 {
            mantissa: a.mantissa.wrapping_add(src2m),
            extend: a.extend.wrapping_add(src2e),
            exponent: a.exponent,
            sign: 0,
        };
        let carry = result.mantissa < src2m;
        if result.extend < src2e {
            result.round_mantissa_up();
        }
        if carry {
            result.shift_mantissa_right(1);
            result.mantissa |= EXPLICIT_ONE;
            result.exponent += 1;
        }
        result
    }

    fn sub_values(a: &fpext96, b: &fpext96, src2shift: i32) -> fpext96 {
        if src2shift >= 96 {
            return *a;
        }
        let (src2m, src2e) = fpext96::shifted_operand(b, src2shift);

        let mut result = fpext96 {
            mantissa: a.mantissa.wrapping_sub(src2m),
            extend: a.extend.wrapping_sub(src2e),
            exponent: a.exponent,
            sign: 0,
        };
        if result.extend > a.extend {
            result.mantissa = result.mantissa.wrapping_sub(1);
        }
        result.normalize();
        result
    }

    fn mantissa_lt(&self, other: &fpext96) -> bool {
        self.mantissa < other.mantissa
            || (self.mantissa == other.mantissa && self.extend < other.extend)
    }

    fn add_or_sub(a: &fpext96, b: &fpext96, subtract: bool) -> fpext96 {
        let b_sign = b.sign ^ (subtract as u8);
        let dexp = a.exponent - b.exponent;

        let mut result;
        if a.sign == b_sign {
            result = if dexp >= 0 {
                fpext96::add_values(a, b, dexp)
            } else {
                fpext96::add_values(b, a, -dexp)
            };
            result.sign = a.sign;
        } else if dexp > 0 || (dexp == 0 && !a.mantissa_lt(b)) {
            result = fpext96::sub_values(a, b, dexp);
            result.sign = a.sign;
        } else {
            result = fpext96::sub_values(b, a, -dexp);
            result.sign = b_sign;
        }

        debug_assert!(result.is_zero() || result.mantissa & EXPLICIT_ONE != 0);
        result
    }

    fn multiply(a: &fpext96, b: &fpext96) -> fpext96 {
        let sign = a.sign ^ b.sign;
        if a.is_zero() || b.is_zero() {
            let mut zero = fpext96::ZERO;
            zero.sign = sign;
            return zero;
        }

        // 96x96 product via the 64x64 high part and the three cross terms,
        // all aligned so `hi:lo` ends up a 2.126 fixed-point value
        let (mut lo, mut hi) = mul_64x64(a.mantissa, b.mantissa);
        let (lo1, hi1) = mul_64x64(a.mantissa, u64::from(b.extend));
        let (lo2, hi2) = mul_64x64(b.mantissa, u64::from(a.extend));

        let mut hiadd = hi1 + hi2;
        let loadd = lo1.wrapping_add(lo2);
        if loadd < lo2 {
            hiadd += 1;
        }

        let lo3 = (u64::from(a.extend) * u64::from(b.extend)) >> 32;
        let loadd = loadd.wrapping_add(lo3);
        if loadd < lo3 {
            hiadd += 1;
        }

        let loadd = (loadd >> 32) | (hiadd << 32);
        hiadd >>= 32;

        lo = lo.wrapping_add(loadd);
        if lo < loadd {
            hi += 1;
        }
        hi += hiadd;

        let mut result = fpext96 {
            mantissa: 0,
            extend: 0,
            exponent: a.exponent + b.exponent,
            sign,
        };
        if hi & EXPLICIT_ONE == 0 {
            result.mantissa = (hi << 1) | (lo >> 63);
            result.extend = (lo >> 31) as u32;
            if lo & (1u64 << 30) != 0 {
                result.round_extend_up();
            }
        } else {
            result.mantissa = hi;
            result.extend = (lo >> 32) as u32;
            result.exponent += 1;
            if lo & (1u64 << 31) != 0 {
                result.round_extend_up();
            }
        }

        debug_assert!(result.mantissa & EXPLICIT_ONE != 0);
        result
    }

    /// Largest integer not greater than `a`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn floor(a: &fpext96) -> fpext96 {
        let exp = a.exponent;

        let masks = |exp: i32| {
            let shift = 95 - exp;
            let extend_mask: u32 = if shift < 32 { !((1u32 << shift) - 1) } else { 0 };
            let mantissa_mask: u64 = if shift > 32 {
                !((1u64 << (shift - 32)) - 1)
            } else {
                !0
            };
            (mantissa_mask, extend_mask)
        };

        if a.sign == 0 {
            if exp < 0 {
                return fpext96::ZERO;
            }
            if exp <= 95 {
                let (mantissa_mask, extend_mask) = masks(exp);
                return fpext96 {
                    mantissa: a.mantissa & mantissa_mask,
                    extend: a.extend & extend_mask,
                    exponent: exp,
                    sign: 0,
                };
            }
            *a
        } else {
            if exp < 0 {
                return fpext96::NEG_ONE;
            }
            if exp <= 95 {
                let (mantissa_mask, extend_mask) = masks(exp);
                let extend_sum = a.extend.wrapping_add(!extend_mask);
                let mantissa_sum = a
                    .mantissa
                    .wrapping_add(!mantissa_mask)
                    .wrapping_add((extend_sum < a.extend) as u64);
                if mantissa_sum < a.mantissa {
                    // carried past the masked bits: the floor is the exact
                    // next power of two down
                    return fpext96 {
                        mantissa: EXPLICIT_ONE,
                        extend: 0,
                        exponent: exp + 1,
                        sign: 1,
                    };
                }
                return fpext96 {
                    mantissa: mantissa_sum & mantissa_mask,
                    extend: extend_sum & extend_mask,
                    exponent: exp,
                    sign: 1,
                };
            }
            *a
        }
    }

    /// Floor of |a| plus the low integer bits that were masked off.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn floor_abs_loint(a: &fpext96) -> (fpext96, u64) {
        debug_assert!(a.exponent < 63);
        if a.exponent < 0 {
            return (fpext96::ZERO, 0);
        }

        // the exponent cap keeps the boundary inside the mantissa word
        let shift = 95 - a.exponent - 32;
        let mantissa_mask = !((1u64 << shift) - 1);
        (
            fpext96 {
                mantissa: a.mantissa & mantissa_mask,
                extend: 0,
                exponent: a.exponent,
                sign: 0,
            },
            a.mantissa >> shift,
        )
    }
}

impl From<fpext64> for fpext96 {
    fn from(src: fpext64) -> fpext96 {
        fpext96 {
            mantissa: src.mantissa,
            extend: 0,
            exponent: src.exponent,
            sign: src.sign,
        }
    }
}

/// Scratch value carried as a plain host double.
///
/// Arithmetic is the native IEEE operators, so there are only 53
/// significand bits; what this flavor offers is the same
/// `(mantissa, extension, exponent, sign)` construction surface as the
/// wide flavors, with the mantissa rounding into the double on the way
/// in. `fptan` evaluates in this width.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone)]
pub(crate) struct fpext52(fp64);

impl fpext52 {
    /// Builds a value from the shared 96-bit constant shape. Mantissa bit
    /// 10 rounds into the kept 53 bits; the extension word sits entirely
    /// below this flavor's precision and is ignored.
    pub fn from_parts(high: u64, _low: u32, exponent: i32, sign: u8) -> fpext52 {
        let exp = exponent + FP64_EXPONENT_BIAS;
        let mut bits = u64::from(sign) << FP64_SIGN_SHIFT;
        if exp >= FP64_EXPONENT_MAX_BIASED {
            bits |= FP64_EXPONENT_MASK;
        } else if exp > 0 {
            bits |= ((exp as u64) << FP64_EXPONENT_SHIFT)
                | ((high >> (63 - FP64_EXPONENT_SHIFT)) & FP64_MANTISSA_MASK);
            bits = bits.wrapping_add((high >> (62 - FP64_EXPONENT_SHIFT)) & 1);
        } else if exp > -(FP64_EXPONENT_SHIFT as i32) {
            let shift = 64 - FP64_EXPONENT_SHIFT as i32 - exp;
            bits |= high >> shift;
            bits = bits.wrapping_add((high >> (shift - 1)) & 1);
        }
        fpext52(fp64::from_bits(bits))
    }

    pub fn as_fp64(&self) -> fp64 {
        self.0
    }

    pub fn exponent(&self) -> i32 {
        self.0.exponent()
    }
}

impl ops::Add for fpext52 {
    type Output = fpext52;
    fn add(self, rhs: fpext52) -> fpext52 {
        fpext52(self.0 + rhs.0)
    }
}

impl ops::Mul for fpext52 {
    type Output = fpext52;
    fn mul(self, rhs: fpext52) -> fpext52 {
        fpext52(self.0 * rhs.0)
    }
}

impl ops::Add for fpext96 {
    type Output = fpext96;
    fn add(self, rhs: fpext96) -> fpext96 {
        fpext96::add_or_sub(&self, &rhs, false)
    }
}

impl ops::Sub for fpext96 {
    type Output = fpext96;
    fn sub(self, rhs: fpext96) -> fpext96 {
        fpext96::add_or_sub(&self, &rhs, true)
    }
}

impl ops::Mul for fpext96 {
    type Output = fpext96;
    fn mul(self, rhs: fpext96) -> fpext96 {
        fpext96::multiply(&self, &rhs)
    }
}

impl ops::AddAssign for fpext96 {
    fn add_assign(&mut self, rhs: fpext96) {
        *self = fpext96::add_or_sub(self, &rhs, false);
    }
}

impl ops::MulAssign for fpext96 {
    fn mul_assign(&mut self, rhs: fpext96) {
        *self = fpext96::multiply(self, &rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext64(v: f64) -> fpext64 {
        fpext64::from_fp64(fp64::new(v))
    }

    fn back(v: fpext64) -> f64 {
        v.as_fp64().as_f64()
    }

    #[test]
    fn fp64_roundtrip() {
        for &v in &[0.0, 1.0, -1.0, 1.5, -2.75, 0.1, 1e300, -1e-300] {
            assert_eq!(back(ext64(v)), v, "{}", v);
        }
    }

    #[test]
    fn denormal_renormalizes() {
        let tiny = fpext64::from_fp64(fp64::from_bits(1)); // 2^-1074
        assert_eq!(tiny.mantissa(), EXPLICIT_ONE);
        assert_eq!(tiny.exponent(), -1074);
        assert_eq!(back(tiny).to_bits(), 1);
    }

    #[test]
    fn zero_has_min_exponent() {
        let zero = ext64(0.0);
        assert!(zero.is_zero());
        assert_eq!(zero.exponent(), EXPONENT_MIN);
    }

    #[test]
    fn collapse_extremes() {
        let mut huge = ext64(1.0);
        huge = fpext64::ldexp(&huge, 5000);
        assert!(huge.as_fp64().is_pinf());

        let mut small = ext64(1.0);
        small = fpext64::ldexp(&small, -1060); // lands in the denormal range
        assert_eq!(back(small), 2.0f64.powi(-1060));

        small = fpext64::ldexp(&small, -100);
        assert!(small.as_fp64().is_zero());
    }

    #[test]
    fn add_sub_exact() {
        assert_eq!(back(ext64(1.5) + ext64(0.25)), 1.75);
        assert_eq!(back(ext64(1.0) - ext64(2.0)), -1.0);
        assert_eq!(back(ext64(-1.5) + ext64(-2.5)), -4.0);
        assert_eq!(back(ext64(3.0) - ext64(0.5)), 2.5);

        let cancel = ext64(1.0) - ext64(1.0);
        assert!(cancel.is_zero());
        assert_eq!(cancel.exponent(), EXPONENT_MIN);
    }

    #[test]
    fn add_zero_operands() {
        assert_eq!(back(ext64(0.0) + ext64(2.5)), 2.5);
        assert_eq!(back(ext64(2.5) + ext64(0.0)), 2.5);
        assert!((ext64(0.0) + ext64(0.0)).is_zero());
    }

    #[test]
    fn mul_exact() {
        assert_eq!(back(ext64(1.5) * ext64(2.5)), 3.75);
        assert_eq!(back(ext64(-0.5) * ext64(0.5)), -0.25);
        assert!((ext64(0.0) * ext64(12.0)).is_zero());
        // product below 2.0 normalizes with a shift
        assert_eq!(back(ext64(1.25) * ext64(1.25)), 1.5625);
    }

    #[test]
    fn floor64_cases() {
        assert_eq!(back(fpext64::floor(&ext64(2.75))), 2.0);
        assert_eq!(back(fpext64::floor(&ext64(0.3))), 0.0);
        assert_eq!(back(fpext64::floor(&ext64(-0.3))), -1.0);
        assert_eq!(back(fpext64::floor(&ext64(-2.75))), -3.0);
        assert_eq!(back(fpext64::floor(&ext64(-2.0))), -2.0);
        // carry into the exponent
        assert_eq!(back(fpext64::floor(&ext64(-1.5))), -2.0);
        assert_eq!(back(fpext64::floor(&ext64(1e18))), 1e18);
    }

    #[test]
    fn floor_abs_loint64() {
        let (f, bits) = fpext64::floor_abs_loint(&ext64(5.75));
        assert_eq!(back(f), 5.0);
        assert_eq!(bits, 5);

        let (f, bits) = fpext64::floor_abs_loint(&ext64(0.75));
        assert!(f.is_zero());
        assert_eq!(bits, 0);
    }

    #[test]
    fn div64_simple() {
        assert_eq!(back(ext64(3.0).div64(&ext64(2.0))), 1.5);
    }

    #[test]
    fn widen_narrow() {
        let wide = fpext96::from(ext64(1.5));
        assert_eq!(wide.extend(), 0);
        assert_eq!(fpext64::from_wide(&wide, false), ext64(1.5));

        // narrowing rounds on the extension's top bit
        let wide = fpext96::from_parts(EXPLICIT_ONE, 0x8000_0000, 0, 0);
        let narrow = fpext64::from_wide(&wide, true);
        assert_eq!(narrow.mantissa(), EXPLICIT_ONE + 1);

        // and carries through an all-ones mantissa
        let wide = fpext96::from_parts(!0, 0x8000_0000, 0, 0);
        let narrow = fpext64::from_wide(&wide, true);
        assert_eq!(narrow.mantissa(), EXPLICIT_ONE);
        assert_eq!(narrow.exponent(), 1);
    }

    #[test]
    fn fp80_roundtrip() {
        let v = fp80::from(2.5f64);
        let ext = fpext96::from_fp80(&v);
        assert_eq!(ext.mantissa(), 0xa000_0000_0000_0000);
        assert_eq!(ext.exponent(), 1);
        assert_eq!(ext.as_fp80(), v);
    }

    #[test]
    fn fp80_denormal_roundtrip() {
        let denorm = fp80::new(0x0000_0000_0000_0400, 0x0000);
        let ext = fpext96::from_fp80(&denorm);
        assert_eq!(ext.mantissa(), EXPLICIT_ONE);
        assert_eq!(ext.as_fp80(), denorm);
    }

    #[test]
    fn ext96_add_sub() {
        let a = fpext96::from(ext64(1.5));
        let b = fpext96::from(ext64(0.25));
        assert_eq!((a + b).mantissa(), 0xe000_0000_0000_0000);
        assert_eq!((a - b).mantissa(), 0xa000_0000_0000_0000);

        // extension participates in the alignment shift
        let small = fpext96::from_parts(EXPLICIT_ONE, 0, -70, 0);
        let sum = a + small;
        assert_eq!(sum.mantissa(), 0xc000_0000_0000_0000);
        assert_ne!(sum.extend(), 0);
    }

    #[test]
    fn ext96_cancellation_normalizes_from_extension() {
        // 1 + 2^-80 minus 1 leaves only extension bits
        let a = fpext96::from_parts(EXPLICIT_ONE, 1 << 15, 0, 0);
        let b = fpext96::from(fpext64::ONE);
        let diff = a - b;
        assert!(!diff.is_zero());
        assert_eq!(diff.mantissa() & EXPLICIT_ONE, EXPLICIT_ONE);
        assert_eq!(diff.exponent(), -80);
    }

    #[test]
    fn ext96_mul_cross_terms() {
        // (1 + 2^-64)^2 = 1 + 2^-63 + 2^-128; the middle bit lands in the
        // mantissa LSB
        let a = fpext96::from_parts(EXPLICIT_ONE, 0x8000_0000, 0, 0);
        let sq = a * a;
        assert_eq!(sq.mantissa(), EXPLICIT_ONE | 1);
        assert_eq!(sq.extend(), 0);
        assert_eq!(sq.exponent(), 0);

        let x = fpext96::from(ext64(1.5));
        let y = fpext96::from(ext64(2.5));
        assert_eq!((x * y).mantissa(), 0xf000_0000_0000_0000);
        assert_eq!((x * y).exponent(), 1);
    }

    #[test]
    fn floor96_cases() {
        let as_f = |v: fpext96| fpext64::from_wide(&v, false).as_fp64().as_f64();
        let of = |v: f64| fpext96::from(ext64(v));
        assert_eq!(as_f(fpext96::floor(&of(2.75))), 2.0);
        assert_eq!(as_f(fpext96::floor(&of(-2.75))), -3.0);
        assert_eq!(as_f(fpext96::floor(&of(-1.5))), -2.0);
        assert_eq!(as_f(fpext96::floor(&of(0.9))), 0.0);
        assert_eq!(as_f(fpext96::floor(&of(-0.9))), -1.0);
    }

    #[test]
    fn floor_abs_loint96() {
        let (f, bits) = fpext96::floor_abs_loint(&fpext96::from(ext64(11.5)));
        assert_eq!(fpext64::from_wide(&f, false).as_fp64().as_f64(), 11.0);
        assert_eq!(bits, 11);
    }

    #[test]
    fn ext52_construction_rounds() {
        // pi/4 from the shared constant shape lands on the f64 value
        let v = fpext52::from_parts(0xc90f_daa2_2168_c234, 0xc000_0000, -1, 0);
        assert_eq!(v.as_fp64().as_f64(), ::std::f64::consts::FRAC_PI_4);
        assert_eq!(v.exponent(), -1);

        // an all-ones mantissa rounds up through the exponent
        let v = fpext52::from_parts(!0, 0, 0, 0);
        assert_eq!(v.as_fp64().as_f64(), 2.0);

        // exact halves need no rounding, signs carry through
        let v = fpext52::from_parts(0x8000_0000_0000_0000, 0, -1, 1);
        assert_eq!(v.as_fp64().as_f64(), -0.5);

        // zero comes through the sign-only default path
        let v = fpext52::from_parts(0, 0, EXPONENT_MIN, 0);
        assert_eq!(v.as_fp64().to_bits(), 0);
    }

    #[test]
    fn ext52_operators() {
        let a = fpext52::from_parts(0xc000_0000_0000_0000, 0, 0, 0); // 1.5
        let b = fpext52::from_parts(0xa000_0000_0000_0000, 0, 1, 0); // 2.5
        assert_eq!((a + b).as_fp64().as_f64(), 4.0);
        assert_eq!((a * b).as_fp64().as_f64(), 3.75);
    }
}
