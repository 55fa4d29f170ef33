//! The transcendental instruction kernels, operating on `fp64`.
//!
//! Each kernel does its own special-value dispatch, domain reduction and
//! polynomial evaluation, carrying intermediates in the `fpext` scratch
//! types where 53 bits are not enough. The algorithms follow the usual
//! softfloat/fdlibm/Cephes shapes for the respective operations; the trig
//! reduction uses the same 66-bit approximation of pi that the hardware
//! documents, so reduced arguments agree with a real FPU bit for bit even
//! next to multiples of pi/2.

use bits::mul_64x64;
use fp64_impl::{fp64, FP64_EXPONENT_BIAS, FP64_EXPONENT_MAX_BIASED, FP64_EXPONENT_SHIFT,
           FP64_MANTISSA_MASK, FP64_SIGN_SHIFT};
use fpext::{fpext52, fpext64};
use std::ops;
use StatusWord;

/// The indefinite result plus the invalid-operation flag.
fn indef(flags: StatusWord) -> (fp64, StatusWord) {
    (fp64::indefinite(), flags | StatusWord::IE)
}

/// Quiets a NaN, raising the invalid flag when it was signaling.
fn qnan_one(flags: StatusWord, src: fp64) -> (fp64, StatusWord) {
    debug_assert!(src.is_nan());
    let mut flags = flags;
    if src.is_snan() {
        flags |= StatusWord::IE;
    }
    (fp64::make_qnan(src), flags)
}

/// NaN propagation for two-operand kernels: invalid if *either* source is
/// signaling, and when both are NaNs the one with the larger payload wins
/// (src1's sign breaking the tie).
fn qnan_two(flags: StatusWord, src1: fp64, src2: fp64) -> (fp64, StatusWord) {
    debug_assert!(src1.is_nan());
    let mut flags = flags;
    if src1.is_snan() || src2.is_snan() {
        flags |= StatusWord::IE;
    }
    let mut dst = fp64::make_qnan(src1);
    if src2.is_nan() {
        let man1 = src1.mantissa() & 0x0007_ffff_ffff_ffff;
        let man2 = src2.mantissa() & 0x0007_ffff_ffff_ffff;
        if man2 > man1 || (man2 == man1 && src1.sign() != 0) {
            dst = fp64::make_qnan(src2);
        }
    }
    (dst, flags)
}

fn infinity(flags: StatusWord, sign: u8) -> (fp64, StatusWord) {
    (if sign != 0 { fp64::ninf() } else { fp64::pinf() }, flags)
}

fn zero(flags: StatusWord, sign: u8) -> (fp64, StatusWord) {
    (
        if sign != 0 { fp64::neg_zero() } else { fp64::zero() },
        flags,
    )
}

/// Evaluates `P[0] x^n + P[1] x^(n-1) + ... + P[n]` in whatever scratch
/// width the term table carries.
fn poly_eval<T>(x: T, terms: &[T]) -> T
where
    T: Copy + ops::Add<Output = T> + ops::Mul<Output = T>,
{
    let mut dst = terms[0];
    for term in &terms[1..] {
        dst = dst * x + *term;
    }
    dst
}

/// Evaluates `x^n + P[0] x^(n-1) + P[1] x^(n-2) + ... + P[n]`.
fn poly1_eval<T>(x: T, terms: &[T]) -> T
where
    T: Copy + ops::Add<Output = T> + ops::Mul<Output = T>,
{
    let mut dst = x + terms[0];
    for term in &terms[1..] {
        dst = dst * x + *term;
    }
    dst
}

//===========================================================================
// fxtract
//===========================================================================

impl fp64 {
    /// Splits a value into its significand (exponent re-biased to 0) and
    /// its unbiased exponent as a fresh value, returned in that order.
    pub fn x87_fxtract(src: fp64) -> (fp64, fp64, StatusWord) {
        let mut flags = StatusWord::empty();
        if src.is_denorm() {
            flags |= StatusWord::DE;
        }

        if src.is_max_exp() {
            // NaNs in, NaNs out; infinities keep themselves as the
            // significand with +Inf as the exponent
            if src.is_nan() {
                let (dst, flags) = qnan_one(flags, src);
                return (dst, dst, flags);
            }
            return (src, fp64::pinf(), flags);
        }

        // zeros keep themselves as the significand with -Inf as the
        // exponent, flagged as a zero divide
        if src.is_zero() {
            return (src, fp64::ninf(), flags | StatusWord::ZE);
        }

        // going through the scratch type renormalizes denormals
        let esrc = fpext64::from_fp64(src);
        let dst1 = fp64::from_bits(
            (u64::from(esrc.sign()) << FP64_SIGN_SHIFT)
                | (0x3ffu64 << FP64_EXPONENT_SHIFT)
                | ((esrc.mantissa() >> 11) & FP64_MANTISSA_MASK),
        );
        let dst2 = fp64::new(f64::from(esrc.exponent()));
        (dst1, dst2, flags)
    }

    /// Computes `src1 * 2^trunc(src2)`.
    pub fn x87_fscale(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        let mut flags = StatusWord::empty();
        if src1.is_denorm() || src2.is_denorm() {
            flags |= StatusWord::DE;
        }

        if src1.is_max_exp() {
            if src1.is_nan() {
                return qnan_two(flags, src1, src2);
            }
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            return infinity(flags, src1.sign());
        }
        if src2.is_max_exp() {
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            // scaling zero by infinity is invalid; anything else scales
            // out to an infinity of src1's sign
            if src1.is_zero() {
                return indef(flags);
            }
            return infinity(flags, src1.sign());
        }
        if src1.is_zero() {
            return (src1, flags);
        }

        let max_finite = || {
            fp64::from_bits(if src1.sign() != 0 {
                0xffef_ffff_ffff_ffff
            } else {
                0x7fef_ffff_ffff_ffff
            })
        };
        let overflow = |flags: StatusWord| {
            (max_finite(), flags | StatusWord::OE | StatusWord::PE)
        };
        let underflow = |flags: StatusWord| {
            zero(flags | StatusWord::UE | StatusWord::PE, src1.sign())
        };

        let esrc1 = fpext64::from_fp64(src1);

        // truncate the scale factor toward zero
        let exp = if src2.sign() == 0 {
            fp64::floor(src2)
        } else {
            fp64::ceil(src2)
        };

        // clamp overly large factors before converting to int
        if exp >= 32768.0 {
            return overflow(flags);
        }
        if exp <= -32768.0 {
            return underflow(flags);
        }

        let iexp = exp.as_int32();
        if iexp == 0 {
            return (src1, flags);
        }

        let newexp = esrc1.exponent() + iexp;

        // past the bottom of the 80-bit range the flags depend on whether
        // the (exactly representable) mantissa tail would have survived
        if newexp <= -16394 {
            let mantissa = src1.mantissa();
            let thresh = -16394
                - if mantissa == 0 {
                    52
                } else {
                    mantissa.trailing_zeros() as i32
                };
            if newexp <= thresh {
                return underflow(flags);
            }
        }
        if newexp <= -(FP64_EXPONENT_BIAS + FP64_EXPONENT_SHIFT as i32) {
            return zero(flags, src1.sign());
        }

        if newexp >= 16384 {
            return overflow(flags);
        }
        if newexp >= FP64_EXPONENT_MAX_BIASED - FP64_EXPONENT_BIAS {
            return (max_finite(), flags);
        }

        (fpext64::ldexp(&esrc1, iexp).as_fp64(), flags)
    }

    /// Partial remainder with the quotient truncated toward zero.
    ///
    /// When the exponent gap exceeds 63 only a partial reduction happens
    /// and C2 is set; call again with the result until C2 is clear, at
    /// which point (C0, C3, C1) hold bits (2, 1, 0) of the quotient.
    pub fn x87_fprem(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        fprem_core(src1, src2, false)
    }

    /// Partial remainder with the quotient rounded to nearest-even, per
    /// IEEE 754 `remainder`. Same C2/quotient-bit protocol as `fprem`.
    pub fn x87_fprem1(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        fprem_core(src1, src2, true)
    }
}

//===========================================================================
// fprem / fprem1
//===========================================================================

fn fprem_core(src1: fp64, src2: fp64, rem1: bool) -> (fp64, StatusWord) {
    let mut flags = StatusWord::empty();
    if src1.is_denorm() || src2.is_denorm() {
        flags |= StatusWord::DE;
    }

    if src1.is_max_exp() {
        if src1.is_nan() {
            return qnan_two(flags, src1, src2);
        }
        if src2.is_nan() {
            return qnan_one(flags, src2);
        }
        // remainder of an infinity is invalid
        return indef(flags);
    }
    if src2.is_max_exp() {
        if src2.is_nan() {
            return qnan_one(flags, src2);
        }
        // an infinite modulus leaves src1 untouched
        return (src1, flags);
    }
    if src2.is_zero() {
        return indef(flags);
    }

    let esrc1 = fpext64::from_fp64(src1);
    let mut esrc2 = fpext64::from_fp64(src2);
    let mut dexp = esrc1.exponent() - esrc2.exponent();
    let mut rem = esrc1.mantissa() >> 2;
    let sigb = esrc2.mantissa() >> 2;

    // reduce at most 32 bits of exponent gap per call
    let factor = if dexp > 63 { ((dexp - 32) / 32) * 32 } else { 0 };
    dexp -= factor;

    let mut altrem: u64 = 0;
    let mut q: u64;
    let mut have_altrem = false;

    if dexp < 1 {
        if dexp < -1 {
            debug_assert!(factor == 0);
            return (src1, flags);
        }
        q = 0;
        if dexp != 0 {
            rem >>= 1;
        } else if sigb <= rem {
            rem -= sigb;
            q = 1;
        }
    } else {
        // chunked long division off a 32-bit reciprocal, ~29 quotient
        // bits per round
        let recip32 = (0x7fff_ffff_ffff_ffffu64 / u64::from((sigb >> 30) as u32)) as u32;
        dexp -= 30;
        let mut q64: u64 = 0;
        let mut qt: u64 = 0;
        loop {
            q64 = u64::from((rem >> 32) as u32) * u64::from(recip32);
            if dexp < 0 {
                break;
            }
            let mut qq = (q64 + 0x8000_0000) >> 32;
            rem <<= 29;
            rem = rem.wrapping_sub(qq.wrapping_mul(sigb));
            if (rem as i64) < 0 {
                rem = rem.wrapping_add(sigb);
                qq -= 1;
            }
            qt = (qt << 29).wrapping_add(qq);
            dexp -= 29;
        }

        // last (partial) round: align the remaining quotient bits
        q = u64::from(((q64 >> 32) as u32) >> ((!dexp & 31) as u32));
        rem = (rem << (dexp + 30)).wrapping_sub(q.wrapping_mul(sigb));
        q = (qt << (dexp + 30)).wrapping_add(q);
        if (rem as i64) < 0 {
            altrem = rem.wrapping_add(sigb);
            have_altrem = true;
        }
    }

    // correct the last partial remainder against the modulus
    if !have_altrem {
        loop {
            altrem = rem;
            q = q.wrapping_add(1);
            rem = rem.wrapping_sub(sigb);
            if (rem as i64) < 0 {
                break;
            }
        }
    }

    let mut rem = altrem << 2;
    let shift = rem.leading_zeros() as i32;
    let mut res = if rem == 0 {
        fpext64::from_parts(0, 0, ::fpext::EXPONENT_MIN, src1.sign())
    } else {
        rem <<= shift;
        fpext64::from_parts(rem, 0, esrc2.exponent() - shift + factor, src1.sign())
    };

    // fprem1 returns results in -src2/2..src2/2 instead of 0..src2: when
    // the remainder exceeds half the modulus (or equals it with the
    // accumulated q even), take back one more |src2|
    if rem1 && factor == 0 {
        if res.exponent() == esrc2.exponent()
            || (res.exponent() == esrc2.exponent() - 1
                && (rem > esrc2.mantissa() || (rem == esrc2.mantissa() && q & 1 == 0)))
        {
            esrc2.abs();
            if res.sign() == 0 {
                res = res - esrc2;
            } else {
                res = res + esrc2;
            }
            q = q.wrapping_add(1);
        }
    }

    let dst = res.as_fp64();
    if factor != 0 {
        trace!("fprem: partial reduction, {} exponent bits left", dexp);
        return (dst, flags | StatusWord::C2);
    }

    // the correction loop overshoots by one
    q = q.wrapping_sub(1);
    let qbits = ((q & 1) << StatusWord::C1_BIT)
        | ((q & 2) << (StatusWord::C3_BIT - 1))
        | ((q & 4) << (StatusWord::C0_BIT - 2));
    (dst, flags | StatusWord::from_bits_truncate(qbits as u16))
}

//===========================================================================
// f2xm1
//===========================================================================

const F2XM1_LOG_R: i32 = 4;
const F2XM1_R: i32 = 1 << F2XM1_LOG_R;

/// `2^(k/16) - 1` for k in -16..=16, in scratch precision.
static F2XM1_TABLE_G: [fpext64; 33] = [
    fpext64::from_parts(0x8000_0000_0000_0000, 0x0000_0000, -1, 1), // 2^(-16/16) - 1
    fpext64::from_parts(0xf4aa_7930_676f_09d6, 0x746d_48e8, -2, 1), // 2^(-15/16) - 1
    fpext64::from_parts(0xe8d4_7c38_2ae8_5232, 0x0837_3af1, -2, 1), // 2^(-14/16) - 1
    fpext64::from_parts(0xdc78_5918_a9dc_7993, 0xe052_4e3f, -2, 1), // 2^(-13/16) - 1
    fpext64::from_parts(0xcf90_1f5c_e48e_ad21, 0x72a5_b9d0, -2, 1), // 2^(-12/16) - 1
    fpext64::from_parts(0xc215_9b3e_dcbd_dca4, 0xbedd_c1ec, -2, 1), // 2^(-11/16) - 1
    fpext64::from_parts(0xb402_52ac_9d5d_8e2b, 0xc685_013c, -2, 1), // 2^(-10/16) - 1
    fpext64::from_parts(0xa54f_822b_7abd_6a73, 0x6cfe_ae6e, -2, 1), // 2^( -9/16) - 1
    fpext64::from_parts(0x95f6_1998_0c43_36f7, 0x4d04_ec99, -2, 1), // 2^( -8/16) - 1
    fpext64::from_parts(0x85ee_b8c1_4fe7_9282, 0xaefd_c093, -2, 1), // 2^( -7/16) - 1
    fpext64::from_parts(0xea63_57ba_abe4_948b, 0x0754_bcda, -3, 1), // 2^( -6/16) - 1
    fpext64::from_parts(0xc76d_cfab_81ed_fc70, 0x7729_f1c2, -3, 1), // 2^( -5/16) - 1
    fpext64::from_parts(0xa2ec_0cd4_a58a_542f, 0x1965_d11a, -3, 1), // 2^( -4/16) - 1
    fpext64::from_parts(0xf999_089e_ab58_f777, 0xcd3b_57dc, -4, 1), // 2^( -3/16) - 1
    fpext64::from_parts(0xa9f9_c8c1_16de_3689, 0x7e94_5264, -4, 1), // 2^( -2/16) - 1
    fpext64::from_parts(0xada8_2ead_b793_3d38, 0x462f_3851, -5, 1), // 2^( -1/16) - 1
    fpext64::from_parts(0x0000_0000_0000_0000, 0x0000_0000, ::fpext::EXPONENT_MIN, 0),
    fpext64::from_parts(0xb558_6cf9_890f_6298, 0xb92b_7184, -5, 0), // 2^( +1/16) - 1
    fpext64::from_parts(0xb95c_1e3e_a8bd_6e6f, 0xbe46_2876, -4, 0), // 2^( +2/16) - 1
    fpext64::from_parts(0x8e1e_9b9d_588e_19b0, 0x7eb6_c705, -3, 0), // 2^( +3/16) - 1
    fpext64::from_parts(0xc1bf_828c_6dc5_4b7a, 0x3569_18c1, -3, 0), // 2^( +4/16) - 1
    fpext64::from_parts(0xf7a9_9304_8d08_8d6d, 0x0488_f84f, -3, 0), // 2^( +5/16) - 1
    fpext64::from_parts(0x97fb_5aa6_c544_e3a8, 0x72f5_fd88, -2, 0), // 2^( +6/16) - 1
    fpext64::from_parts(0xb560_fba9_0a85_2b19, 0x2602_a324, -2, 0), // 2^( +7/16) - 1
    fpext64::from_parts(0xd413_cccf_e779_9211, 0x65f6_26ce, -2, 0), // 2^( +8/16) - 1
    fpext64::from_parts(0xf422_8e7d_6030_dafa, 0xa204_7eda, -2, 0), // 2^( +9/16) - 1
    fpext64::from_parts(0x8ace_5422_aa0d_b5ba, 0x7c55_a193, -1, 0), // 2^(+10/16) - 1
    fpext64::from_parts(0x9c49_182a_3f09_01c7, 0xc46b_071f, -1, 0), // 2^(+11/16) - 1
    fpext64::from_parts(0xae89_f995_ad3a_d5e8, 0x734d_1773, -1, 0), // 2^(+12/16) - 1
    fpext64::from_parts(0xc199_bdd8_5529_c222, 0x0cb1_2a09, -1, 0), // 2^(+13/16) - 1
    fpext64::from_parts(0xd581_8dcf_ba48_725d, 0xa05a_eb67, -1, 0), // 2^(+14/16) - 1
    fpext64::from_parts(0xea4a_fa2a_490d_9858, 0xf73a_18f6, -1, 0), // 2^(+15/16) - 1
    fpext64::from_parts(0x8000_0000_0000_0000, 0x0000_0000, 0, 0), // 2^(+16/16) - 1
];

/// `k/16` for k in -16..=16; all exact in binary64.
static F2XM1_TABLE_U: [f64; 33] = [
    -1.0, -0.9375, -0.875, -0.8125, -0.75, -0.6875, -0.625, -0.5625, -0.5, -0.4375, -0.375,
    -0.3125, -0.25, -0.1875, -0.125, -0.0625, 0.0, 0.0625, 0.125, 0.1875, 0.25, 0.3125, 0.375,
    0.4375, 0.5, 0.5625, 0.625, 0.6875, 0.75, 0.8125, 0.875, 0.9375, 1.0,
];

/// Falling products of 8 down to 8!, scaling the Taylor tail of `e^w - 1`.
static F2XM1_TAYLOR_COEFF: [f64; 7] = [8.0, 56.0, 336.0, 1680.0, 6720.0, 20160.0, 40320.0];

impl fp64 {
    /// Computes `2^x - 1` for x in [-1, +1]; out-of-range inputs come back
    /// unchanged, as on hardware.
    pub fn x87_f2xm1(src: fp64) -> (fp64, StatusWord) {
        let exponent = src.exponent();

        // |x| >= 1, infinities and NaNs
        if exponent >= 0 {
            if src.to_bits() == 0xbff0_0000_0000_0000 {
                // exactly -1 gives exactly -0.5
                return (fp64::from_bits(0xbfe0_0000_0000_0000), StatusWord::PE);
            }
            if src.is_max_exp() {
                if src.is_nan() {
                    return qnan_one(StatusWord::empty(), src);
                }
                if src.is_ninf() {
                    return (fp64::neg_one(), StatusWord::empty());
                }
                return infinity(StatusWord::empty(), 0);
            }
            return (src, StatusWord::PE);
        }

        // anything tiny reduces to x*ln2, which also sidesteps denormals
        if exponent <= -1000 {
            if src.is_zero() {
                return (src, StatusWord::empty());
            }
            let dst = (fpext64::from_fp64(src) * fpext64::LN2).as_fp64();
            if src.is_denorm() {
                return (dst, StatusWord::PE | StatusWord::DE);
            }
            return (dst, StatusWord::PE);
        }

        // round x to the nearest multiple of 1/16 by looking at the high
        // mantissa bits; anything below 2^-5 rounds to the zero entry
        let mut g_index: i32 = 0;
        if exponent >= -F2XM1_LOG_R - 1 {
            let mantissa = src.mantissa() | (FP64_MANTISSA_MASK + 1);
            g_index = (mantissa
                >> (FP64_EXPONENT_SHIFT as i32 - F2XM1_LOG_R - exponent - 1)) as i32;
            g_index = (g_index >> 1) + (g_index & 1);
            if src.sign() != 0 {
                g_index = -g_index;
            }
        }

        // v = delta from the table point, then w = v*ln2 so the e^w
        // Taylor series applies; the multiply needs scratch precision
        let v = src - fp64::new(F2XM1_TABLE_U[(g_index + F2XM1_R) as usize]);
        let w = fpext64::from_fp64(v) * fpext64::LN2;

        // the degree-8 tail itself is fine in double precision
        let w64 = w.as_fp64();
        let mut h64 = w64 + F2XM1_TAYLOR_COEFF[0];
        for term in &F2XM1_TAYLOR_COEFF[1..6] {
            h64 = h64 * w64 + *term;
        }
        h64 = h64 * (w64 * w64);
        h64 = h64 * (1.0 / 40320.0);

        // back to scratch precision: h = e^w - 1, g = 2^(k/16) - 1, and
        // the result is (1+g)(1+h) - 1 = g*h + g + h, which avoids the
        // cancellation when both are small
        let mut h = fpext64::from_fp64(h64);
        h += w;
        let g = F2XM1_TABLE_G[(g_index + F2XM1_R) as usize];
        ((g * h + g + h).as_fp64(), StatusWord::PE)
    }
}

//===========================================================================
// fyl2x / fyl2xp1
//===========================================================================

impl fp64 {
    /// Computes `src2 * log2(src1)`.
    pub fn x87_fyl2x(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        let mut flags = StatusWord::empty();
        if src1.is_denorm() || src2.is_denorm() {
            flags |= StatusWord::DE;
        }

        if src1.is_max_exp() {
            if src1.is_nan() {
                return qnan_two(flags, src1, src2);
            }
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            // log of negative infinity, or infinity times zero
            if src1.sign() != 0 || src2.is_zero() {
                return indef(flags);
            }
            return infinity(flags, src2.sign());
        }
        if src2.is_max_exp() {
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            // infinity times log(1) = infinity times zero
            if src1.sign() != 0 || src1 == fp64::one() {
                return indef(flags);
            }
            return infinity(flags, ((src1.exponent() < 0) as u8) ^ src2.sign());
        }
        if src1.sign() != 0 {
            return indef(flags);
        }
        if src1.is_zero() {
            if src2.is_zero() {
                return indef(flags);
            }
            return infinity(flags | StatusWord::ZE, src2.sign() ^ 1);
        }
        if src2.is_zero() {
            return zero(flags, src2.sign() ^ ((src1.exponent() < 0) as u8));
        }

        let two54 = fp64::from_bits(0x4350_0000_0000_0000);
        let lg1 = fp64::from_bits(0x3fe5_5555_5555_5593);
        let lg2 = fp64::from_bits(0x3fd9_9999_9997_fa04);
        let lg3 = fp64::from_bits(0x3fd2_4924_9422_9359);
        let lg4 = fp64::from_bits(0x3fcc_71c5_1d8e_78af);
        let lg5 = fp64::from_bits(0x3fc7_4664_96cb_03de);
        let lg6 = fp64::from_bits(0x3fc3_9a09_d078_c69f);
        let lg7 = fp64::from_bits(0x3fc2_f112_df3e_5244);
        let invln2 = fpext64::from_parts(0xb8aa_3b29_5c17_f0bb, 0xbe87_fed0, 0, 0);

        let src280 = fpext64::from_fp64(src2);
        let src2invln2 = src280 * invln2;

        if src1 != fp64::one() {
            flags |= StatusWord::PE;
        }

        let mut rawsrc = src1.to_bits();
        let mut hx = (rawsrc >> 32) as i32;

        // push denormals into the normal range first
        let mut k: i32 = 0;
        let mut x = src1;
        if x.is_denorm() {
            k -= 54;
            x = x * two54;
            rawsrc = x.to_bits();
            hx = (rawsrc >> 32) as i32;
        }
        k += x.exponent();

        // normalize x into [sqrt(2)/2, sqrt(2)), folding the choice into k
        hx &= 0x000f_ffff;
        let i = (hx + 0x95f64) & 0x0010_0000;
        let x = fp64::from_bits((rawsrc & FP64_MANTISSA_MASK) | (u64::from((i ^ 0x3ff0_0000) as u32) << 32));
        k += i >> 20;
        let dk80 = fpext64::from_fp64(fp64::new(f64::from(k))) * src280;
        let f = x - 1.0;

        if (0x000f_ffff & (2 + hx)) < 3 {
            // |f| < 2^-20
            if f == fp64::zero() {
                return (dk80.as_fp64(), flags);
            }
            let r = f * f * (0.5 - 0.33333333333333333 * f);
            return (
                (dk80 - fpext64::from_fp64(r - f) * src2invln2).as_fp64(),
                flags,
            );
        }

        let s = f / (2.0 + f);
        let z = s * s;
        let mut i = hx - 0x6147a;
        let w = z * z;
        let j = 0x6b851 - hx;
        let t1 = w * (lg2 + w * (lg4 + w * lg6));
        let t2 = z * (lg1 + w * (lg3 + w * (lg5 + w * lg7)));
        i |= j;
        let r = t2 + t1;
        if i > 0 {
            let hfsq = 0.5 * f * f;
            (
                (dk80 - fpext64::from_fp64((hfsq - s * (hfsq + r)) - f) * src2invln2).as_fp64(),
                flags,
            )
        } else {
            (
                (dk80 - fpext64::from_fp64(s * (f - r) - f) * src2invln2).as_fp64(),
                flags,
            )
        }
    }

    /// Computes `src2 * log2(1 + src1)`; accurate near src1 = 0 where
    /// `fyl2x` would cancel.
    pub fn x87_fyl2xp1(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        let mut flags = StatusWord::empty();
        if src1.is_denorm() || src2.is_denorm() {
            flags |= StatusWord::DE;
        }

        if src1.is_max_exp() {
            if src1.is_nan() {
                return qnan_two(flags, src1, src2);
            }
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            if (src1.sign() != 0 && src1.exponent() >= 0) || src2.is_zero() {
                return indef(flags);
            }
            return infinity(flags, src2.sign());
        }
        if src2.is_max_exp() {
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            if src1.is_zero() || src1 == fp64::neg_one() {
                return indef(flags);
            }
            return infinity(flags, src1.sign() ^ src2.sign());
        }
        if src1 == fp64::neg_one() {
            // log of 0 is infinity, unless multiplying by 0; the infinity
            // takes y's sign directly and no zero-divide flag is raised
            // (unlike fyl2x's log-of-zero path)
            if src2.is_zero() {
                return indef(flags);
            }
            return infinity(flags, src2.sign());
        }
        if src1 < fp64::neg_one() {
            // out of domain: the hardware hands back src1
            if src2.is_zero() {
                return zero(flags, src2.sign() ^ 1);
            }
            return (src1, flags | StatusWord::PE);
        }
        if src2.is_zero() {
            return zero(flags, src2.sign() ^ src1.sign());
        }

        let ln2_hi = fp64::from_bits(0x3fe6_2e42_fee0_0000);
        let ln2_lo = fp64::from_bits(0x3dea_39ef_3579_3c76);
        let lp1 = fp64::from_bits(0x3fe5_5555_5555_5593);
        let lp2 = fp64::from_bits(0x3fd9_9999_9997_fa04);
        let lp3 = fp64::from_bits(0x3fd2_4924_9422_9359);
        let lp4 = fp64::from_bits(0x3fcc_71c5_1d8e_78af);
        let lp5 = fp64::from_bits(0x3fc7_4664_96cb_03de);
        let lp6 = fp64::from_bits(0x3fc3_9a09_d078_c69f);
        let lp7 = fp64::from_bits(0x3fc2_f112_df3e_5244);
        let invln2 = fpext64::from_parts(0xb8aa_3b29_5c17_f0bb, 0xbe87_fed0, 0, 0);

        let src2invln2 = fpext64::from_fp64(src2) * invln2;

        if !src1.is_zero() {
            flags |= StatusWord::PE;
        }

        let hx = (src1.to_bits() >> 32) as i32;
        let ax = hx & 0x7fff_ffff;

        let mut k: i32 = 1;
        let mut f = fp64::zero();
        let mut hu: i32 = 0;
        let mut c = fp64::zero();

        if hx < 0x3fda_827a {
            // x < 0.41422
            if ax < 0x3e20_0000 {
                // |x| < 2^-29: one or two terms suffice
                if ax < 0x3c90_0000 {
                    return (
                        (fpext64::from_fp64(src1) * src2invln2).as_fp64(),
                        flags,
                    );
                }
                return (
                    (fpext64::from_fp64(src1 - src1 * src1 * 0.5) * src2invln2).as_fp64(),
                    flags,
                );
            }
            if hx > 0 || hx <= 0xbfd2_bec3u32 as i32 {
                // -0.2929 < x < 0.41422: no exponent split needed
                k = 0;
                f = src1;
                hu = 1;
                c = fp64::zero();
            }
        }
        if k != 0 {
            let mut u;
            if hx < 0x4340_0000 {
                u = 1.0 + src1;
                hu = (u.to_bits() >> 32) as i32;
                k = u.exponent();
                // correction term for the rounding in 1+x
                c = if k > 0 { 1.0 - (u - src1) } else { src1 - (u - 1.0) };
                c = c / u;
            } else {
                u = src1;
                hu = (u.to_bits() >> 32) as i32;
                k = u.exponent();
                c = fp64::zero();
            }
            hu &= 0x000f_ffff;
            if hu < 0x6a09e {
                // normalize u
                u = fp64::from_bits(u.mantissa() | 0x3ff0_0000_0000_0000);
            } else {
                // normalize u/2
                k += 1;
                u = fp64::from_bits(u.mantissa() | 0x3fe0_0000_0000_0000);
                hu = (0x0010_0000 - hu) >> 2;
            }
            f = u - 1.0;
        }

        let hfsq = 0.5 * f * f;
        if hu == 0 {
            // |f| < 2^-20
            if f == fp64::zero() {
                if k == 0 {
                    return (fp64::zero(), flags);
                }
                let c = c + f64::from(k) * ln2_lo;
                return (
                    (fpext64::from_fp64(f64::from(k) * ln2_hi + c) * src2invln2).as_fp64(),
                    flags,
                );
            }
            let r = hfsq * (1.0 - 0.66666666666666666 * f);
            if k == 0 {
                return (
                    (fpext64::from_fp64(f - r) * src2invln2).as_fp64(),
                    flags,
                );
            }
            return (
                (fpext64::from_fp64(
                    f64::from(k) * ln2_hi - ((r - (f64::from(k) * ln2_lo + c)) - f),
                ) * src2invln2)
                    .as_fp64(),
                flags,
            );
        }

        let s = f / (2.0 + f);
        let z = s * s;
        let r1 = z * lp1;
        let z2 = z * z;
        let r2 = lp2 + z * lp3;
        let z4 = z2 * z2;
        let r3 = lp4 + z * lp5;
        let z6 = z4 * z2;
        let r4 = lp6 + z * lp7;
        let r = r1 + z2 * r2 + z4 * r3 + z6 * r4;
        if k == 0 {
            (
                (fpext64::from_fp64(f - (hfsq - s * (hfsq + r))) * src2invln2).as_fp64(),
                flags,
            )
        } else {
            (
                (fpext64::from_fp64(
                    f64::from(k) * ln2_hi
                        - ((hfsq - (s * (hfsq + r) + (f64::from(k) * ln2_lo + c))) - f),
                ) * src2invln2)
                    .as_fp64(),
                flags,
            )
        }
    }
}

//===========================================================================
// trigonometric reduction
//===========================================================================

/// Reduces |src| modulo pi/4, returning the quadrant index and the delta
/// as normalized `(mantissa, exponent, sign)` parts. The reduction itself
/// always runs at the full 64 mantissa bits; each kernel collapses the
/// parts into its own scratch width afterwards.
///
/// The hardware uses a 66-bit approximation of pi (these constants come
/// from Intel's documentation of it), so we reduce against that value
/// rather than full-precision pi and stay bit-compatible near multiples of
/// pi/2. The quadrant index is always even; the delta satisfies
/// |z| <= pi/8 relative to the matching even multiple.
fn reduce_trig(src: fp64) -> (u32, u64, i32, u8) {
    let src = fp64::abs(src);
    let delta = fpext64::from_fp64(src);

    // below pi/4 there is nothing to reduce
    if src < 0.7853981633974483096 {
        return (0, delta.mantissa(), delta.exponent(), delta.sign());
    }

    let mut srcman = delta.mantissa();
    let mut srcexp = delta.exponent();
    debug_assert!((srcman as i64) < 0);
    debug_assert!(srcexp >= -1 && srcexp < 63);

    // multiply by 4/pi (a 1.127 fixed-point value; zero exponent, so no
    // adjustment) giving a 2.190 product, and floor it
    const INV_PIO4_HI: u64 = 0xa2f9_836e_4e44_152a;
    const INV_PIO4_LO: u64 = 0x0006_2bc4_0da2_8000;
    let (divmid, divhi) = mul_64x64(srcman, INV_PIO4_HI);
    let (_divlo, hitemp) = mul_64x64(srcman, INV_PIO4_LO);
    let divmid = divmid.wrapping_add(hitemp);
    let mut divhi = divhi;
    if divmid < hitemp {
        divhi += 1;
    }

    // srcexp is at most 62, so the floor lives entirely in the high word
    let mut result = divhi >> (62 - srcexp);

    // always reduce against an even multiple
    let evenodd = result & 1;
    result += evenodd;

    // result times pi/4 to high precision: scalar times the 1.127 pi/4
    // value, a 65.127 product with exponent -1
    const PIO4_HI: u64 = 0xc90f_daa2_2168_c234;
    const PIO4_LO: u64 = 0xc000_0000_0000_0000;
    let (mulmid, mulhi) = mul_64x64(result, PIO4_HI);
    let (mut mullo, hitemp2) = mul_64x64(result, PIO4_LO);
    let mut mulmid = mulmid.wrapping_add(hitemp2);
    let mut mulhi = mulhi;
    if mulmid < hitemp2 {
        mulhi += 1;
    }

    // align the product with src's 1.63 mantissa
    let shift = 1 + srcexp;
    if shift != 0 {
        mullo = (mullo >> shift) | (mulmid << (64 - shift));
        mulmid = (mulmid >> shift) | (mulhi << (64 - shift));
        debug_assert!(
            (evenodd == 0 && (mulhi >> shift) == 0) || (evenodd != 0 && (mulhi >> shift) <= 1)
        );
    }

    // subtract, tracking the sign: rounding the quadrant up means the
    // multiple overshoots src and the delta flips negative
    let sign;
    if evenodd == 0 {
        // the extra 1 is the borrow mullo takes out of srcman's implicit
        // zero tail
        srcman = srcman.wrapping_sub(mulmid).wrapping_sub(1);
        mullo = mullo.wrapping_neg();
        sign = 0;
    } else {
        srcman = mulmid.wrapping_sub(srcman);
        sign = 1;
    }

    // normalize the difference
    if srcman == 0 {
        srcman = mullo;
        mullo = 0;
        srcexp -= 64;
    }
    debug_assert!(srcman != 0);
    let lz = srcman.leading_zeros() as i32;
    if lz != 0 {
        srcman = (srcman << lz) | (mullo >> (64 - lz));
        srcexp -= lz;
    }

    trace!("reduce_trig: quadrant={}, delta exponent={}", result & 7, srcexp);
    (result as u32, srcman, srcexp, sign)
}

//===========================================================================
// fsin / fcos / fsincos / fptan
//===========================================================================

/// Polynomial for `(sin(z) - z) / (z * z^2)` over z^2.
static SIN_COEFFS: [fpext64; 7] = [
    fpext64::from_parts(0xd551_2389_e1d6_4e26, 0x9f89_cf50, -41, 1),
    fpext64::from_parts(0xb090_4623_e706_64d7, 0x67a8_f274, -33, 0),
    fpext64::from_parts(0xd732_2946_bf34_01b0, 0xbe53_b744, -26, 1),
    fpext64::from_parts(0xb8ef_1d29_9845_c8f6, 0xd25b_9a66, -19, 0),
    fpext64::from_parts(0xd00d_00d0_0c53_6514, 0x3dde_3d85, -13, 1),
    fpext64::from_parts(0x8888_8888_8888_5699, 0xb8fd_9374, -7, 0),
    fpext64::from_parts(0xaaaa_aaaa_aaaa_aa97, 0x2da4_d5f5, -3, 1),
];

/// Polynomial for `(cos(z) - 1 + z^2/2) / z^4` over z^2.
static COS_COEFFS: [fpext64; 7] = [
    fpext64::from_parts(0xd55e_8c3a_6f99_7436, 0x5436_d2ee, -45, 0),
    fpext64::from_parts(0xc9c9_920f_58f4_2f36, 0xfafa_14fe, -37, 1),
    fpext64::from_parts(0x8f76_c648_659e_534f, 0xab5f_5d64, -29, 0),
    fpext64::from_parts(0x93f2_7dba_f5c6_4d2b, 0x0e94_1cac, -22, 1),
    fpext64::from_parts(0xd00d_00d0_0c66_53ed, 0x149d_cc8a, -16, 0),
    fpext64::from_parts(0xb60b_60b6_0b60_7b66, 0xd4ce_5b04, -10, 1),
    fpext64::from_parts(0xaaaa_aaaa_aaaa_aa99, 0xa993_9f52, -5, 0),
];

/// Flags for an in-range trig argument.
fn trig_flags(src: fp64) -> StatusWord {
    if src.is_zero() {
        StatusWord::empty()
    } else if src.is_denorm() {
        StatusWord::PE | StatusWord::DE
    } else {
        StatusWord::PE
    }
}

impl fp64 {
    /// Computes `sin(src)`. Inputs with exponent >= 63 come back unchanged
    /// with C2 set, as on hardware.
    pub fn x87_fsin(src: fp64) -> (fp64, StatusWord) {
        if src.exponent() >= 63 {
            if src.is_nan() {
                return qnan_one(StatusWord::empty(), src);
            }
            if src.is_inf() {
                return indef(StatusWord::empty());
            }
            return (src, StatusWord::C2);
        }

        let sign = src.sign();
        let flags = trig_flags(src);
        let (j, man, exp, zsign) = reduce_trig(src);
        let z = fpext64::from_parts(man, 0, exp, zsign);

        let zz = z * z;
        let mut dst = if (j + 1) & 2 != 0 {
            (fpext64::ONE - fpext64::ldexp(&zz, -1) + zz * zz * poly_eval(zz, &COS_COEFFS))
                .as_fp64()
        } else {
            (z + z * zz * poly_eval(zz, &SIN_COEFFS)).as_fp64()
        };

        if (u32::from(sign) ^ (j >> 2)) & 1 != 0 {
            dst = fp64::chs(dst);
        }
        (dst, flags)
    }

    /// Computes `cos(src)`. Same out-of-range behavior as [`x87_fsin`].
    ///
    /// [`x87_fsin`]: #method.x87_fsin
    pub fn x87_fcos(src: fp64) -> (fp64, StatusWord) {
        if src.exponent() >= 63 {
            if src.is_nan() {
                return qnan_one(StatusWord::empty(), src);
            }
            if src.is_inf() {
                return indef(StatusWord::empty());
            }
            return (src, StatusWord::C2);
        }

        let (j, man, exp, zsign) = reduce_trig(src);
        let z = fpext64::from_parts(man, 0, exp, zsign);
        let flags = trig_flags(src);

        let zz = z * z;
        let mut dst = if (j + 1) & 2 != 0 {
            (z + z * zz * poly_eval(zz, &SIN_COEFFS)).as_fp64()
        } else {
            (fpext64::ONE - fpext64::ldexp(&zz, -1) + zz * zz * poly_eval(zz, &COS_COEFFS))
                .as_fp64()
        };

        if ((j >> 1) ^ j) & 2 != 0 {
            dst = fp64::chs(dst);
        }
        (dst, flags)
    }

    /// Computes `(sin(src), cos(src))`, bit-identical to running the two
    /// single kernels. On out-of-range inputs the pair is `(0, src)` with
    /// C2 set; the zero is a placeholder that must not be pushed.
    pub fn x87_fsincos(src: fp64) -> (fp64, fp64, StatusWord) {
        if src.exponent() >= 63 {
            if src.is_nan() {
                let (dst, flags) = qnan_one(StatusWord::empty(), src);
                return (dst, dst, flags);
            }
            if src.is_inf() {
                let (dst, flags) = indef(StatusWord::empty());
                return (dst, dst, flags);
            }
            return (fp64::zero(), src, StatusWord::C2);
        }

        let (j, man, exp, zsign) = reduce_trig(src);
        let z = fpext64::from_parts(man, 0, exp, zsign);
        let sign = src.sign();
        let flags = trig_flags(src);

        let zz = z * z;
        let sin_poly = (z + z * zz * poly_eval(zz, &SIN_COEFFS)).as_fp64();
        let cos_poly = (fpext64::ONE - fpext64::ldexp(&zz, -1)
            + zz * zz * poly_eval(zz, &COS_COEFFS))
            .as_fp64();

        // bit 1 of the quadrant swaps which polynomial feeds which output
        let (mut cos_out, mut sin_out) = if (j + 1) & 2 != 0 {
            (sin_poly, cos_poly)
        } else {
            (cos_poly, sin_poly)
        };

        if ((j >> 1) ^ j) & 2 != 0 {
            cos_out = fp64::chs(cos_out);
        }
        if (u32::from(sign) ^ (j >> 2)) & 1 != 0 {
            sin_out = fp64::chs(sin_out);
        }
        (sin_out, cos_out, flags)
    }

    /// Computes `(tan(src), 1.0)`; the constant 1 is what the hardware
    /// pushes above the tangent. On out-of-range inputs the pair is
    /// `(src, 0)` with C2 set; the zero must not be pushed.
    pub fn x87_fptan(src: fp64) -> (fp64, fp64, StatusWord) {
        if src.exponent() >= 63 {
            if src.is_nan() {
                let (dst, flags) = qnan_one(StatusWord::empty(), src);
                return (dst, dst, flags);
            }
            if src.is_inf() {
                let (dst, flags) = indef(StatusWord::empty());
                return (dst, dst, flags);
            }
            return (src, fp64::zero(), StatusWord::C2);
        }

        // the (tan(z) - z) / z^3 rational approximation; this kernel's
        // accuracy buckets were measured at the 53-bit scratch width and
        // only that width keeps the 2-ULP tail small, so it stays there
        let tan_p = [
            fpext52::from_parts(0xcc96_c692_79f9_bc1c, 0x3df8_4886, 13, 1),
            fpext52::from_parts(0x8ccf_652f_e4ee_e5b1, 0x4f58_e5c3, 20, 0),
            fpext52::from_parts(0x88ff_5699_4c8b_af99, 0x8b70_bfaf, 24, 1),
        ];
        let tan_q = [
            fpext52::from_parts(0xd5c5_2f75_9b2b_8ed3, 0xe2c5_b9a6, 13, 0),
            fpext52::from_parts(0xa13d_e2c1_55e4_adcd, 0x58df_d25f, 20, 1),
            fpext52::from_parts(0xbecc_7e17_56c7_7adf, 0x21bc_5195, 24, 0),
            fpext52::from_parts(0xcd7f_01e5_f2d1_86f6, 0x1dc3_e1c7, 25, 1),
        ];

        let (j, man, exp, zsign) = reduce_trig(src);
        let z = fpext52::from_parts(man, 0, exp, zsign);
        let sign = src.sign();
        let flags = trig_flags(src);

        let zz = z * z;
        let mut dst = if zz.exponent() > -67 {
            z.as_fp64()
                + (z * zz * poly_eval(zz, &tan_p)).as_fp64() / poly1_eval(zz, &tan_q).as_fp64()
        } else {
            z.as_fp64()
        };

        // odd pi/2 quadrants give the negative reciprocal (cotangent)
        if j & 2 != 0 {
            dst = -1.0 / dst;
        }
        if sign != 0 {
            dst = fp64::chs(dst);
        }
        (dst, fp64::one(), flags)
    }
}

//===========================================================================
// fpatan
//===========================================================================

/// Numerator of the atan rational approximation.
static ATAN_P: [fpext64; 5] = [
    fpext64::from_parts(0xde5f_1266_ce53_8ece, 0x4593_3bae, -1, 1),
    fpext64::from_parts(0xeaef_a6bf_a061_07e6, 0x6f35_1563, 3, 1),
    fpext64::from_parts(0xffe8_557f_f291_53ee, 0x4748_7583, 5, 1),
    fpext64::from_parts(0xc7fa_3f3e_eda6_f9d5, 0xa7a0_3a0c, 6, 1),
    fpext64::from_parts(0xcb93_9361_6abc_b6c3, 0x53e3_ffa9, 5, 1),
];

/// Denominator of the atan rational approximation.
static ATAN_Q: [fpext64; 5] = [
    fpext64::from_parts(0xb7da_e76e_894e_54d3, 0xee74_072e, 4, 0),
    fpext64::from_parts(0x8ffd_afa2_7a46_76b8, 0xd644_a00e, 7, 0),
    fpext64::from_parts(0xb4b8_6bee_e9c0_e3a9, 0x5df2_ff95, 8, 0),
    fpext64::from_parts(0xc3c9_b098_50a7_abc0, 0xb934_a367, 8, 0),
    fpext64::from_parts(0x98ae_ae89_100d_891b, 0xd3dd_1204, 7, 0),
];

/// `tan(3*pi/8)`: boundary of the pi/2 pre-rotation octant.
const T3P8: f64 = 2.41421356237309504880169;
/// `tan(pi/8)`: boundary of the pi/4 pre-rotation octant.
const TP8: f64 = 4.1421356237309504880169e-1;

const PI64: f64 = 3.1415926535897932384626433832795;
const PIO2_64: f64 = 1.5707963267948966192313216916398;
const PIO4_64: f64 = 0.78539816339744830961566084581988;
const PI3O4_64: f64 = 2.3561944901923449288469825374596;

impl fp64 {
    /// Computes `atan2(src2, src1)`: src1 is the x coordinate, src2 the y.
    pub fn x87_fpatan(src1: fp64, src2: fp64) -> (fp64, StatusWord) {
        let mut flags = StatusWord::empty();
        if src1.is_denorm() || src2.is_denorm() {
            flags |= StatusWord::DE;
        }

        if src1.is_max_exp() {
            if src1.is_nan() {
                return qnan_two(flags, src1, src2);
            }
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            if src2.is_inf() {
                // both infinite: the diagonals
                let dst = if src1.sign() == 0 {
                    if src2.sign() == 0 { PIO4_64 } else { -PIO4_64 }
                } else if src2.sign() == 0 {
                    PI3O4_64
                } else {
                    -PI3O4_64
                };
                return (fp64::new(dst), flags | StatusWord::PE);
            }
            // infinite x, finite y: the horizontal axis
            if src1.sign() == 0 {
                return zero(flags, src2.sign());
            }
            let dst = if src2.sign() == 0 { PI64 } else { -PI64 };
            return (fp64::new(dst), flags | StatusWord::PE);
        }
        if src2.is_max_exp() {
            if src2.is_nan() {
                return qnan_one(flags, src2);
            }
            // infinite y, finite x: straight up or down
            let dst = if src2.sign() == 0 { PIO2_64 } else { -PIO2_64 };
            return (fp64::new(dst), flags | StatusWord::PE);
        }
        if src1.is_zero() {
            if src2.is_zero() {
                // the origin resolves by the signs alone
                if src1.sign() == 0 {
                    return zero(flags, src2.sign());
                }
                let dst = if src2.sign() == 0 { PI64 } else { -PI64 };
                return (fp64::new(dst), flags);
            }
            let dst = if src2.sign() == 0 { PIO2_64 } else { -PIO2_64 };
            return (fp64::new(dst), flags | StatusWord::PE);
        }
        if src2.is_zero() {
            if src1.sign() != 0 {
                flags |= StatusWord::PE;
            }
            if src1.sign() == 0 {
                return zero(flags, src2.sign());
            }
            let dst = if src2.sign() == 0 { PI64 } else { -PI64 };
            return (fp64::new(dst), flags);
        }

        let mut x = src2 / src1;

        // make the ratio positive and save the sign
        let mut sign = 0u8;
        if x < 0.0 {
            sign = 1;
            x = fp64::chs(x);
        }

        // reduce into the first octant
        let (mut yext, xext) = if x > T3P8 {
            (fpext64::PIO2, fpext64::from_fp64(-1.0 / x))
        } else if x > TP8 {
            (fpext64::PIO4, fpext64::from_fp64((x - 1.0) / (x + 1.0)))
        } else {
            (fpext64::ZERO, fpext64::from_fp64(x))
        };

        let z = xext * xext;
        yext = yext + poly_eval(z, &ATAN_P).div64(&poly1_eval(z, &ATAN_Q)) * z * xext + xext;

        if sign != 0 {
            yext.chs();
        }

        // quadrant offset from the operand signs
        let code = ((src1.sign() << 1) | src2.sign()) as usize;
        static OFFSETS: [f64; 4] = [0.0, 0.0, PI64, -PI64];
        let mut dst = yext.as_fp64() + OFFSETS[code];

        if dst == fp64::zero() && src2.sign() != 0 {
            dst = fp64::chs(dst);
        }
        (dst, flags | StatusWord::PE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_small_angle_is_identity() {
        let (j, man, exp, sign) = reduce_trig(fp64::new(0.5));
        assert_eq!(j, 0);
        assert_eq!(sign, 0);
        let z = fpext64::from_parts(man, 0, exp, sign);
        assert_eq!(z.as_fp64().as_f64(), 0.5);
        // the 53-bit collapse of an exact value is the same number
        let z = fpext52::from_parts(man, 0, exp, sign);
        assert_eq!(z.as_fp64().as_f64(), 0.5);
    }

    #[test]
    fn reduce_near_pi_over_two() {
        // pi/2 reduces against quadrant 2 with a tiny delta
        let (j, man, exp, _) = reduce_trig(fp64::new(::std::f64::consts::FRAC_PI_2));
        assert_eq!(j & 7, 2);
        assert!(man == 0 || exp < -50);
    }

    #[test]
    fn reduce_sign_of_delta() {
        // 3.0 < pi: quadrant rounds up to 4, so the delta is negative
        let (j, man, exp, sign) = reduce_trig(fp64::new(3.0));
        assert_eq!(j & 7, 4);
        assert_eq!(sign, 1);
        let residual = fpext64::from_parts(man, 0, exp, sign).as_fp64().as_f64();
        assert!(residual < 0.0 && residual > -0.25);
    }

    #[test]
    fn poly_eval_degenerate() {
        let terms = [fpext64::ONE, fpext64::ONE];
        // 1*0 + 1 = 1
        let r = poly_eval(fpext64::ZERO, &terms);
        assert_eq!(r.as_fp64().as_f64(), 1.0);
    }
}
