//! The 80-bit `f2xm1` kernel.
//!
//! Same table-plus-Taylor scheme as the 64-bit kernel, run one notch
//! wider: the table and the final combine use the 96-bit scratch type, the
//! Taylor tail runs in 64-bit scratch, and the tail gets one more term.
//! The remaining 80-bit transcendentals are not implemented.

use fp80_impl::{fp80, FP80_EXPLICIT_ONE, FP80_EXPONENT_BIAS};
use fpext::{fpext64, fpext96};
use StatusWord;

const LOG_R: i32 = 4;
const R: i32 = 1 << LOG_R;

/// `2^(k/16) - 1` for k in -16..=16, in 96-bit scratch precision.
static TABLE_G: [fpext96; 33] = [
    fpext96::from_parts(0x8000_0000_0000_0000, 0x0000_0000, -1, 1), // 2^(-16/16) - 1
    fpext96::from_parts(0xf4aa_7930_676f_09d6, 0x746d_48e8, -2, 1), // 2^(-15/16) - 1
    fpext96::from_parts(0xe8d4_7c38_2ae8_5232, 0x0837_3af1, -2, 1), // 2^(-14/16) - 1
    fpext96::from_parts(0xdc78_5918_a9dc_7993, 0xe052_4e3f, -2, 1), // 2^(-13/16) - 1
    fpext96::from_parts(0xcf90_1f5c_e48e_ad21, 0x72a5_b9d0, -2, 1), // 2^(-12/16) - 1
    fpext96::from_parts(0xc215_9b3e_dcbd_dca4, 0xbedd_c1ec, -2, 1), // 2^(-11/16) - 1
    fpext96::from_parts(0xb402_52ac_9d5d_8e2b, 0xc685_013c, -2, 1), // 2^(-10/16) - 1
    fpext96::from_parts(0xa54f_822b_7abd_6a73, 0x6cfe_ae6e, -2, 1), // 2^( -9/16) - 1
    fpext96::from_parts(0x95f6_1998_0c43_36f7, 0x4d04_ec99, -2, 1), // 2^( -8/16) - 1
    fpext96::from_parts(0x85ee_b8c1_4fe7_9282, 0xaefd_c093, -2, 1), // 2^( -7/16) - 1
    fpext96::from_parts(0xea63_57ba_abe4_948b, 0x0754_bcda, -3, 1), // 2^( -6/16) - 1
    fpext96::from_parts(0xc76d_cfab_81ed_fc70, 0x7729_f1c2, -3, 1), // 2^( -5/16) - 1
    fpext96::from_parts(0xa2ec_0cd4_a58a_542f, 0x1965_d11a, -3, 1), // 2^( -4/16) - 1
    fpext96::from_parts(0xf999_089e_ab58_f777, 0xcd3b_57dc, -4, 1), // 2^( -3/16) - 1
    fpext96::from_parts(0xa9f9_c8c1_16de_3689, 0x7e94_5264, -4, 1), // 2^( -2/16) - 1
    fpext96::from_parts(0xada8_2ead_b793_3d38, 0x462f_3851, -5, 1), // 2^( -1/16) - 1
    fpext96::from_parts(0x0000_0000_0000_0000, 0x0000_0000, ::fpext::EXPONENT_MIN, 0),
    fpext96::from_parts(0xb558_6cf9_890f_6298, 0xb92b_7184, -5, 0), // 2^( +1/16) - 1
    fpext96::from_parts(0xb95c_1e3e_a8bd_6e6f, 0xbe46_2876, -4, 0), // 2^( +2/16) - 1
    fpext96::from_parts(0x8e1e_9b9d_588e_19b0, 0x7eb6_c705, -3, 0), // 2^( +3/16) - 1
    fpext96::from_parts(0xc1bf_828c_6dc5_4b7a, 0x3569_18c1, -3, 0), // 2^( +4/16) - 1
    fpext96::from_parts(0xf7a9_9304_8d08_8d6d, 0x0488_f84f, -3, 0), // 2^( +5/16) - 1
    fpext96::from_parts(0x97fb_5aa6_c544_e3a8, 0x72f5_fd88, -2, 0), // 2^( +6/16) - 1
    fpext96::from_parts(0xb560_fba9_0a85_2b19, 0x2602_a324, -2, 0), // 2^( +7/16) - 1
    fpext96::from_parts(0xd413_cccf_e779_9211, 0x65f6_26ce, -2, 0), // 2^( +8/16) - 1
    fpext96::from_parts(0xf422_8e7d_6030_dafa, 0xa204_7eda, -2, 0), // 2^( +9/16) - 1
    fpext96::from_parts(0x8ace_5422_aa0d_b5ba, 0x7c55_a193, -1, 0), // 2^(+10/16) - 1
    fpext96::from_parts(0x9c49_182a_3f09_01c7, 0xc46b_071f, -1, 0), // 2^(+11/16) - 1
    fpext96::from_parts(0xae89_f995_ad3a_d5e8, 0x734d_1773, -1, 0), // 2^(+12/16) - 1
    fpext96::from_parts(0xc199_bdd8_5529_c222, 0x0cb1_2a09, -1, 0), // 2^(+13/16) - 1
    fpext96::from_parts(0xd581_8dcf_ba48_725d, 0xa05a_eb67, -1, 0), // 2^(+14/16) - 1
    fpext96::from_parts(0xea4a_fa2a_490d_9858, 0xf73a_18f6, -1, 0), // 2^(+15/16) - 1
    fpext96::from_parts(0x8000_0000_0000_0000, 0x0000_0000, 0, 0), // 2^(+16/16) - 1
];

/// `k/16` for k in -16..=16.
static TABLE_U: [fpext64; 33] = [
    fpext64::from_parts(0x8000_0000_0000_0000, 0, 0, 1),
    fpext64::from_parts(0xf000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xe000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xd000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xb000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xa000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0x9000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -1, 1),
    fpext64::from_parts(0xe000_0000_0000_0000, 0, -2, 1),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -2, 1),
    fpext64::from_parts(0xa000_0000_0000_0000, 0, -2, 1),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -2, 1),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -3, 1),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -3, 1),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -4, 1),
    fpext64::from_parts(0x0000_0000_0000_0000, 0, -16383, 0),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -4, 0),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -3, 0),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -3, 0),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -2, 0),
    fpext64::from_parts(0xa000_0000_0000_0000, 0, -2, 0),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -2, 0),
    fpext64::from_parts(0xe000_0000_0000_0000, 0, -2, 0),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0x9000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xa000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xb000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xc000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xd000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xe000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0xf000_0000_0000_0000, 0, -1, 0),
    fpext64::from_parts(0x8000_0000_0000_0000, 0, 0, 0),
];

/// Falling products of 9 down to 9!, scaling the Taylor tail of `e^w - 1`.
static TAYLOR_COEFF: [fpext64; 8] = [
    fpext64::from_parts(0x9000_0000_0000_0000, 0, 3, 0),  // 9
    fpext64::from_parts(0x9000_0000_0000_0000, 0, 6, 0),  // 9*8
    fpext64::from_parts(0xfc00_0000_0000_0000, 0, 8, 0),  // 9*8*7
    fpext64::from_parts(0xbd00_0000_0000_0000, 0, 11, 0), // 9*8*7*6
    fpext64::from_parts(0xec40_0000_0000_0000, 0, 13, 0), // 9*8*7*6*5
    fpext64::from_parts(0xec40_0000_0000_0000, 0, 15, 0), // 9*8*7*6*5*4
    fpext64::from_parts(0xb130_0000_0000_0000, 0, 17, 0), // 9*8*7*6*5*4*3
    fpext64::from_parts(0xb130_0000_0000_0000, 0, 18, 0), // 9*8*7*6*5*4*3*2
];

/// `1/9!`.
static TAYLOR_FACTORIAL_INV: fpext64 =
    fpext64::from_parts(0xb8ef_1d2a_b639_9c7d, 0x560e_4473, -19, 0);

impl fp80 {
    /// Computes `2^x - 1` for x in [-1, +1]; out-of-range inputs come back
    /// unchanged, as on hardware.
    pub fn x87_f2xm1(src: &fp80) -> (fp80, StatusWord) {
        let exponent = src.exponent();

        // |x| >= 1, infinities and NaNs
        if exponent >= 0 {
            if src.sign_exp() == 0xbfff && src.mantissa() == FP80_EXPLICIT_ONE {
                // exactly -1 gives exactly -0.5
                return (fp80::new(FP80_EXPLICIT_ONE, 0xbffe), StatusWord::PE);
            }
            if src.is_max_exp() {
                if src.is_ninf() {
                    return (fp80::new(FP80_EXPLICIT_ONE, 0xbfff), StatusWord::empty());
                }
                if src.is_inf() || src.is_qnan() {
                    return (*src, StatusWord::empty());
                }
                // signaling NaNs quiet and raise invalid
                return (fp80::make_qnan(src), StatusWord::IE);
            }
            return (*src, StatusWord::PE);
        }

        // anything tiny reduces to x*ln2, which also sidesteps denormals
        if exponent <= -1000 {
            if src.is_zero() {
                return (*src, StatusWord::empty());
            }
            let dst = (fpext96::from_fp80(src) * fpext96::LN2).as_fp80();
            if src.is_denorm() {
                return (dst, StatusWord::PE | StatusWord::DE | StatusWord::UE);
            }
            if exponent <= 1 - FP80_EXPONENT_BIAS {
                return (dst, StatusWord::PE | StatusWord::UE);
            }
            return (dst, StatusWord::PE);
        }

        // round x to the nearest multiple of 1/16 off the top mantissa
        // bits (the explicit integer bit included)
        let mut g_index: i32 = 0;
        if exponent >= -LOG_R - 1 {
            g_index = (src.mantissa() >> (58 - exponent)) as i32;
            g_index = (g_index >> 1) + (g_index & 1);
            if src.sign() != 0 {
                g_index = -g_index;
            }
        }

        // v = delta from the table point, w = v*ln2 in full width
        let v = fpext64::from_fp80(src) - TABLE_U[(g_index + R) as usize];
        let w = fpext96::from(v) * fpext96::LN2;

        // the degree-9 Taylor tail runs in the narrow scratch type
        let w80 = fpext64::from_wide(&w, true);
        let mut h80 = w80 + TAYLOR_COEFF[0];
        for term in &TAYLOR_COEFF[1..7] {
            h80 = h80 * w80 + *term;
        }
        h80 *= w80 * w80;
        h80 *= TAYLOR_FACTORIAL_INV;

        // back to full width: h = e^w - 1, g = 2^(k/16) - 1, and the
        // result is (1+g)(1+h) - 1 = g*h + g + h
        let mut h = fpext96::from(h80);
        h += w;
        let g = TABLE_G[(g_index + R) as usize];
        ((g * h + g + h).as_fp80(), StatusWord::PE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_half_power() {
        // 2^0.5 - 1 hits the k=8 table entry with a zero Taylor tail
        let (dst, sw) = fp80::x87_f2xm1(&fp80::from(0.5f64));
        assert_eq!(dst, fp80::new(0xd413_cccf_e779_9211, 0x3ffd));
        assert_eq!(sw, StatusWord::PE);

        let (dst, sw) = fp80::x87_f2xm1(&fp80::from(-0.5f64));
        assert_eq!(dst, fp80::new(0x95f6_1998_0c43_36f7, 0xbffd));
        assert_eq!(sw, StatusWord::PE);
    }

    #[test]
    fn minus_one_is_minus_half() {
        let (dst, sw) = fp80::x87_f2xm1(&fp80::from(-1.0f64));
        assert_eq!(dst, fp80::new(FP80_EXPLICIT_ONE, 0xbffe));
        assert_eq!(sw, StatusWord::PE);
    }

    #[test]
    fn zeros_pass_through() {
        let (dst, sw) = fp80::x87_f2xm1(&fp80::ZERO);
        assert_eq!(dst, fp80::ZERO);
        assert!(sw.is_empty());

        let (dst, sw) = fp80::x87_f2xm1(&fp80::NEG_ZERO);
        assert_eq!(dst, fp80::NEG_ZERO);
        assert!(sw.is_empty());
    }

    #[test]
    fn infinities() {
        let (dst, sw) = fp80::x87_f2xm1(&fp80::INFINITY);
        assert!(dst.is_pinf());
        assert!(sw.is_empty());

        let (dst, sw) = fp80::x87_f2xm1(&fp80::NEG_INFINITY);
        assert_eq!(dst, fp80::new(FP80_EXPLICIT_ONE, 0xbfff)); // -1.0
        assert!(sw.is_empty());
    }

    #[test]
    fn nan_handling() {
        let (dst, sw) = fp80::x87_f2xm1(&fp80::NAN);
        assert_eq!(dst, fp80::NAN);
        assert!(sw.is_empty());

        let snan = fp80::new(0x8000_0000_0000_0001, 0xffff);
        let (dst, sw) = fp80::x87_f2xm1(&snan);
        assert!(dst.is_qnan());
        assert_eq!(sw, StatusWord::IE);
    }

    #[test]
    fn out_of_range_passes_through() {
        let two = fp80::from(2.0f64);
        let (dst, sw) = fp80::x87_f2xm1(&two);
        assert_eq!(dst, two);
        assert_eq!(sw, StatusWord::PE);

        // x = 1 is the range boundary; 2^1 - 1 happens to equal it
        let (dst, sw) = fp80::x87_f2xm1(&fp80::ONE);
        assert_eq!(dst, fp80::ONE);
        assert_eq!(sw, StatusWord::PE);
    }

    #[test]
    fn denormal_underflows() {
        let denorm = fp80::new(0x4000_0000_0000_0000, 0x0000);
        let (dst, sw) = fp80::x87_f2xm1(&denorm);
        assert_eq!(sw, StatusWord::PE | StatusWord::DE | StatusWord::UE);
        assert!(dst.is_denorm());
        assert_eq!(dst.sign(), 0);
    }

    #[test]
    fn quarter_in_range() {
        // 2^0.25 - 1 = 0.18920711500272106...; the k=4 entry with a zero
        // tail again
        let (dst, sw) = fp80::x87_f2xm1(&fp80::from(0.25f64));
        assert_eq!(dst, fp80::new(0xc1bf_828c_6dc5_4b7a, 0x3ffc));
        assert_eq!(sw, StatusWord::PE);
    }
}
