//! Scoped control of the host FPU rounding mode.
//!
//! The conversion matrix rounds in integer arithmetic and never touches
//! host state, but an embedder that lowers `fp64` algebra onto the host
//! needs the hardware rounding mode to follow the emulated control word.
//! `RoundGuard` installs a mode on construction and restores the previous
//! one when dropped, on every exit path including unwinding.
//!
//! All platform-specific register access lives in this module: MXCSR on
//! x86/x86_64, FPCR on aarch64. Elsewhere the guard degrades to a
//! thread-local record of the requested mode (host arithmetic then stays
//! at round-to-nearest).
//!
//! The hardware registers are per-thread, so guards on different threads
//! do not interfere; nesting within one thread unwinds in LIFO order.

use RoundingMode;

/// Saves the host rounding mode and installs a new one for the guard's
/// lifetime.
#[derive(Debug)]
pub struct RoundGuard {
    saved: u32,
}

impl RoundGuard {
    /// Installs `mode`, remembering the previous host state.
    pub fn new(mode: RoundingMode) -> RoundGuard {
        let saved = backend::read();
        backend::write(backend::with_mode(saved, mode));
        RoundGuard { saved }
    }

    /// The rounding mode the host is currently using.
    pub fn current() -> RoundingMode {
        backend::mode_of(backend::read())
    }
}

impl Drop for RoundGuard {
    fn drop(&mut self) {
        backend::write(self.saved);
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod backend {
    use std::arch::asm;
    use RoundingMode;

    // MXCSR bits 13-14 are the rounding control field, with the same
    // encoding as the x87 control word's RC field.
    const RC_SHIFT: u32 = 13;
    const RC_MASK: u32 = 0b11 << RC_SHIFT;

    pub fn read() -> u32 {
        let mut value: u32 = 0;
        unsafe {
            asm!("stmxcsr [{ptr}]", ptr = in(reg) &mut value, options(nostack));
        }
        value
    }

    pub fn write(value: u32) {
        unsafe {
            asm!("ldmxcsr [{ptr}]", ptr = in(reg) &value, options(nostack));
        }
    }

    pub fn with_mode(raw: u32, mode: RoundingMode) -> u32 {
        (raw & !RC_MASK) | ((mode as u32) << RC_SHIFT)
    }

    pub fn mode_of(raw: u32) -> RoundingMode {
        match (raw & RC_MASK) >> RC_SHIFT {
            0b00 => RoundingMode::Nearest,
            0b01 => RoundingMode::Down,
            0b10 => RoundingMode::Up,
            _ => RoundingMode::Zero,
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod backend {
    use std::arch::asm;
    use RoundingMode;

    // FPCR bits 22-23 are RMode; note that up and down are swapped
    // relative to the x87 encoding.
    const RMODE_SHIFT: u32 = 22;
    const RMODE_MASK: u32 = 0b11 << RMODE_SHIFT;

    pub fn read() -> u32 {
        let value: u64;
        unsafe {
            asm!("mrs {}, fpcr", out(reg) value, options(nomem, nostack));
        }
        value as u32
    }

    pub fn write(value: u32) {
        unsafe {
            asm!("msr fpcr, {}", in(reg) u64::from(value), options(nomem, nostack));
        }
    }

    pub fn with_mode(raw: u32, mode: RoundingMode) -> u32 {
        let rmode = match mode {
            RoundingMode::Nearest => 0b00,
            RoundingMode::Up => 0b01,
            RoundingMode::Down => 0b10,
            RoundingMode::Zero => 0b11,
        };
        (raw & !RMODE_MASK) | (rmode << RMODE_SHIFT)
    }

    pub fn mode_of(raw: u32) -> RoundingMode {
        match (raw & RMODE_MASK) >> RMODE_SHIFT {
            0b00 => RoundingMode::Nearest,
            0b01 => RoundingMode::Up,
            0b10 => RoundingMode::Down,
            _ => RoundingMode::Zero,
        }
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
mod backend {
    use std::cell::Cell;
    use RoundingMode;

    thread_local! {
        static MODE: Cell<u32> = Cell::new(0);
    }

    pub fn read() -> u32 {
        MODE.with(|m| m.get())
    }

    pub fn write(value: u32) {
        MODE.with(|m| m.set(value));
    }

    pub fn with_mode(_raw: u32, mode: RoundingMode) -> u32 {
        mode as u32
    }

    pub fn mode_of(raw: u32) -> RoundingMode {
        match raw & 0b11 {
            0b00 => RoundingMode::Nearest,
            0b01 => RoundingMode::Down,
            0b10 => RoundingMode::Up,
            _ => RoundingMode::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_and_restores() {
        let before = RoundGuard::current();
        {
            let _guard = RoundGuard::new(RoundingMode::Down);
            assert_eq!(RoundGuard::current(), RoundingMode::Down);
            {
                let _inner = RoundGuard::new(RoundingMode::Zero);
                assert_eq!(RoundGuard::current(), RoundingMode::Zero);
            }
            assert_eq!(RoundGuard::current(), RoundingMode::Down);
        }
        assert_eq!(RoundGuard::current(), before);
    }

    #[test]
    fn every_mode_round_trips() {
        for &mode in &[
            RoundingMode::Nearest,
            RoundingMode::Down,
            RoundingMode::Up,
            RoundingMode::Zero,
        ] {
            let _guard = RoundGuard::new(mode);
            assert_eq!(RoundGuard::current(), mode);
        }
    }
}
