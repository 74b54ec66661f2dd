//! Error types for operand validation and jump resolution.
//!
//! Encoder bugs (a ModR/M field out of range, a REX prefix in 32-bit mode)
//! are not represented here: they panic at the emission site. `EmitError`
//! covers the failures a compiling pass has to see and abort on.

use alloc::string::String;
use core::fmt;

use crate::config::Mode;

/// Emission error with enough context to diagnose the failing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EmitError {
    /// Scale factor outside `{1, 2, 4, 8}`.
    InvalidScale {
        /// The rejected scale factor.
        scale: u8,
    },

    /// Register used as an explicit index aliases the "no index" encoding.
    InvalidIndex {
        /// Register id (0–15) of the rejected index.
        reg: u8,
    },

    /// Absolute address that the current mode cannot encode as a 32-bit
    /// displacement.
    AddressOutOfRange {
        /// The requested address.
        address: u64,
        /// Encoding mode in effect.
        mode: Mode,
    },

    /// Operand not encodable in the current mode (64-bit register in
    /// 32-bit mode, RIP-relative addressing outside long mode, ...).
    ModeMismatch {
        /// What was requested.
        detail: String,
        /// Encoding mode in effect.
        mode: Mode,
    },

    /// Branch displacement does not fit the requested encoding.
    BranchOutOfRange {
        /// Instruction mnemonic (`jmp`, `jl`, `call`, ...).
        instr: String,
        /// Buffer offset of the instruction.
        site: usize,
        /// Requested target offset.
        target: usize,
        /// Displacement that would have been encoded.
        disp: i64,
        /// Largest displacement the encoding allows.
        max: i64,
    },

    /// Jump target lies outside the emitted code.
    TargetOutOfBounds {
        /// Requested target offset.
        target: usize,
        /// Bytes emitted so far.
        len: usize,
    },

    /// Write would exceed an externally bounded buffer.
    BufferOverflow {
        /// Bytes the buffer would have held after the write.
        requested: usize,
        /// Configured bound.
        limit: usize,
    },

    /// Forward or smart jumps were never resolved.
    UnresolvedFixups {
        /// Number of outstanding jumps.
        count: usize,
    },
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::InvalidScale { scale } => {
                write!(f, "invalid scale factor {} (expected 1, 2, 4 or 8)", scale)
            }
            EmitError::InvalidIndex { reg } => {
                write!(
                    f,
                    "register {} cannot be used as an index (encodes \"no index\")",
                    reg
                )
            }
            EmitError::AddressOutOfRange { address, mode } => {
                write!(
                    f,
                    "absolute address {:#x} is not encodable as a 32-bit displacement in {} mode",
                    address, mode
                )
            }
            EmitError::ModeMismatch { detail, mode } => {
                write!(f, "{} is not encodable in {} mode", detail, mode)
            }
            EmitError::BranchOutOfRange {
                instr,
                site,
                target,
                disp,
                max,
            } => {
                write!(
                    f,
                    "{} at {:#x}: target {:#x} out of range (displacement={}, max=±{})",
                    instr, site, target, disp, max
                )
            }
            EmitError::TargetOutOfBounds { target, len } => {
                write!(
                    f,
                    "jump target {:#x} lies beyond emitted code (len {:#x})",
                    target, len
                )
            }
            EmitError::BufferOverflow { requested, limit } => {
                write!(
                    f,
                    "code buffer overflow: {} bytes requested, limit {}",
                    requested, limit
                )
            }
            EmitError::UnresolvedFixups { count } => {
                write!(f, "{} jump(s) left unresolved", count)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EmitError {}

/// Abort emission on an error the caller cannot recover from.
#[cold]
#[track_caller]
pub(crate) fn fatal(err: EmitError) -> ! {
    panic!("x86-emit: {}", err)
}
