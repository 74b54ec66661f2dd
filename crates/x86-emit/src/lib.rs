//! # x86-emit: runtime x86 / x86-64 machine-code emitter
//!
//! `x86-emit` is the code-generation back end of a dynamic recompiler. A
//! translator calls one typed function per instruction and gets encoded
//! bytes appended to a [`CodeBuffer`]; there is no text, no parser and no
//! intermediate representation between the caller and the bytes.
//!
//! ## Quick Start
//!
//! ```rust
//! use x86_emit::{CodeBuffer, Group1, Index, Mem, Reg32, Reg64, Scale};
//!
//! let mut buf = CodeBuffer::new();
//! Group1::Add.ri(&mut buf, Reg32::EAX, 5);
//! Group1::Add.rm(
//!     &mut buf,
//!     Reg64::RAX,
//!     Mem::indexed(Reg64::RBX, Index::new(Reg64::RCX).unwrap(), Scale::S8, 16),
//! );
//! assert_eq!(
//!     buf.as_slice(),
//!     &[0x83, 0xC0, 0x05, 0x48, 0x03, 0x44, 0xCB, 0x10]
//! );
//! ```
//!
//! ## Jumps
//!
//! Branches to code already emitted pick their shortest form. Branches to
//! code not yet emitted are either a [`ForwardJump`] of a width the caller
//! chooses, or a [`SmartJump`] that reserves the long form and shrinks to
//! the short one when its target turns out to be close.
//!
//! ```rust
//! use x86_emit::{jump_to, CodeBuffer, Cond, ForwardJump, JumpKind, JumpWidth};
//!
//! let mut buf = CodeBuffer::new();
//! let top = buf.cursor();
//! buf.emit_u8(0x90);
//! assert_eq!(jump_to(&mut buf, Cond::NotEqual.into(), top), Ok(JumpWidth::Short));
//!
//! let exit = ForwardJump::emit(&mut buf, JumpKind::Always, JumpWidth::Near);
//! buf.emit_nops(200);
//! exit.resolve(&mut buf).unwrap();
//! assert!(buf.finish().is_ok());
//! ```
//!
//! ## Features
//!
//! - **Typed operands**: register widths are types, so mixing a 32-bit and
//!   a 64-bit register in one instruction does not compile.
//! - **Two modes**: 32-bit and long mode, selected per buffer with
//!   [`EmitterConfig`].
//! - **Opcode families**: integer ALU, shifts, moves, SSE/MMX and x87
//!   templates driven by small descriptor tables.
//! - **`no_std` + `alloc`**: the `std` feature only adds
//!   `std::error::Error` for [`EmitError`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Encoders narrow and re-sign integers constantly (i64 → i8 displacements,
// register ids into 3-bit fields) and write opcodes as dense hex literals.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::bool_to_int_with_if,
    clippy::wildcard_imports,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::fn_params_excessive_bools,
    clippy::too_many_lines,
    clippy::many_single_char_names,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

extern crate alloc;

/// Growable code buffer, labels, alignment padding.
pub mod buffer;
/// Target mode and emitter limits.
pub mod config;
/// REX / ModR/M / SIB / immediate encoding and the generic instruction shapes.
pub mod encoder;
/// Error type.
pub mod error;
/// Integer instruction families.
pub mod family;
/// x87 instruction families.
pub mod fpu;
/// Branches, calls, forward jumps and compacting smart jumps.
pub mod jump;
/// Flat `OP{width}{form}` call shapes over the typed templates.
pub mod legacy;
/// Registers, memory operands and their address layout.
pub mod operand;
/// SSE and MMX instruction families.
pub mod simd;

pub use buffer::{CodeBuffer, Label};
pub use config::{EmitterConfig, Mode};
pub use encoder::{ImmForm, ImmSize};
pub use error::EmitError;
pub use family::{BitScan, BitTest, DoubleShift, Extend, Fixed, Group1, Group2, Group3, IncDec};
pub use fpu::{Fcmov, FpuArith, FpuFixed};
pub use jump::{
    call_address, call_to, jcc_to, jmp_to, jump_near_to, jump_short_to, jump_to, jump_to_address,
    jump_to_label, Cond, ForwardJump, JumpKind, JumpWidth, SmartJump, SHORT_ALIGN_SLACK,
};
pub use operand::{
    byte_ptr, dword_ptr, qword_ptr, word_ptr, AddrReg, AddressLayout, Disp, GpReg, Index, Mem, Mmx,
    OperandSize, Ptr, Reg16, Reg32, Reg64, Reg8, Scale, SibFields, St, VecReg, Xmm,
};
pub use simd::{CmpPredicate, CvtFromInt, CvtToInt, RegFile, SimdImm, SimdMove, SimdOp, SimdShift};
