//! Flat call shapes for recompilers written against the historical
//! `OP{width}{form}` emitter interface.
//!
//! Everything here forwards to the typed templates; nothing encodes on its
//! own. Jump helpers abort with a panic where the typed API returns an
//! error, matching the "log and stop the recompile" behaviour such callers
//! expect.
//!
//! ```
//! use x86_emit::legacy::*;
//! use x86_emit::{CodeBuffer, Mode, Reg32};
//!
//! let mut buf = CodeBuffer::for_mode(Mode::X86);
//! cmp32_i_to_r(&mut buf, Reg32::EAX, 0);
//! let skip = je8(&mut buf);
//! add32_i_to_r(&mut buf, Reg32::EAX, 1);
//! set_j8(&mut buf, skip);
//! assert_eq!(buf.as_slice(), [0x83, 0xF8, 0x00, 0x74, 0x03, 0x83, 0xC0, 0x01]);
//! ```

use crate::buffer::CodeBuffer;
use crate::error::fatal;
use crate::family::{self, Fixed, Group1, Group2, IncDec};
use crate::jump::{Cond, ForwardJump, JumpKind, JumpWidth};
use crate::operand::{dword_ptr, Mem, Reg32};

// ─── Integer ────────────────────────────────────────────────

/// `mov to, from`
pub fn mov32_r_to_r(buf: &mut CodeBuffer, to: Reg32, from: Reg32) {
    family::mov_rr(buf, to, from);
}

/// `mov to, [from]`
#[track_caller]
pub fn mov32_m_to_r(buf: &mut CodeBuffer, to: Reg32, from: Mem) {
    family::mov_rm(buf, to, from);
}

/// `mov [to], from`
#[track_caller]
pub fn mov32_r_to_m(buf: &mut CodeBuffer, to: Mem, from: Reg32) {
    family::mov_mr(buf, to, from);
}

/// `mov to, imm32`
pub fn mov32_i_to_r(buf: &mut CodeBuffer, to: Reg32, imm: u32) {
    family::mov_ri(buf, to, i64::from(imm));
}

/// `mov dword [to], imm32`
#[track_caller]
pub fn mov32_i_to_m(buf: &mut CodeBuffer, to: Mem, imm: u32) {
    family::mov_mi(buf, dword_ptr(to), i64::from(imm));
}

macro_rules! group1_shapes {
    ($op:expr => $i_to_r:ident, $r_to_r:ident, $m_to_r:ident, $r_to_m:ident, $i_to_m:ident) => {
        #[doc = concat!("`", stringify!($i_to_r), "`: register, 32-bit immediate.")]
        pub fn $i_to_r(buf: &mut CodeBuffer, to: Reg32, imm: u32) {
            $op.ri(buf, to, i64::from(imm));
        }

        #[doc = concat!("`", stringify!($r_to_r), "`: register, register.")]
        pub fn $r_to_r(buf: &mut CodeBuffer, to: Reg32, from: Reg32) {
            $op.rr(buf, to, from);
        }

        #[doc = concat!("`", stringify!($m_to_r), "`: register, memory.")]
        #[track_caller]
        pub fn $m_to_r(buf: &mut CodeBuffer, to: Reg32, from: Mem) {
            $op.rm(buf, to, from);
        }

        #[doc = concat!("`", stringify!($r_to_m), "`: memory, register.")]
        #[track_caller]
        pub fn $r_to_m(buf: &mut CodeBuffer, to: Mem, from: Reg32) {
            $op.mr(buf, to, from);
        }

        #[doc = concat!("`", stringify!($i_to_m), "`: memory, 32-bit immediate.")]
        #[track_caller]
        pub fn $i_to_m(buf: &mut CodeBuffer, to: Mem, imm: u32) {
            $op.mi(buf, dword_ptr(to), i64::from(imm));
        }
    };
}

group1_shapes!(Group1::Add => add32_i_to_r, add32_r_to_r, add32_m_to_r, add32_r_to_m, add32_i_to_m);
group1_shapes!(Group1::Or => or32_i_to_r, or32_r_to_r, or32_m_to_r, or32_r_to_m, or32_i_to_m);
group1_shapes!(Group1::Adc => adc32_i_to_r, adc32_r_to_r, adc32_m_to_r, adc32_r_to_m, adc32_i_to_m);
group1_shapes!(Group1::Sbb => sbb32_i_to_r, sbb32_r_to_r, sbb32_m_to_r, sbb32_r_to_m, sbb32_i_to_m);
group1_shapes!(Group1::And => and32_i_to_r, and32_r_to_r, and32_m_to_r, and32_r_to_m, and32_i_to_m);
group1_shapes!(Group1::Sub => sub32_i_to_r, sub32_r_to_r, sub32_m_to_r, sub32_r_to_m, sub32_i_to_m);
group1_shapes!(Group1::Xor => xor32_i_to_r, xor32_r_to_r, xor32_m_to_r, xor32_r_to_m, xor32_i_to_m);
group1_shapes!(Group1::Cmp => cmp32_i_to_r, cmp32_r_to_r, cmp32_m_to_r, cmp32_r_to_m, cmp32_i_to_m);

/// `shl to, imm8`
pub fn shl32_i_to_r(buf: &mut CodeBuffer, to: Reg32, count: u8) {
    Group2::Shl.ri(buf, to, count);
}

/// `shr to, imm8`
pub fn shr32_i_to_r(buf: &mut CodeBuffer, to: Reg32, count: u8) {
    Group2::Shr.ri(buf, to, count);
}

/// `sar to, imm8`
pub fn sar32_i_to_r(buf: &mut CodeBuffer, to: Reg32, count: u8) {
    Group2::Sar.ri(buf, to, count);
}

/// `inc to`
pub fn inc32_r(buf: &mut CodeBuffer, to: Reg32) {
    IncDec::Inc.r(buf, to);
}

/// `dec to`
pub fn dec32_r(buf: &mut CodeBuffer, to: Reg32) {
    IncDec::Dec.r(buf, to);
}

/// `test to, from`
pub fn test32_r_to_r(buf: &mut CodeBuffer, to: Reg32, from: Reg32) {
    family::test_rr(buf, to, from);
}

/// `ret`
pub fn ret(buf: &mut CodeBuffer) {
    Fixed::Ret.emit(buf);
}

/// `nop`
pub fn nop(buf: &mut CodeBuffer) {
    Fixed::Nop.emit(buf);
}

/// Pad to `alignment` with NOPs.
#[track_caller]
pub fn align(buf: &mut CodeBuffer, alignment: usize) {
    buf.align(alignment);
}

// ─── Jumps ──────────────────────────────────────────────────

/// Short jump with an unresolved target.
pub fn j8_rel(buf: &mut CodeBuffer, kind: JumpKind) -> ForwardJump {
    ForwardJump::emit(buf, kind, JumpWidth::Short)
}

/// Near jump with an unresolved target.
pub fn j32_rel(buf: &mut CodeBuffer, kind: JumpKind) -> ForwardJump {
    ForwardJump::emit(buf, kind, JumpWidth::Near)
}

/// `jmp rel8` to be resolved.
pub fn jmp8(buf: &mut CodeBuffer) -> ForwardJump {
    j8_rel(buf, JumpKind::Always)
}

/// `jmp rel32` to be resolved.
pub fn jmp32(buf: &mut CodeBuffer) -> ForwardJump {
    j32_rel(buf, JumpKind::Always)
}

macro_rules! jcc_shapes {
    ($($cond:ident => $short:ident, $near:ident;)*) => {$(
        #[doc = concat!("`", stringify!($short), "` to be resolved.")]
        pub fn $short(buf: &mut CodeBuffer) -> ForwardJump {
            j8_rel(buf, JumpKind::If(Cond::$cond))
        }

        #[doc = concat!("`", stringify!($near), "` to be resolved.")]
        pub fn $near(buf: &mut CodeBuffer) -> ForwardJump {
            j32_rel(buf, JumpKind::If(Cond::$cond))
        }
    )*};
}

jcc_shapes! {
    Overflow => jo8, jo32;
    NoOverflow => jno8, jno32;
    Below => jb8, jb32;
    AboveEqual => jae8, jae32;
    Equal => je8, je32;
    NotEqual => jne8, jne32;
    BelowEqual => jbe8, jbe32;
    Above => ja8, ja32;
    Sign => js8, js32;
    NoSign => jns8, jns32;
    Parity => jp8, jp32;
    NoParity => jnp8, jnp32;
    Less => jl8, jl32;
    GreaterEqual => jge8, jge32;
    LessEqual => jle8, jle32;
    Greater => jg8, jg32;
}

/// Bind a short jump to the cursor.
///
/// # Panics
///
/// Panics if `jump` is not a short jump or the distance does not fit in
/// a signed byte.
#[track_caller]
pub fn set_j8(buf: &mut CodeBuffer, jump: ForwardJump) {
    expect_width(&jump, JumpWidth::Short);
    if let Err(err) = jump.resolve(buf) {
        fatal(err);
    }
}

/// Bind a near jump to the cursor.
///
/// # Panics
///
/// Panics if `jump` is not a near jump.
#[track_caller]
pub fn set_j32(buf: &mut CodeBuffer, jump: ForwardJump) {
    expect_width(&jump, JumpWidth::Near);
    if let Err(err) = jump.resolve(buf) {
        fatal(err);
    }
}

/// Bind a short jump to the cursor, first padding to 16 bytes when the
/// cursor is more than [`SHORT_ALIGN_SLACK`](crate::SHORT_ALIGN_SLACK)
/// bytes past a boundary and the padded target is still in range.
///
/// # Panics
///
/// Panics if `jump` is not a short jump or the distance does not fit in
/// a signed byte.
#[track_caller]
pub fn set_j8_aligned(buf: &mut CodeBuffer, jump: ForwardJump) {
    expect_width(&jump, JumpWidth::Short);
    if let Err(err) = jump.resolve_aligned(buf, 16) {
        fatal(err);
    }
}

/// Align the cursor to 16 bytes, then bind a near jump to it.
///
/// # Panics
///
/// Panics if `jump` is not a near jump.
#[track_caller]
pub fn set_j32_aligned(buf: &mut CodeBuffer, jump: ForwardJump) {
    expect_width(&jump, JumpWidth::Near);
    if let Err(err) = jump.resolve_aligned(buf, 16) {
        fatal(err);
    }
}

#[track_caller]
fn expect_width(jump: &ForwardJump, width: JumpWidth) {
    assert_eq!(jump.width(), width, "jump bound with the wrong setter");
}
