//! x87 floating-point templates.

use crate::buffer::CodeBuffer;
use crate::encoder::{emit_plain, emit_rm_op, emit_rr_op, OpSpec, RegField, Rm};
use crate::operand::{Mem, St};

#[track_caller]
fn mem_op(buf: &mut CodeBuffer, opcode: u8, digit: u8, mem: Mem) {
    emit_rm_op(buf, OpSpec::new(&[opcode]), RegField::digit(digit), &Rm::Mem(mem));
}

#[track_caller]
fn stack_op(buf: &mut CodeBuffer, opcode: u8, digit: u8, st: St) {
    emit_rr_op(
        buf,
        OpSpec::new(&[opcode]),
        RegField::digit(digit),
        RegField::raw(st.index()),
    );
}

// ─── Arithmetic ─────────────────────────────────────────────

/// The eight x87 arithmetic operations sharing the `D8`/`DC`/`DE` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FpuArith {
    Add,
    Mul,
    Com,
    Comp,
    Sub,
    Subr,
    Div,
    Divr,
}

impl FpuArith {
    /// All operations in opcode-extension order.
    pub const ALL: [FpuArith; 8] = [
        FpuArith::Add,
        FpuArith::Mul,
        FpuArith::Com,
        FpuArith::Comp,
        FpuArith::Sub,
        FpuArith::Subr,
        FpuArith::Div,
        FpuArith::Divr,
    ];

    /// ModR/M.reg extension of the memory and `ST(0), ST(i)` forms.
    pub fn digit(self) -> u8 {
        self as u8
    }

    // With ST(i) as destination the SUB/SUBR and DIV/DIVR rows swap.
    #[track_caller]
    fn reversed_digit(self) -> u8 {
        match self {
            FpuArith::Add => 0,
            FpuArith::Mul => 1,
            FpuArith::Sub => 5,
            FpuArith::Subr => 4,
            FpuArith::Div => 7,
            FpuArith::Divr => 6,
            FpuArith::Com | FpuArith::Comp => {
                panic!("{:?} has no ST(i), ST(0) form", self)
            }
        }
    }

    /// `fop dword [mem]`
    #[track_caller]
    pub fn m32(self, buf: &mut CodeBuffer, src: Mem) {
        mem_op(buf, 0xD8, self.digit(), src);
    }

    /// `fop qword [mem]`
    #[track_caller]
    pub fn m64(self, buf: &mut CodeBuffer, src: Mem) {
        mem_op(buf, 0xDC, self.digit(), src);
    }

    /// `fiop dword [mem]`: 32-bit integer operand.
    #[track_caller]
    pub fn m32_int(self, buf: &mut CodeBuffer, src: Mem) {
        mem_op(buf, 0xDA, self.digit(), src);
    }

    /// `fop st(0), st(i)`
    #[track_caller]
    pub fn st0_sti(self, buf: &mut CodeBuffer, src: St) {
        stack_op(buf, 0xD8, self.digit(), src);
    }

    /// `fop st(i), st(0)`
    ///
    /// # Panics
    ///
    /// Panics for `Com` and `Comp`.
    #[track_caller]
    pub fn sti_st0(self, buf: &mut CodeBuffer, dst: St) {
        stack_op(buf, 0xDC, self.reversed_digit(), dst);
    }

    /// `fopp st(i), st(0)`: like [`sti_st0`](Self::sti_st0), then pop.
    #[track_caller]
    pub fn pop(self, buf: &mut CodeBuffer, dst: St) {
        stack_op(buf, 0xDE, self.reversed_digit(), dst);
    }
}

// ─── Loads and stores ───────────────────────────────────────

/// `fld dword [mem]`
#[track_caller]
pub fn fld_m32(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xD9, 0, src);
}

/// `fld qword [mem]`
#[track_caller]
pub fn fld_m64(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xDD, 0, src);
}

/// `fld tword [mem]`
#[track_caller]
pub fn fld_m80(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xDB, 5, src);
}

/// `fld st(i)`
pub fn fld_st(buf: &mut CodeBuffer, src: St) {
    stack_op(buf, 0xD9, 0, src);
}

/// `fst dword [mem]`
#[track_caller]
pub fn fst_m32(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xD9, 2, dst);
}

/// `fst qword [mem]`
#[track_caller]
pub fn fst_m64(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDD, 2, dst);
}

/// `fst st(i)`
pub fn fst_st(buf: &mut CodeBuffer, dst: St) {
    stack_op(buf, 0xDD, 2, dst);
}

/// `fstp dword [mem]`
#[track_caller]
pub fn fstp_m32(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xD9, 3, dst);
}

/// `fstp qword [mem]`
#[track_caller]
pub fn fstp_m64(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDD, 3, dst);
}

/// `fstp tword [mem]`
#[track_caller]
pub fn fstp_m80(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDB, 7, dst);
}

/// `fstp st(i)`
pub fn fstp_st(buf: &mut CodeBuffer, dst: St) {
    stack_op(buf, 0xDD, 3, dst);
}

/// `fild dword [mem]`
#[track_caller]
pub fn fild_m32(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xDB, 0, src);
}

/// `fild qword [mem]`
#[track_caller]
pub fn fild_m64(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xDF, 5, src);
}

/// `fist dword [mem]`
#[track_caller]
pub fn fist_m32(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDB, 2, dst);
}

/// `fistp dword [mem]`
#[track_caller]
pub fn fistp_m32(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDB, 3, dst);
}

/// `fistp qword [mem]`
#[track_caller]
pub fn fistp_m64(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDF, 7, dst);
}

/// `fldcw word [mem]`
#[track_caller]
pub fn fldcw(buf: &mut CodeBuffer, src: Mem) {
    mem_op(buf, 0xD9, 5, src);
}

/// `fnstcw word [mem]`
#[track_caller]
pub fn fnstcw(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xD9, 7, dst);
}

/// `fnstsw word [mem]`
#[track_caller]
pub fn fnstsw_m(buf: &mut CodeBuffer, dst: Mem) {
    mem_op(buf, 0xDD, 7, dst);
}

// ─── Register forms ─────────────────────────────────────────

/// `fxch st(i)`
pub fn fxch(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xD9, 1, other);
}

/// `ffree st(i)`
pub fn ffree(buf: &mut CodeBuffer, slot: St) {
    stack_op(buf, 0xDD, 0, slot);
}

/// `fcomi st(0), st(i)`
pub fn fcomi(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDB, 6, other);
}

/// `fcomip st(0), st(i)`
pub fn fcomip(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDF, 6, other);
}

/// `fucomi st(0), st(i)`
pub fn fucomi(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDB, 5, other);
}

/// `fucomip st(0), st(i)`
pub fn fucomip(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDF, 5, other);
}

/// `fucom st(i)`
pub fn fucom(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDD, 4, other);
}

/// `fucomp st(i)`
pub fn fucomp(buf: &mut CodeBuffer, other: St) {
    stack_op(buf, 0xDD, 5, other);
}

/// `FCMOVcc st(0), st(i)`: the eight EFLAGS conditions x87 supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fcmov {
    B,
    E,
    Be,
    U,
    Nb,
    Ne,
    Nbe,
    Nu,
}

impl Fcmov {
    /// `fcmovcc st(0), st(i)`
    pub fn emit(self, buf: &mut CodeBuffer, src: St) {
        let n = self as u8;
        let opcode = if n < 4 { 0xDA } else { 0xDB };
        stack_op(buf, opcode, n & 3, src);
    }
}

// ─── Zero-operand table ─────────────────────────────────────

/// x87 instructions without operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FpuFixed {
    Fld1,
    Fldz,
    Fldpi,
    Fldl2e,
    Fldl2t,
    Fldlg2,
    Fldln2,
    Fchs,
    Fabs,
    Ftst,
    Fxam,
    Fsqrt,
    Fsin,
    Fcos,
    Fsincos,
    Fptan,
    Fpatan,
    Frndint,
    Fscale,
    Fprem,
    Fprem1,
    F2xm1,
    Fyl2x,
    Fyl2xp1,
    Fxtract,
    Fdecstp,
    Fincstp,
    Fnop,
    Fcompp,
    Fucompp,
    Fninit,
    Fnclex,
    /// `fnstsw ax`
    FnstswAx,
    Fwait,
}

impl FpuFixed {
    /// Encoding.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            FpuFixed::Fld1 => &[0xD9, 0xE8],
            FpuFixed::Fldz => &[0xD9, 0xEE],
            FpuFixed::Fldpi => &[0xD9, 0xEB],
            FpuFixed::Fldl2e => &[0xD9, 0xEA],
            FpuFixed::Fldl2t => &[0xD9, 0xE9],
            FpuFixed::Fldlg2 => &[0xD9, 0xEC],
            FpuFixed::Fldln2 => &[0xD9, 0xED],
            FpuFixed::Fchs => &[0xD9, 0xE0],
            FpuFixed::Fabs => &[0xD9, 0xE1],
            FpuFixed::Ftst => &[0xD9, 0xE4],
            FpuFixed::Fxam => &[0xD9, 0xE5],
            FpuFixed::Fsqrt => &[0xD9, 0xFA],
            FpuFixed::Fsin => &[0xD9, 0xFE],
            FpuFixed::Fcos => &[0xD9, 0xFF],
            FpuFixed::Fsincos => &[0xD9, 0xFB],
            FpuFixed::Fptan => &[0xD9, 0xF2],
            FpuFixed::Fpatan => &[0xD9, 0xF3],
            FpuFixed::Frndint => &[0xD9, 0xFC],
            FpuFixed::Fscale => &[0xD9, 0xFD],
            FpuFixed::Fprem => &[0xD9, 0xF8],
            FpuFixed::Fprem1 => &[0xD9, 0xF5],
            FpuFixed::F2xm1 => &[0xD9, 0xF0],
            FpuFixed::Fyl2x => &[0xD9, 0xF1],
            FpuFixed::Fyl2xp1 => &[0xD9, 0xF9],
            FpuFixed::Fxtract => &[0xD9, 0xF4],
            FpuFixed::Fdecstp => &[0xD9, 0xF6],
            FpuFixed::Fincstp => &[0xD9, 0xF7],
            FpuFixed::Fnop => &[0xD9, 0xD0],
            FpuFixed::Fcompp => &[0xDE, 0xD9],
            FpuFixed::Fucompp => &[0xDA, 0xE9],
            FpuFixed::Fninit => &[0xDB, 0xE3],
            FpuFixed::Fnclex => &[0xDB, 0xE2],
            FpuFixed::FnstswAx => &[0xDF, 0xE0],
            FpuFixed::Fwait => &[0x9B],
        }
    }

    /// Emit the instruction.
    pub fn emit(self, buf: &mut CodeBuffer) {
        emit_plain(buf, OpSpec::new(self.bytes()));
    }
}
