//! Integer opcode-family templates.
//!
//! Each family is an operation selector (a small enum whose discriminant is
//! the opcode extension or opcode byte) plus one generic emitter per
//! operand shape. The operand width comes from the register type, so
//! `Group1::Add.rr(buf, Reg32::EAX, Reg32::ECX)` and
//! `Group1::Add.rr(buf, Reg64::RAX, Reg64::RCX)` share one code path and
//! differ only in prefixes.

use crate::buffer::CodeBuffer;
use crate::encoder::{
    choose_imm_form, emit_imm_sized, emit_o, emit_plain, emit_rm_op, imm_for, ImmForm, ImmSize,
    OpSpec, RegField, Rm,
};
use crate::error::{fatal, EmitError};
use crate::jump::Cond;
use crate::operand::{GpReg, Mem, OperandSize, Ptr, Reg8};

/// Opcode of a form that exists in a byte variant (`op`) and a
/// word/dword/qword variant (`op + 1`).
#[inline]
fn wide(byte_form: u8, size: OperandSize) -> u8 {
    if size == OperandSize::Byte {
        byte_form
    } else {
        byte_form + 1
    }
}

#[track_caller]
fn reject_byte(size: OperandSize, what: &str) {
    assert!(size != OperandSize::Byte, "{} has no byte form", what);
}

/// Abort unless `size` is the native stack/branch width of the buffer's mode
/// (16-bit being accepted where `allow_word` is set).
#[track_caller]
fn require_native(buf: &CodeBuffer, size: OperandSize, allow_word: bool, what: &str) {
    let native = if buf.mode().is_64() {
        OperandSize::Qword
    } else {
        OperandSize::Dword
    };
    if size != native && !(allow_word && size == OperandSize::Word) {
        fatal(EmitError::ModeMismatch {
            detail: alloc::format!("{} with a {} operand", what, size),
            mode: buf.mode(),
        });
    }
}

// ─── Group 1: ADD OR ADC SBB AND SUB XOR CMP ────────────────

/// The eight arithmetic/logic operations sharing opcodes `00`–`3D` and
/// `80`–`83`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Group1 {
    Add = 0,
    Or = 1,
    Adc = 2,
    Sbb = 3,
    And = 4,
    Sub = 5,
    Xor = 6,
    Cmp = 7,
}

impl Group1 {
    /// All eight operations, in opcode order.
    pub const ALL: [Group1; 8] = [
        Group1::Add,
        Group1::Or,
        Group1::Adc,
        Group1::Sbb,
        Group1::And,
        Group1::Sub,
        Group1::Xor,
        Group1::Cmp,
    ];

    /// Operation selector: ModR/M.reg of the immediate forms, bits 3–5 of
    /// the register forms.
    pub fn digit(self) -> u8 {
        self as u8
    }

    fn base(self) -> u8 {
        self.digit() << 3
    }

    /// `op dst, src`
    ///
    /// # Examples
    ///
    /// ```
    /// use x86_emit::{CodeBuffer, Group1, Reg32};
    ///
    /// let mut buf = CodeBuffer::new();
    /// Group1::Sub.rr(&mut buf, Reg32::EDX, Reg32::EBX);
    /// assert_eq!(buf.as_slice(), &[0x29, 0xDA]);
    /// ```
    #[track_caller]
    pub fn rr<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: R) {
        let op = wide(self.base(), R::SIZE);
        emit_rm_op(buf, OpSpec::sized(&[op], R::SIZE), RegField::gp(src), &Rm::gp(dst));
    }

    /// `op dst, [src]`
    #[track_caller]
    pub fn rm<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: Mem) {
        let op = wide(self.base() | 2, R::SIZE);
        emit_rm_op(buf, OpSpec::sized(&[op], R::SIZE), RegField::gp(dst), &Rm::Mem(src));
    }

    /// `op [dst], src`
    #[track_caller]
    pub fn mr<R: GpReg>(self, buf: &mut CodeBuffer, dst: Mem, src: R) {
        let op = wide(self.base(), R::SIZE);
        emit_rm_op(buf, OpSpec::sized(&[op], R::SIZE), RegField::gp(src), &Rm::Mem(dst));
    }

    /// `op dst, imm`, choosing the shortest immediate form.
    ///
    /// `imm` is taken as a value of the operand width, signed or unsigned;
    /// 64-bit operations sign-extend a 32-bit immediate.
    ///
    /// # Panics
    ///
    /// Panics if `imm` does not fit the operand width.
    #[track_caller]
    pub fn ri<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, imm: i64) {
        let size = R::SIZE;
        let value = imm_for(imm, size);
        let accumulator = dst.id() == 0 && !dst.is_high_byte();
        match choose_imm_form(value, size, accumulator) {
            ImmForm::SignExtended8 => {
                emit_rm_op(
                    buf,
                    OpSpec::sized(&[0x83], size),
                    RegField::digit(self.digit()),
                    &Rm::gp(dst),
                );
                emit_imm_sized(buf, value, ImmSize::I8);
            }
            ImmForm::Accumulator => {
                let op = if size == OperandSize::Byte {
                    self.base() | 4
                } else {
                    self.base() | 5
                };
                emit_plain(buf, OpSpec::sized(&[op], size));
                emit_imm_sized(buf, value, ImmSize::for_operand(size));
            }
            ImmForm::Full => {
                emit_rm_op(
                    buf,
                    OpSpec::sized(&[wide(0x80, size)], size),
                    RegField::digit(self.digit()),
                    &Rm::gp(dst),
                );
                emit_imm_sized(buf, value, ImmSize::for_operand(size));
            }
        }
    }

    /// `op size [dst], imm`
    #[track_caller]
    pub fn mi(self, buf: &mut CodeBuffer, dst: Ptr, imm: i64) {
        let size = dst.size;
        let value = imm_for(imm, size);
        if choose_imm_form(value, size, false) == ImmForm::SignExtended8 {
            emit_rm_op(
                buf,
                OpSpec::sized(&[0x83], size),
                RegField::digit(self.digit()),
                &Rm::Mem(dst.mem),
            );
            emit_imm_sized(buf, value, ImmSize::I8);
        } else {
            emit_rm_op(
                buf,
                OpSpec::sized(&[wide(0x80, size)], size),
                RegField::digit(self.digit()),
                &Rm::Mem(dst.mem),
            );
            emit_imm_sized(buf, value, ImmSize::for_operand(size));
        }
    }
}

// ─── Group 2: shifts and rotates ────────────────────────────

/// Shift and rotate operations (`C0`/`C1`, `D0`–`D3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Group2 {
    Rol = 0,
    Ror = 1,
    Rcl = 2,
    Rcr = 3,
    Shl = 4,
    Shr = 5,
    Sar = 7,
}

impl Group2 {
    /// `SAL` is `SHL`.
    pub const SAL: Group2 = Group2::Shl;

    /// All seven operations.
    pub const ALL: [Group2; 7] = [
        Group2::Rol,
        Group2::Ror,
        Group2::Rcl,
        Group2::Rcr,
        Group2::Shl,
        Group2::Shr,
        Group2::Sar,
    ];

    /// Opcode extension.
    pub fn digit(self) -> u8 {
        self as u8
    }

    #[track_caller]
    fn emit_imm(self, buf: &mut CodeBuffer, size: OperandSize, rm: &Rm, count: u8) {
        if count == 0 {
            return;
        }
        let digit = RegField::digit(self.digit());
        if count == 1 {
            emit_rm_op(buf, OpSpec::sized(&[wide(0xD0, size)], size), digit, rm);
        } else {
            emit_rm_op(buf, OpSpec::sized(&[wide(0xC0, size)], size), digit, rm);
            buf.emit_u8(count);
        }
    }

    /// `op dst, count`. A count of 1 uses the short `D0`/`D1` form; a
    /// count of 0 emits nothing.
    #[track_caller]
    pub fn ri<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, count: u8) {
        self.emit_imm(buf, R::SIZE, &Rm::gp(dst), count);
    }

    /// `op size [dst], count`
    #[track_caller]
    pub fn mi(self, buf: &mut CodeBuffer, dst: Ptr, count: u8) {
        self.emit_imm(buf, dst.size, &Rm::Mem(dst.mem), count);
    }

    /// `op dst, cl`
    #[track_caller]
    pub fn r_cl<R: GpReg>(self, buf: &mut CodeBuffer, dst: R) {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xD2, R::SIZE)], R::SIZE),
            RegField::digit(self.digit()),
            &Rm::gp(dst),
        );
    }

    /// `op size [dst], cl`
    #[track_caller]
    pub fn m_cl(self, buf: &mut CodeBuffer, dst: Ptr) {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xD2, dst.size)], dst.size),
            RegField::digit(self.digit()),
            &Rm::Mem(dst.mem),
        );
    }
}

// ─── Group 3: single-operand arithmetic ─────────────────────

/// `F6`/`F7` unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Group3 {
    Not = 2,
    Neg = 3,
    Mul = 4,
    Imul = 5,
    Div = 6,
    Idiv = 7,
}

impl Group3 {
    /// Opcode extension.
    pub fn digit(self) -> u8 {
        self as u8
    }

    /// `op reg`
    #[track_caller]
    pub fn r<R: GpReg>(self, buf: &mut CodeBuffer, reg: R) {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xF6, R::SIZE)], R::SIZE),
            RegField::digit(self.digit()),
            &Rm::gp(reg),
        );
    }

    /// `op size [mem]`
    #[track_caller]
    pub fn m(self, buf: &mut CodeBuffer, mem: Ptr) {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xF6, mem.size)], mem.size),
            RegField::digit(self.digit()),
            &Rm::Mem(mem.mem),
        );
    }
}

/// Increment and decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IncDec {
    Inc = 0,
    Dec = 1,
}

impl IncDec {
    /// Opcode extension of the `FE`/`FF` forms.
    pub fn digit(self) -> u8 {
        self as u8
    }

    /// `inc reg` / `dec reg`. Uses the one-byte `40+r`/`48+r` form in
    /// 32-bit mode.
    #[track_caller]
    pub fn r<R: GpReg>(self, buf: &mut CodeBuffer, reg: R) {
        if !buf.mode().is_64() && R::SIZE != OperandSize::Byte {
            let op = 0x40 | (self.digit() << 3);
            emit_o(buf, OpSpec::sized(&[op], R::SIZE), RegField::gp(reg));
            return;
        }
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xFE, R::SIZE)], R::SIZE),
            RegField::digit(self.digit()),
            &Rm::gp(reg),
        );
    }

    /// `inc size [mem]` / `dec size [mem]`
    #[track_caller]
    pub fn m(self, buf: &mut CodeBuffer, mem: Ptr) {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xFE, mem.size)], mem.size),
            RegField::digit(self.digit()),
            &Rm::Mem(mem.mem),
        );
    }
}

// ─── Moves ──────────────────────────────────────────────────

/// `mov dst, src`
#[track_caller]
pub fn mov_rr<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: R) {
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x88, R::SIZE)], R::SIZE),
        RegField::gp(src),
        &Rm::gp(dst),
    );
}

/// Whether the `A0`–`A3` moffs form applies: accumulator and an absolute
/// address in 32-bit mode.
fn moffs<R: GpReg>(buf: &CodeBuffer, reg: R, mem: &Mem) -> Option<u32> {
    match *mem {
        Mem::Absolute(addr) if !buf.mode().is_64() && reg.id() == 0 && !reg.is_high_byte() => {
            u32::try_from(addr).ok()
        }
        _ => None,
    }
}

/// `mov dst, [src]`
#[track_caller]
pub fn mov_rm<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: Mem) {
    if let Some(addr) = moffs(buf, dst, &src) {
        emit_plain(buf, OpSpec::sized(&[wide(0xA0, R::SIZE)], R::SIZE));
        buf.emit_u32(addr);
        return;
    }
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x8A, R::SIZE)], R::SIZE),
        RegField::gp(dst),
        &Rm::Mem(src),
    );
}

/// `mov [dst], src`
#[track_caller]
pub fn mov_mr<R: GpReg>(buf: &mut CodeBuffer, dst: Mem, src: R) {
    if let Some(addr) = moffs(buf, src, &dst) {
        emit_plain(buf, OpSpec::sized(&[wide(0xA2, R::SIZE)], R::SIZE));
        buf.emit_u32(addr);
        return;
    }
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x88, R::SIZE)], R::SIZE),
        RegField::gp(src),
        &Rm::Mem(dst),
    );
}

/// `mov dst, imm`
///
/// 64-bit destinations pick the shortest of `mov r32, imm32` (zero
/// extending), `mov r/m64, simm32` and `mov r64, imm64`.
///
/// # Panics
///
/// Panics if `imm` does not fit an operand narrower than 64 bits.
#[track_caller]
pub fn mov_ri<R: GpReg>(buf: &mut CodeBuffer, dst: R, imm: i64) {
    let size = R::SIZE;
    let reg = RegField::gp(dst);
    match size {
        OperandSize::Byte => {
            let value = imm_for(imm, size);
            emit_o(buf, OpSpec::new(&[0xB0]), reg);
            emit_imm_sized(buf, value, ImmSize::I8);
        }
        OperandSize::Word | OperandSize::Dword => {
            let value = imm_for(imm, size);
            emit_o(buf, OpSpec::sized(&[0xB8], size), reg);
            emit_imm_sized(buf, value, ImmSize::for_operand(size));
        }
        OperandSize::Qword => {
            if u32::try_from(imm).is_ok() {
                emit_o(buf, OpSpec::new(&[0xB8]), reg);
                emit_imm_sized(buf, imm, ImmSize::I32);
            } else if i32::try_from(imm).is_ok() {
                emit_rm_op(buf, OpSpec::sized(&[0xC7], size), RegField::digit(0), &Rm::gp(dst));
                emit_imm_sized(buf, imm, ImmSize::I32);
            } else {
                emit_o(buf, OpSpec::sized(&[0xB8], size), reg);
                emit_imm_sized(buf, imm, ImmSize::I64);
            }
        }
    }
}

/// `mov size [dst], imm`
#[track_caller]
pub fn mov_mi(buf: &mut CodeBuffer, dst: Ptr, imm: i64) {
    let size = dst.size;
    let value = imm_for(imm, size);
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0xC6, size)], size),
        RegField::digit(0),
        &Rm::Mem(dst.mem),
    );
    emit_imm_sized(buf, value, ImmSize::for_operand(size));
}

/// Zero or sign extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extend {
    /// `MOVZX`
    Zero,
    /// `MOVSX` / `MOVSXD`
    Sign,
}

/// Move with extension from a narrower source.
///
/// A zero-extended dword source lowers to `mov r32, r32`, which clears the
/// upper half implicitly.
///
/// # Panics
///
/// Panics unless the source is narrower than the destination.
#[track_caller]
pub fn movx<D: GpReg, S: GpReg>(buf: &mut CodeBuffer, kind: Extend, dst: D, src: S) {
    movx_rm(buf, kind, dst, S::SIZE, &Rm::gp(src));
}

/// Move with extension from memory of width `src.size`.
#[track_caller]
pub fn movx_m<D: GpReg>(buf: &mut CodeBuffer, kind: Extend, dst: D, src: Ptr) {
    movx_rm(buf, kind, dst, src.size, &Rm::Mem(src.mem));
}

#[track_caller]
fn movx_rm<D: GpReg>(buf: &mut CodeBuffer, kind: Extend, dst: D, src_size: OperandSize, src: &Rm) {
    assert!(
        src_size.bytes() < D::SIZE.bytes(),
        "extension from {} into {} register",
        src_size,
        D::SIZE
    );
    let reg = RegField::gp(dst);
    let op: &[u8] = match (kind, src_size) {
        (Extend::Zero, OperandSize::Byte) => &[0x0F, 0xB6],
        (Extend::Zero, OperandSize::Word) => &[0x0F, 0xB7],
        (Extend::Sign, OperandSize::Byte) => &[0x0F, 0xBE],
        (Extend::Sign, OperandSize::Word) => &[0x0F, 0xBF],
        (Extend::Zero, _) => {
            // mov r32, r/m32
            emit_rm_op(buf, OpSpec::new(&[0x8B]), reg, src);
            return;
        }
        (Extend::Sign, _) => &[0x63],
    };
    emit_rm_op(buf, OpSpec::sized(op, D::SIZE), reg, src);
}

/// `lea dst, [src]`
#[track_caller]
pub fn lea<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: Mem) {
    reject_byte(R::SIZE, "lea");
    emit_rm_op(buf, OpSpec::sized(&[0x8D], R::SIZE), RegField::gp(dst), &Rm::Mem(src));
}

// ─── TEST, XCHG ─────────────────────────────────────────────

/// `test a, b`
#[track_caller]
pub fn test_rr<R: GpReg>(buf: &mut CodeBuffer, a: R, b: R) {
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x84, R::SIZE)], R::SIZE),
        RegField::gp(b),
        &Rm::gp(a),
    );
}

/// `test [a], b`
#[track_caller]
pub fn test_mr<R: GpReg>(buf: &mut CodeBuffer, a: Mem, b: R) {
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x84, R::SIZE)], R::SIZE),
        RegField::gp(b),
        &Rm::Mem(a),
    );
}

/// `test reg, imm`. TEST has no sign-extended byte form; the accumulator
/// form is used for AL/AX/EAX/RAX.
#[track_caller]
pub fn test_ri<R: GpReg>(buf: &mut CodeBuffer, reg: R, imm: i64) {
    let size = R::SIZE;
    let value = imm_for(imm, size);
    if reg.id() == 0 && !reg.is_high_byte() {
        emit_plain(buf, OpSpec::sized(&[wide(0xA8, size)], size));
    } else {
        emit_rm_op(
            buf,
            OpSpec::sized(&[wide(0xF6, size)], size),
            RegField::digit(0),
            &Rm::gp(reg),
        );
    }
    emit_imm_sized(buf, value, ImmSize::for_operand(size));
}

/// `test size [mem], imm`
#[track_caller]
pub fn test_mi(buf: &mut CodeBuffer, mem: Ptr, imm: i64) {
    let size = mem.size;
    let value = imm_for(imm, size);
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0xF6, size)], size),
        RegField::digit(0),
        &Rm::Mem(mem.mem),
    );
    emit_imm_sized(buf, value, ImmSize::for_operand(size));
}

/// `xchg a, b`
#[track_caller]
pub fn xchg_rr<R: GpReg>(buf: &mut CodeBuffer, a: R, b: R) {
    let size = R::SIZE;
    if size != OperandSize::Byte {
        // 87 C0 keeps the zero-extension of xchg eax, eax in long mode;
        // 90 there is a plain NOP.
        let trivial = a.id() == 0 && b.id() == 0 && buf.mode().is_64() && size == OperandSize::Dword;
        if !trivial && (a.id() == 0 || b.id() == 0) {
            let other = if a.id() == 0 { b } else { a };
            emit_o(buf, OpSpec::sized(&[0x90], size), RegField::gp(other));
            return;
        }
    }
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x86, size)], size),
        RegField::gp(b),
        &Rm::gp(a),
    );
}

/// `xchg [a], b`
#[track_caller]
pub fn xchg_mr<R: GpReg>(buf: &mut CodeBuffer, a: Mem, b: R) {
    emit_rm_op(
        buf,
        OpSpec::sized(&[wide(0x86, R::SIZE)], R::SIZE),
        RegField::gp(b),
        &Rm::Mem(a),
    );
}

// ─── Conditional moves and sets ─────────────────────────────

/// `cmovcc dst, src`
#[track_caller]
pub fn cmov_rr<R: GpReg>(buf: &mut CodeBuffer, cond: Cond, dst: R, src: R) {
    reject_byte(R::SIZE, "cmov");
    emit_rm_op(
        buf,
        OpSpec::sized(&[0x0F, 0x40 | cond.code()], R::SIZE),
        RegField::gp(dst),
        &Rm::gp(src),
    );
}

/// `cmovcc dst, [src]`
#[track_caller]
pub fn cmov_rm<R: GpReg>(buf: &mut CodeBuffer, cond: Cond, dst: R, src: Mem) {
    reject_byte(R::SIZE, "cmov");
    emit_rm_op(
        buf,
        OpSpec::sized(&[0x0F, 0x40 | cond.code()], R::SIZE),
        RegField::gp(dst),
        &Rm::Mem(src),
    );
}

/// `setcc dst`
#[track_caller]
pub fn setcc(buf: &mut CodeBuffer, cond: Cond, dst: Reg8) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x90 | cond.code()]),
        RegField::digit(0),
        &Rm::gp(dst),
    );
}

/// `setcc byte [dst]`
#[track_caller]
pub fn setcc_m(buf: &mut CodeBuffer, cond: Cond, dst: Mem) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x90 | cond.code()]),
        RegField::digit(0),
        &Rm::Mem(dst),
    );
}

// ─── Bit operations ─────────────────────────────────────────

/// Bit test family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitTest {
    Bt = 4,
    Bts = 5,
    Btr = 6,
    Btc = 7,
}

impl BitTest {
    /// Opcode extension of the `0F BA` immediate form.
    pub fn digit(self) -> u8 {
        self as u8
    }

    fn reg_opcode(self) -> u8 {
        0xA3 + ((self.digit() - 4) << 3)
    }

    /// `bt dst, bit`
    #[track_caller]
    pub fn rr<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, bit: R) {
        reject_byte(R::SIZE, "bit test");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, self.reg_opcode()], R::SIZE),
            RegField::gp(bit),
            &Rm::gp(dst),
        );
    }

    /// `bt dst, imm8`
    #[track_caller]
    pub fn ri<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, bit: u8) {
        reject_byte(R::SIZE, "bit test");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, 0xBA], R::SIZE),
            RegField::digit(self.digit()),
            &Rm::gp(dst),
        );
        buf.emit_u8(bit);
    }

    /// `bt size [dst], imm8`
    #[track_caller]
    pub fn mi(self, buf: &mut CodeBuffer, dst: Ptr, bit: u8) {
        reject_byte(dst.size, "bit test");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, 0xBA], dst.size),
            RegField::digit(self.digit()),
            &Rm::Mem(dst.mem),
        );
        buf.emit_u8(bit);
    }
}

/// Bit scan forward/reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitScan {
    Bsf = 0xBC,
    Bsr = 0xBD,
}

impl BitScan {
    /// `bsf dst, src`
    #[track_caller]
    pub fn rr<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: R) {
        reject_byte(R::SIZE, "bit scan");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, self as u8], R::SIZE),
            RegField::gp(dst),
            &Rm::gp(src),
        );
    }

    /// `bsf dst, [src]`
    #[track_caller]
    pub fn rm<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: Mem) {
        reject_byte(R::SIZE, "bit scan");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, self as u8], R::SIZE),
            RegField::gp(dst),
            &Rm::Mem(src),
        );
    }
}

/// Double-precision shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DoubleShift {
    Shld = 0xA4,
    Shrd = 0xAC,
}

impl DoubleShift {
    /// `shld dst, src, count`
    #[track_caller]
    pub fn rri<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: R, count: u8) {
        reject_byte(R::SIZE, "double shift");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, self as u8], R::SIZE),
            RegField::gp(src),
            &Rm::gp(dst),
        );
        buf.emit_u8(count);
    }

    /// `shld dst, src, cl`
    #[track_caller]
    pub fn rr_cl<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: R) {
        reject_byte(R::SIZE, "double shift");
        emit_rm_op(
            buf,
            OpSpec::sized(&[0x0F, self as u8 + 1], R::SIZE),
            RegField::gp(src),
            &Rm::gp(dst),
        );
    }
}

// ─── IMUL ───────────────────────────────────────────────────

/// `imul dst, src`
#[track_caller]
pub fn imul_rr<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: R) {
    reject_byte(R::SIZE, "two-operand imul");
    emit_rm_op(buf, OpSpec::sized(&[0x0F, 0xAF], R::SIZE), RegField::gp(dst), &Rm::gp(src));
}

/// `imul dst, [src]`
#[track_caller]
pub fn imul_rm<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: Mem) {
    reject_byte(R::SIZE, "two-operand imul");
    emit_rm_op(buf, OpSpec::sized(&[0x0F, 0xAF], R::SIZE), RegField::gp(dst), &Rm::Mem(src));
}

/// `imul dst, src, imm`
#[track_caller]
pub fn imul_rri<R: GpReg>(buf: &mut CodeBuffer, dst: R, src: R, imm: i64) {
    reject_byte(R::SIZE, "three-operand imul");
    let value = imm_for(imm, R::SIZE);
    if choose_imm_form(value, R::SIZE, false) == ImmForm::SignExtended8 {
        emit_rm_op(buf, OpSpec::sized(&[0x6B], R::SIZE), RegField::gp(dst), &Rm::gp(src));
        emit_imm_sized(buf, value, ImmSize::I8);
    } else {
        emit_rm_op(buf, OpSpec::sized(&[0x69], R::SIZE), RegField::gp(dst), &Rm::gp(src));
        emit_imm_sized(buf, value, ImmSize::for_operand(R::SIZE));
    }
}

// ─── Stack and indirect branches ────────────────────────────

/// `push reg` (native width, or 16-bit)
#[track_caller]
pub fn push<R: GpReg>(buf: &mut CodeBuffer, reg: R) {
    require_native(buf, R::SIZE, true, "push");
    let op = OpSpec {
        opsize: R::SIZE == OperandSize::Word,
        ..OpSpec::new(&[0x50])
    };
    emit_o(buf, op, RegField::gp(reg));
}

/// `pop reg` (native width, or 16-bit)
#[track_caller]
pub fn pop<R: GpReg>(buf: &mut CodeBuffer, reg: R) {
    require_native(buf, R::SIZE, true, "pop");
    let op = OpSpec {
        opsize: R::SIZE == OperandSize::Word,
        ..OpSpec::new(&[0x58])
    };
    emit_o(buf, op, RegField::gp(reg));
}

/// `push imm`, using the sign-extended byte form where it fits.
#[track_caller]
pub fn push_imm(buf: &mut CodeBuffer, imm: i32) {
    if let Ok(b) = i8::try_from(imm) {
        buf.emit_bytes(&[0x6A, b as u8]);
    } else {
        buf.emit_u8(0x68);
        buf.emit_u32(imm as u32);
    }
}

/// `push [mem]` (native width)
#[track_caller]
pub fn push_m(buf: &mut CodeBuffer, mem: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0xFF]), RegField::digit(6), &Rm::Mem(mem));
}

/// `pop [mem]` (native width)
#[track_caller]
pub fn pop_m(buf: &mut CodeBuffer, mem: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0x8F]), RegField::digit(0), &Rm::Mem(mem));
}

/// `jmp reg`
#[track_caller]
pub fn jmp_r<R: GpReg>(buf: &mut CodeBuffer, target: R) {
    require_native(buf, R::SIZE, false, "indirect jmp");
    emit_rm_op(buf, OpSpec::new(&[0xFF]), RegField::digit(4), &Rm::gp(target));
}

/// `jmp [mem]`
#[track_caller]
pub fn jmp_m(buf: &mut CodeBuffer, target: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0xFF]), RegField::digit(4), &Rm::Mem(target));
}

/// `call reg`
#[track_caller]
pub fn call_r<R: GpReg>(buf: &mut CodeBuffer, target: R) {
    require_native(buf, R::SIZE, false, "indirect call");
    emit_rm_op(buf, OpSpec::new(&[0xFF]), RegField::digit(2), &Rm::gp(target));
}

/// `call [mem]`
#[track_caller]
pub fn call_m(buf: &mut CodeBuffer, target: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0xFF]), RegField::digit(2), &Rm::Mem(target));
}

/// `ret imm16`
#[track_caller]
pub fn ret_imm(buf: &mut CodeBuffer, pop_bytes: u16) {
    buf.emit_u8(0xC2);
    buf.emit_u16(pop_bytes);
}

// ─── Zero-operand instructions ──────────────────────────────

/// Instructions without operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fixed {
    Ret,
    Nop,
    Int3,
    Hlt,
    Cbw,
    Cwde,
    Cdqe,
    Cwd,
    Cdq,
    Cqo,
    Stc,
    Clc,
    Cmc,
    Std,
    Cld,
    Pause,
    Leave,
    Pushf,
    Popf,
    Sahf,
    Lahf,
    Cpuid,
    Rdtsc,
    Ud2,
    Emms,
    Lfence,
    Sfence,
    Mfence,
}

impl Fixed {
    /// Encoding.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Fixed::Ret => &[0xC3],
            Fixed::Nop => &[0x90],
            Fixed::Int3 => &[0xCC],
            Fixed::Hlt => &[0xF4],
            Fixed::Cbw => &[0x66, 0x98],
            Fixed::Cwde => &[0x98],
            Fixed::Cdqe => &[0x48, 0x98],
            Fixed::Cwd => &[0x66, 0x99],
            Fixed::Cdq => &[0x99],
            Fixed::Cqo => &[0x48, 0x99],
            Fixed::Stc => &[0xF9],
            Fixed::Clc => &[0xF8],
            Fixed::Cmc => &[0xF5],
            Fixed::Std => &[0xFD],
            Fixed::Cld => &[0xFC],
            Fixed::Pause => &[0xF3, 0x90],
            Fixed::Leave => &[0xC9],
            Fixed::Pushf => &[0x9C],
            Fixed::Popf => &[0x9D],
            Fixed::Sahf => &[0x9E],
            Fixed::Lahf => &[0x9F],
            Fixed::Cpuid => &[0x0F, 0xA2],
            Fixed::Rdtsc => &[0x0F, 0x31],
            Fixed::Ud2 => &[0x0F, 0x0B],
            Fixed::Emms => &[0x0F, 0x77],
            Fixed::Lfence => &[0x0F, 0xAE, 0xE8],
            Fixed::Sfence => &[0x0F, 0xAE, 0xF8],
            Fixed::Mfence => &[0x0F, 0xAE, 0xF0],
        }
    }

    /// Whether the instruction carries REX.W and so exists only in long
    /// mode.
    pub fn is_long_mode_only(self) -> bool {
        matches!(self, Fixed::Cdqe | Fixed::Cqo)
    }

    /// Emit the instruction.
    ///
    /// # Panics
    ///
    /// Panics for `CDQE`/`CQO` in 32-bit mode.
    #[track_caller]
    pub fn emit(self, buf: &mut CodeBuffer) {
        if self.is_long_mode_only() && !buf.mode().is_64() {
            fatal(EmitError::ModeMismatch {
                detail: alloc::format!("{:?}", self).to_lowercase(),
                mode: buf.mode(),
            });
        }
        buf.emit_bytes(self.bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::operand::{byte_ptr, dword_ptr, qword_ptr, Reg16, Reg32, Reg64};

    fn x86() -> CodeBuffer {
        CodeBuffer::for_mode(Mode::X86)
    }

    fn bytes(f: impl FnOnce(&mut CodeBuffer)) -> alloc::vec::Vec<u8> {
        let mut buf = CodeBuffer::new();
        f(&mut buf);
        buf.as_slice().to_vec()
    }

    fn bytes32(f: impl FnOnce(&mut CodeBuffer)) -> alloc::vec::Vec<u8> {
        let mut buf = x86();
        f(&mut buf);
        buf.as_slice().to_vec()
    }

    #[test]
    fn group1_rr_is_two_bytes() {
        for op in Group1::ALL {
            for dst in 0..8 {
                for src in 0..8 {
                    let b = bytes32(|buf| op.rr(buf, Reg32::new(dst), Reg32::new(src)));
                    assert_eq!(b, [op.digit() << 3 | 1, 0xC0 | src << 3 | dst]);
                }
            }
        }
    }

    #[test]
    fn group1_immediates() {
        // add eax, 5
        assert_eq!(bytes32(|b| Group1::Add.ri(b, Reg32::EAX, 5)), [0x83, 0xC0, 0x05]);
        // add eax, 0x1000: accumulator form
        assert_eq!(
            bytes32(|b| Group1::Add.ri(b, Reg32::EAX, 0x1000)),
            [0x05, 0x00, 0x10, 0x00, 0x00]
        );
        // cmp ecx, 0x1000
        assert_eq!(
            bytes32(|b| Group1::Cmp.ri(b, Reg32::ECX, 0x1000)),
            [0x81, 0xF9, 0x00, 0x10, 0x00, 0x00]
        );
        // and al, 0x0F
        assert_eq!(bytes(|b| Group1::And.ri(b, Reg8::AL, 0x0F)), [0x24, 0x0F]);
        // or bl, 0x80
        assert_eq!(bytes(|b| Group1::Or.ri(b, Reg8::BL, 0x80)), [0x80, 0xCB, 0x80]);
        // sub rsp, 0x28
        assert_eq!(
            bytes(|b| Group1::Sub.ri(b, Reg64::RSP, 0x28)),
            [0x48, 0x83, 0xEC, 0x28]
        );
        // xor ax, 0x1234
        assert_eq!(
            bytes(|b| Group1::Xor.ri(b, Reg16::AX, 0x1234)),
            [0x66, 0x35, 0x34, 0x12]
        );
        // and eax, 0xFFFFFFF0 (fits imm8 as -16)
        assert_eq!(
            bytes(|b| Group1::And.ri(b, Reg32::EAX, 0xFFFF_FFF0)),
            [0x83, 0xE0, 0xF0]
        );
    }

    #[test]
    fn group1_memory() {
        // add [esp+4], eax
        assert_eq!(
            bytes32(|b| Group1::Add.mr(b, Mem::base_disp(Reg32::ESP, 4), Reg32::EAX)),
            [0x01, 0x44, 0x24, 0x04]
        );
        // sub rax, [rbp-8]
        assert_eq!(
            bytes(|b| Group1::Sub.rm(b, Reg64::RAX, Mem::base_disp(Reg64::RBP, -8))),
            [0x48, 0x2B, 0x45, 0xF8]
        );
        // cmp dword [ebx], 7
        assert_eq!(
            bytes32(|b| Group1::Cmp.mi(b, dword_ptr(Mem::base(Reg32::EBX)), 7)),
            [0x83, 0x3B, 0x07]
        );
        // add byte [eax], 0x90
        assert_eq!(
            bytes32(|b| Group1::Add.mi(b, byte_ptr(Mem::base(Reg32::EAX)), 0x90)),
            [0x80, 0x00, 0x90]
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(bytes32(|b| Group2::Shl.ri(b, Reg32::EAX, 1)), [0xD1, 0xE0]);
        assert_eq!(bytes32(|b| Group2::Sar.ri(b, Reg32::EDX, 31)), [0xC1, 0xFA, 0x1F]);
        assert_eq!(bytes(|b| Group2::Shr.ri(b, Reg64::RCX, 3)), [0x48, 0xC1, 0xE9, 0x03]);
        assert_eq!(bytes32(|b| Group2::Rol.r_cl(b, Reg8::BL)), [0xD2, 0xC3]);
        assert!(bytes32(|b| Group2::Shl.ri(b, Reg32::EAX, 0)).is_empty());
        assert_eq!(
            bytes32(|b| Group2::Shr.mi(b, dword_ptr(Mem::base(Reg32::ECX)), 4)),
            [0xC1, 0x29, 0x04]
        );
        assert_eq!(Group2::SAL, Group2::Shl);
    }

    #[test]
    fn unary() {
        assert_eq!(bytes32(|b| Group3::Neg.r(b, Reg32::EAX)), [0xF7, 0xD8]);
        assert_eq!(bytes32(|b| Group3::Not.r(b, Reg8::CL)), [0xF6, 0xD1]);
        assert_eq!(bytes(|b| Group3::Idiv.r(b, Reg64::R10)), [0x49, 0xF7, 0xFA]);
        assert_eq!(
            bytes32(|b| Group3::Mul.m(b, dword_ptr(Mem::abs(0x1000)))),
            [0xF7, 0x25, 0x00, 0x10, 0x00, 0x00]
        );
    }

    #[test]
    fn inc_dec_short_forms_in_32bit_mode() {
        assert_eq!(bytes32(|b| IncDec::Inc.r(b, Reg32::EAX)), [0x40]);
        assert_eq!(bytes32(|b| IncDec::Dec.r(b, Reg32::EDI)), [0x4F]);
        assert_eq!(bytes32(|b| IncDec::Inc.r(b, Reg16::CX)), [0x66, 0x41]);
        assert_eq!(bytes32(|b| IncDec::Inc.r(b, Reg8::AL)), [0xFE, 0xC0]);
        assert_eq!(bytes(|b| IncDec::Inc.r(b, Reg32::EAX)), [0xFF, 0xC0]);
        assert_eq!(bytes(|b| IncDec::Dec.r(b, Reg64::RAX)), [0x48, 0xFF, 0xC8]);
        assert_eq!(
            bytes32(|b| IncDec::Inc.m(b, dword_ptr(Mem::base(Reg32::EAX)))),
            [0xFF, 0x00]
        );
    }

    #[test]
    fn moves() {
        assert_eq!(bytes32(|b| mov_rr(b, Reg32::EAX, Reg32::ECX)), [0x89, 0xC8]);
        assert_eq!(bytes32(|b| mov_ri(b, Reg32::EDX, 0x1234)), [0xBA, 0x34, 0x12, 0x00, 0x00]);
        assert_eq!(bytes32(|b| mov_ri(b, Reg8::AH, 1)), [0xB4, 0x01]);
        // accumulator moffs forms
        assert_eq!(
            bytes32(|b| mov_rm(b, Reg32::EAX, Mem::abs(0x1234))),
            [0xA1, 0x34, 0x12, 0x00, 0x00]
        );
        assert_eq!(
            bytes32(|b| mov_mr(b, Mem::abs(0x1234), Reg32::EAX)),
            [0xA3, 0x34, 0x12, 0x00, 0x00]
        );
        assert_eq!(
            bytes32(|b| mov_rm(b, Reg32::ECX, Mem::abs(0x1234))),
            [0x8B, 0x0D, 0x34, 0x12, 0x00, 0x00]
        );
        assert_eq!(
            bytes32(|b| mov_mi(b, dword_ptr(Mem::base_disp(Reg32::EBP, 8)), 5)),
            [0xC7, 0x45, 0x08, 0x05, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn mov_r64_immediate_forms() {
        // zero-extending 32-bit form
        assert_eq!(bytes(|b| mov_ri(b, Reg64::RAX, 1)), [0xB8, 1, 0, 0, 0]);
        assert_eq!(bytes(|b| mov_ri(b, Reg64::R8, 1)), [0x41, 0xB8, 1, 0, 0, 0]);
        // sign-extended imm32
        assert_eq!(
            bytes(|b| mov_ri(b, Reg64::RAX, -1)),
            [0x48, 0xC7, 0xC0, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        // full imm64
        assert_eq!(
            bytes(|b| mov_ri(b, Reg64::RCX, 0x1_0000_0000)),
            [0x48, 0xB9, 0, 0, 0, 0, 1, 0, 0, 0]
        );
    }

    #[test]
    fn extensions() {
        assert_eq!(bytes32(|b| movx(b, Extend::Zero, Reg32::EAX, Reg8::CL)), [0x0F, 0xB6, 0xC1]);
        assert_eq!(bytes32(|b| movx(b, Extend::Sign, Reg32::EAX, Reg16::CX)), [0x0F, 0xBF, 0xC1]);
        assert_eq!(bytes(|b| movx(b, Extend::Sign, Reg64::RAX, Reg32::ECX)), [0x48, 0x63, 0xC1]);
        assert_eq!(bytes(|b| movx(b, Extend::Zero, Reg64::RAX, Reg32::ECX)), [0x8B, 0xC1]);
        assert_eq!(
            bytes32(|b| movx_m(b, Extend::Zero, Reg32::EDX, byte_ptr(Mem::base(Reg32::ESI)))),
            [0x0F, 0xB6, 0x16]
        );
    }

    #[test]
    #[should_panic(expected = "extension from dword into dword register")]
    fn extension_must_widen() {
        bytes(|b| movx(b, Extend::Zero, Reg32::EAX, Reg32::ECX));
    }

    #[test]
    fn lea_sib() {
        let m = Mem::sib(Reg64::RCX, Reg64::RDX, 4, 8).unwrap();
        assert_eq!(bytes(|b| lea(b, Reg64::RAX, m)), [0x48, 0x8D, 0x44, 0x91, 0x08]);
    }

    #[test]
    fn test_and_xchg() {
        assert_eq!(bytes32(|b| test_rr(b, Reg32::EAX, Reg32::EAX)), [0x85, 0xC0]);
        assert_eq!(bytes32(|b| test_ri(b, Reg8::AL, 1)), [0xA8, 0x01]);
        assert_eq!(bytes32(|b| test_ri(b, Reg32::ECX, 1)), [0xF7, 0xC1, 1, 0, 0, 0]);
        assert_eq!(bytes32(|b| xchg_rr(b, Reg32::EAX, Reg32::EBX)), [0x93]);
        assert_eq!(bytes32(|b| xchg_rr(b, Reg32::ECX, Reg32::EDX)), [0x87, 0xD1]);
        assert_eq!(bytes(|b| xchg_rr(b, Reg32::EAX, Reg32::EAX)), [0x87, 0xC0]);
    }

    #[test]
    fn conditional() {
        assert_eq!(
            bytes32(|b| cmov_rr(b, Cond::Less, Reg32::EAX, Reg32::ECX)),
            [0x0F, 0x4C, 0xC1]
        );
        assert_eq!(bytes32(|b| setcc(b, Cond::Equal, Reg8::AL)), [0x0F, 0x94, 0xC0]);
        assert_eq!(bytes(|b| setcc(b, Cond::Above, Reg8::DIL)), [0x40, 0x0F, 0x97, 0xC7]);
    }

    #[test]
    fn bit_ops() {
        assert_eq!(bytes32(|b| BitTest::Bt.rr(b, Reg32::EAX, Reg32::ECX)), [0x0F, 0xA3, 0xC8]);
        assert_eq!(bytes32(|b| BitTest::Btc.rr(b, Reg32::EAX, Reg32::ECX)), [0x0F, 0xBB, 0xC8]);
        assert_eq!(bytes32(|b| BitTest::Bts.ri(b, Reg32::EDX, 3)), [0x0F, 0xBA, 0xEA, 0x03]);
        assert_eq!(bytes32(|b| BitScan::Bsr.rr(b, Reg32::EAX, Reg32::ECX)), [0x0F, 0xBD, 0xC1]);
        assert_eq!(
            bytes32(|b| DoubleShift::Shld.rri(b, Reg32::EAX, Reg32::EDX, 4)),
            [0x0F, 0xA4, 0xD0, 0x04]
        );
        assert_eq!(
            bytes32(|b| DoubleShift::Shrd.rr_cl(b, Reg32::EAX, Reg32::EDX)),
            [0x0F, 0xAD, 0xD0]
        );
    }

    #[test]
    fn imul_forms() {
        assert_eq!(bytes32(|b| imul_rr(b, Reg32::EAX, Reg32::ECX)), [0x0F, 0xAF, 0xC1]);
        assert_eq!(bytes32(|b| imul_rri(b, Reg32::EAX, Reg32::ECX, 10)), [0x6B, 0xC1, 0x0A]);
        assert_eq!(
            bytes32(|b| imul_rri(b, Reg32::EAX, Reg32::ECX, 1000)),
            [0x69, 0xC1, 0xE8, 0x03, 0x00, 0x00]
        );
    }

    #[test]
    fn stack_and_indirect() {
        assert_eq!(bytes(|b| push(b, Reg64::RBP)), [0x55]);
        assert_eq!(bytes(|b| pop(b, Reg64::R15)), [0x41, 0x5F]);
        assert_eq!(bytes32(|b| push(b, Reg32::EBX)), [0x53]);
        assert_eq!(bytes32(|b| push_imm(b, 1)), [0x6A, 0x01]);
        assert_eq!(bytes32(|b| push_imm(b, 0x1000)), [0x68, 0x00, 0x10, 0x00, 0x00]);
        assert_eq!(bytes(|b| call_r(b, Reg64::RAX)), [0xFF, 0xD0]);
        assert_eq!(bytes(|b| jmp_r(b, Reg64::R11)), [0x41, 0xFF, 0xE3]);
        assert_eq!(
            bytes(|b| call_m(b, Mem::base_disp(Reg64::RBX, 16))),
            [0xFF, 0x53, 0x10]
        );
        assert_eq!(bytes32(|b| ret_imm(b, 8)), [0xC2, 0x08, 0x00]);
    }

    #[test]
    #[should_panic(expected = "push with a dword operand is not encodable in x86-64 mode")]
    fn push_32bit_in_long_mode() {
        bytes(|b| push(b, Reg32::EAX));
    }

    #[test]
    fn fixed_table() {
        assert_eq!(bytes32(|b| Fixed::Cdq.emit(b)), [0x99]);
        assert_eq!(bytes(|b| Fixed::Cqo.emit(b)), [0x48, 0x99]);
        assert_eq!(bytes32(|b| Fixed::Pause.emit(b)), [0xF3, 0x90]);
        assert_eq!(bytes32(|b| Fixed::Rdtsc.emit(b)), [0x0F, 0x31]);
    }

    #[test]
    #[should_panic(expected = "cqo is not encodable in x86 mode")]
    fn cqo_needs_long_mode() {
        bytes32(|b| Fixed::Cqo.emit(b));
    }

    #[test]
    fn qword_memory_immediate() {
        assert_eq!(
            bytes(|b| Group1::Add.mi(b, qword_ptr(Mem::base(Reg64::RAX)), 0x100)),
            [0x48, 0x81, 0x00, 0x00, 0x01, 0x00, 0x00]
        );
    }
}
