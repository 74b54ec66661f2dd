//! Encoding primitives: REX, ModR/M, SIB, displacement and immediates.
//!
//! Field builders assert their preconditions. A field out of range is a bug
//! in the emitting template, never bad input, so it panics instead of
//! returning an error.

use crate::buffer::CodeBuffer;
use crate::config::Mode;
use crate::error::{fatal, EmitError};
use crate::operand::{AddressLayout, Disp, GpReg, Mem, OperandSize, VecReg};

// ─── Byte builders ──────────────────────────────────────────

/// Build a REX prefix byte.
#[inline]
pub fn rex(w: bool, r: bool, x: bool, b: bool) -> u8 {
    let mut val: u8 = 0x40;
    if w {
        val |= 0x08;
    }
    if r {
        val |= 0x04;
    }
    if x {
        val |= 0x02;
    }
    if b {
        val |= 0x01;
    }
    val
}

/// Build a ModR/M byte.
///
/// # Panics
///
/// Panics if `mod_bits >= 4`, `reg >= 8` or `rm >= 8`.
#[inline]
#[track_caller]
pub fn modrm(mod_bits: u8, reg: u8, rm: u8) -> u8 {
    assert!(mod_bits < 4, "ModR/M.mod {} out of range", mod_bits);
    assert!(reg < 8, "ModR/M.reg {} out of range", reg);
    assert!(rm < 8, "ModR/M.rm {} out of range", rm);
    (mod_bits << 6) | (reg << 3) | rm
}

/// Build a SIB byte from the two-bit scale field.
///
/// # Panics
///
/// Panics if `scale >= 4`, `index >= 8` or `base >= 8`.
#[inline]
#[track_caller]
pub fn sib(scale: u8, index: u8, base: u8) -> u8 {
    assert!(scale < 4, "SIB.scale {} out of range", scale);
    assert!(index < 8, "SIB.index {} out of range", index);
    assert!(base < 8, "SIB.base {} out of range", base);
    (scale << 6) | (index << 3) | base
}

/// Append a ModR/M byte.
#[inline]
#[track_caller]
pub fn emit_modrm(buf: &mut CodeBuffer, mod_bits: u8, reg: u8, rm: u8) {
    buf.emit_u8(modrm(mod_bits, reg, rm));
}

/// Append a SIB byte.
#[inline]
#[track_caller]
pub fn emit_sib(buf: &mut CodeBuffer, scale: u8, index: u8, base: u8) {
    buf.emit_u8(sib(scale, index, base));
}

/// Append a REX prefix.
///
/// # Panics
///
/// Panics in 32-bit mode, where 0x40–0x4F are `INC`/`DEC`.
#[inline]
#[track_caller]
pub fn emit_rex(buf: &mut CodeBuffer, w: bool, r: bool, x: bool, b: bool) {
    require_long_mode(buf.mode(), "REX prefix");
    buf.emit_u8(rex(w, r, x, b));
}

#[track_caller]
fn require_long_mode(mode: Mode, what: &str) {
    if !mode.is_64() {
        fatal(EmitError::ModeMismatch {
            detail: what.into(),
            mode,
        });
    }
}

/// Append ModR/M, optional SIB and displacement of a lowered memory
/// operand with `reg` in ModR/M.reg.
#[track_caller]
pub fn emit_address(buf: &mut CodeBuffer, reg: u8, layout: &AddressLayout) {
    emit_modrm(buf, layout.mod_bits, reg, layout.rm);
    if let Some(s) = layout.sib {
        emit_sib(buf, s.scale, s.index, s.base);
    }
    match layout.disp {
        Disp::None => {}
        Disp::I8(d) => buf.emit_u8(d as u8),
        Disp::I32(d) => buf.emit_u32(d as u32),
    }
}

/// Lower `mem` for the buffer's mode, aborting on operands the mode cannot
/// express.
#[track_caller]
pub(crate) fn lower(buf: &CodeBuffer, mem: &Mem) -> AddressLayout {
    match mem.layout(buf.mode()) {
        Ok(layout) => layout,
        Err(err) => fatal(err),
    }
}

// ─── Immediates ─────────────────────────────────────────────

/// Encoded immediate width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmSize {
    /// 1 byte.
    I8,
    /// 2 bytes.
    I16,
    /// 4 bytes.
    I32,
    /// 8 bytes.
    I64,
}

impl ImmSize {
    /// Encoded length in bytes.
    pub fn bytes(self) -> usize {
        match self {
            ImmSize::I8 => 1,
            ImmSize::I16 => 2,
            ImmSize::I32 => 4,
            ImmSize::I64 => 8,
        }
    }

    /// Full-width immediate of an operand size. 64-bit operations take a
    /// sign-extended imm32.
    pub fn for_operand(size: OperandSize) -> Self {
        match size {
            OperandSize::Byte => ImmSize::I8,
            OperandSize::Word => ImmSize::I16,
            OperandSize::Dword | OperandSize::Qword => ImmSize::I32,
        }
    }
}

/// A width-tagged constant.
pub trait Immediate: Copy {
    /// Encoded width.
    const SIZE: ImmSize;

    /// The value, sign- or zero-extended per its type.
    fn to_i64(self) -> i64;
}

macro_rules! immediate {
    ($($ty:ty => $size:ident),* $(,)?) => {
        $(
            impl Immediate for $ty {
                const SIZE: ImmSize = ImmSize::$size;

                #[inline]
                fn to_i64(self) -> i64 {
                    self as i64
                }
            }
        )*
    };
}

immediate!(
    i8 => I8, u8 => I8,
    i16 => I16, u16 => I16,
    i32 => I32, u32 => I32,
    i64 => I64, u64 => I64,
);

/// Append an immediate in its own width, little-endian.
#[inline]
#[track_caller]
pub fn emit_immediate<T: Immediate>(buf: &mut CodeBuffer, value: T) {
    emit_imm_sized(buf, value.to_i64(), T::SIZE);
}

/// Append `value` truncated to `size`.
#[inline]
#[track_caller]
pub(crate) fn emit_imm_sized(buf: &mut CodeBuffer, value: i64, size: ImmSize) {
    match size {
        ImmSize::I8 => buf.emit_u8(value as u8),
        ImmSize::I16 => buf.emit_u16(value as u16),
        ImmSize::I32 => buf.emit_u32(value as u32),
        ImmSize::I64 => buf.emit_u64(value as u64),
    }
}

/// Whether `value` survives a round trip through a sign-extended byte.
#[inline]
pub fn fits_i8(value: i64) -> bool {
    i8::try_from(value).is_ok()
}

/// Check that `value` is representable in an operand of `size`, either as
/// a signed or an unsigned quantity, and return it sign-extended from that
/// width (so `0xFFFF` at word size becomes `-1`).
///
/// # Panics
///
/// Panics if the value does not fit; for 64-bit operands it must fit a
/// sign-extended imm32.
#[track_caller]
pub(crate) fn imm_for(value: i64, size: OperandSize) -> i64 {
    let (lo, hi, normalized) = match size {
        OperandSize::Byte => (i8::MIN as i64, u8::MAX as i64, value as i8 as i64),
        OperandSize::Word => (i16::MIN as i64, u16::MAX as i64, value as i16 as i64),
        OperandSize::Dword => (i32::MIN as i64, u32::MAX as i64, value as i32 as i64),
        OperandSize::Qword => (i32::MIN as i64, i32::MAX as i64, value),
    };
    assert!(
        (lo..=hi).contains(&value),
        "immediate {:#x} does not fit a {} operand",
        value,
        size
    );
    normalized
}

/// Immediate opcode variant chosen for an arithmetic instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmForm {
    /// `op r/m, imm8` sign-extended (`83 /digit`).
    SignExtended8,
    /// `op AL/AX/EAX/RAX, imm` without ModR/M.
    Accumulator,
    /// `op r/m, imm` at full width.
    Full,
}

/// Shortest immediate form for `value`.
///
/// The sign-extended byte form wins whenever it exists and the value fits
/// it; otherwise the accumulator form is preferred when the destination is
/// the accumulator. Byte-sized operations have no sign-extended variant.
pub fn choose_imm_form(value: i64, size: OperandSize, accumulator: bool) -> ImmForm {
    if size != OperandSize::Byte && fits_i8(value) {
        ImmForm::SignExtended8
    } else if accumulator {
        ImmForm::Accumulator
    } else {
        ImmForm::Full
    }
}

// ─── Instruction shapes ─────────────────────────────────────

/// Prefix and opcode bytes of one instruction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec<'a> {
    /// Mandatory SSE prefix (0x66, 0xF2, 0xF3).
    pub prefix: Option<u8>,
    /// Operand-size override (0x66) for 16-bit operands.
    pub opsize: bool,
    /// REX.W for 64-bit operands.
    pub w: bool,
    /// Opcode bytes, including any 0F escape.
    pub opcode: &'a [u8],
}

impl<'a> OpSpec<'a> {
    /// Unprefixed opcode with default operand size.
    pub const fn new(opcode: &'a [u8]) -> Self {
        Self {
            prefix: None,
            opsize: false,
            w: false,
            opcode,
        }
    }

    /// Opcode whose operand size is selected by prefixes.
    pub const fn sized(opcode: &'a [u8], size: OperandSize) -> Self {
        Self {
            prefix: None,
            opsize: matches!(size, OperandSize::Word),
            w: matches!(size, OperandSize::Qword),
            opcode,
        }
    }

    /// Add a mandatory prefix.
    pub const fn with_prefix(mut self, prefix: Option<u8>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Force REX.W.
    pub const fn with_w(mut self, w: bool) -> Self {
        self.w = w;
        self
    }
}

/// The ModR/M.reg operand: a register or an opcode extension digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegField {
    id: u8,
    force_rex: bool,
    high: bool,
}

impl RegField {
    /// Opcode extension `/digit`.
    ///
    /// # Panics
    ///
    /// Panics if `digit >= 8`.
    #[track_caller]
    pub fn digit(digit: u8) -> Self {
        assert!(digit < 8, "opcode extension /{} out of range", digit);
        Self {
            id: digit,
            force_rex: false,
            high: false,
        }
    }

    /// General-purpose register.
    pub fn gp<R: GpReg>(reg: R) -> Self {
        Self {
            id: reg.id(),
            force_rex: reg.forces_rex(),
            high: reg.is_high_byte(),
        }
    }

    /// SIMD register.
    pub fn vec<V: VecReg>(reg: V) -> Self {
        Self {
            id: reg.id(),
            force_rex: false,
            high: false,
        }
    }

    /// x87 stack slot (for `+i` forms).
    pub(crate) fn raw(id: u8) -> Self {
        Self {
            id,
            force_rex: false,
            high: false,
        }
    }
}

/// The ModR/M.rm operand: a register or a memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rm {
    /// Register-direct (mod = 11).
    Reg(RegField),
    /// Memory.
    Mem(Mem),
}

impl Rm {
    /// General-purpose register operand.
    pub fn gp<R: GpReg>(reg: R) -> Self {
        Rm::Reg(RegField::gp(reg))
    }

    /// SIMD register operand.
    pub fn vec<V: VecReg>(reg: V) -> Self {
        Rm::Reg(RegField::vec(reg))
    }
}

impl From<Mem> for Rm {
    fn from(mem: Mem) -> Self {
        Rm::Mem(mem)
    }
}

#[track_caller]
fn emit_legacy_prefixes(buf: &mut CodeBuffer, op: &OpSpec<'_>, addr_override: bool) {
    if addr_override {
        buf.emit_u8(0x67);
    }
    if op.opsize {
        buf.emit_u8(0x66);
    }
    if let Some(p) = op.prefix {
        buf.emit_u8(p);
    }
}

#[track_caller]
fn emit_rex_if_needed(
    buf: &mut CodeBuffer,
    w: bool,
    r: bool,
    x: bool,
    b: bool,
    force: bool,
    high: bool,
) {
    if w || r || x || b || force {
        assert!(
            !high,
            "high-byte registers (AH, CH, DH, BH) cannot be encoded with a REX prefix"
        );
        emit_rex(buf, w, r, x, b);
    }
}

/// Emit `prefixes REX opcode ModR/M [SIB] [disp]`.
///
/// RIP-relative displacements are relative to the end of the instruction;
/// a caller appending an immediate afterwards accounts for it.
///
/// # Panics
///
/// Panics if the operands need a REX prefix in 32-bit mode, a high-byte
/// register is combined with a REX prefix, or `rm` is a memory operand the
/// mode cannot encode.
#[track_caller]
pub fn emit_rm_op(buf: &mut CodeBuffer, op: OpSpec<'_>, reg: RegField, rm: &Rm) {
    match rm {
        Rm::Reg(r) => {
            emit_legacy_prefixes(buf, &op, false);
            emit_rex_if_needed(
                buf,
                op.w,
                reg.id >= 8,
                false,
                r.id >= 8,
                reg.force_rex || r.force_rex,
                reg.high || r.high,
            );
            buf.emit_bytes(op.opcode);
            emit_modrm(buf, 3, reg.id & 7, r.id & 7);
        }
        Rm::Mem(mem) => {
            let layout = lower(buf, mem);
            emit_legacy_prefixes(buf, &op, layout.addr_override);
            emit_rex_if_needed(
                buf,
                op.w,
                reg.id >= 8,
                layout.rex_x,
                layout.rex_b,
                reg.force_rex,
                reg.high,
            );
            buf.emit_bytes(op.opcode);
            emit_address(buf, reg.id & 7, &layout);
        }
    }
}

/// Emit a register-to-register form (`mod = 11`).
#[inline]
#[track_caller]
pub fn emit_rr_op(buf: &mut CodeBuffer, op: OpSpec<'_>, reg: RegField, rm: RegField) {
    emit_rm_op(buf, op, reg, &Rm::Reg(rm));
}

/// Emit a `+r` form: the register number is added to the last opcode byte.
#[track_caller]
pub fn emit_o(buf: &mut CodeBuffer, op: OpSpec<'_>, reg: RegField) {
    let Some((&last, head)) = op.opcode.split_last() else {
        panic!("+r form without an opcode byte");
    };
    emit_legacy_prefixes(buf, &op, false);
    emit_rex_if_needed(buf, op.w, false, false, reg.id >= 8, reg.force_rex, reg.high);
    buf.emit_bytes(head);
    buf.emit_u8(last + (reg.id & 7));
}

/// Emit prefixes and opcode of a form without ModR/M (accumulator
/// immediates, string ops).
#[track_caller]
pub fn emit_plain(buf: &mut CodeBuffer, op: OpSpec<'_>) {
    emit_legacy_prefixes(buf, &op, false);
    emit_rex_if_needed(buf, op.w, false, false, false, false, false);
    buf.emit_bytes(op.opcode);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::{Reg32, Reg64, Reg8, Xmm};

    fn x86() -> CodeBuffer {
        CodeBuffer::for_mode(Mode::X86)
    }

    #[test]
    fn byte_builders() {
        assert_eq!(rex(true, false, false, false), 0x48);
        assert_eq!(rex(true, true, true, true), 0x4F);
        assert_eq!(rex(false, false, false, false), 0x40);
        assert_eq!(modrm(3, 0, 0), 0xC0);
        assert_eq!(modrm(1, 2, 5), 0x55);
        assert_eq!(sib(0, 4, 4), 0x24);
        assert_eq!(sib(2, 2, 1), 0x91);
    }

    #[test]
    #[should_panic(expected = "ModR/M.mod 4 out of range")]
    fn modrm_mod_out_of_range() {
        modrm(4, 0, 0);
    }

    #[test]
    #[should_panic(expected = "ModR/M.reg 8 out of range")]
    fn modrm_reg_out_of_range() {
        modrm(0, 8, 0);
    }

    #[test]
    #[should_panic(expected = "SIB.scale 4 out of range")]
    fn sib_scale_out_of_range() {
        sib(4, 0, 0);
    }

    #[test]
    #[should_panic(expected = "REX prefix is not encodable in x86 mode")]
    fn rex_in_32bit_mode() {
        emit_rex(&mut x86(), true, false, false, false);
    }

    #[test]
    fn immediates_little_endian() {
        let mut buf = CodeBuffer::new();
        emit_immediate(&mut buf, -2i8);
        emit_immediate(&mut buf, 0x1234u16);
        emit_immediate(&mut buf, -1i32);
        assert_eq!(buf.as_slice(), &[0xFE, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn imm_form_selection() {
        use OperandSize::*;
        assert_eq!(choose_imm_form(5, Dword, true), ImmForm::SignExtended8);
        assert_eq!(choose_imm_form(-128, Qword, false), ImmForm::SignExtended8);
        assert_eq!(choose_imm_form(128, Dword, true), ImmForm::Accumulator);
        assert_eq!(choose_imm_form(128, Dword, false), ImmForm::Full);
        assert_eq!(choose_imm_form(5, Byte, true), ImmForm::Accumulator);
        assert_eq!(choose_imm_form(5, Byte, false), ImmForm::Full);
    }

    #[test]
    fn imm_for_normalizes() {
        assert_eq!(imm_for(0xFF, OperandSize::Byte), -1);
        assert_eq!(imm_for(0xFFFF_FFFF, OperandSize::Dword), -1);
        assert_eq!(imm_for(-5, OperandSize::Qword), -5);
    }

    #[test]
    #[should_panic(expected = "does not fit a byte operand")]
    fn imm_for_rejects_wide_byte() {
        imm_for(0x100, OperandSize::Byte);
    }

    #[test]
    fn rr_forms() {
        // mov eax, ecx
        let mut buf = x86();
        emit_rr_op(
            &mut buf,
            OpSpec::sized(&[0x89], OperandSize::Dword),
            RegField::gp(Reg32::ECX),
            RegField::gp(Reg32::EAX),
        );
        assert_eq!(buf.as_slice(), &[0x89, 0xC8]);

        // mov rax, r9
        let mut buf = CodeBuffer::new();
        emit_rr_op(
            &mut buf,
            OpSpec::sized(&[0x89], OperandSize::Qword),
            RegField::gp(Reg64::R9),
            RegField::gp(Reg64::RAX),
        );
        assert_eq!(buf.as_slice(), &[0x4C, 0x89, 0xC8]);
    }

    #[test]
    fn byte_registers_that_need_rex() {
        // mov sil, al
        let mut buf = CodeBuffer::new();
        emit_rr_op(
            &mut buf,
            OpSpec::new(&[0x88]),
            RegField::gp(Reg8::AL),
            RegField::gp(Reg8::SIL),
        );
        assert_eq!(buf.as_slice(), &[0x40, 0x88, 0xC6]);
    }

    #[test]
    #[should_panic(expected = "high-byte registers")]
    fn high_byte_with_rex_panics() {
        let mut buf = CodeBuffer::new();
        emit_rr_op(
            &mut buf,
            OpSpec::new(&[0x88]),
            RegField::gp(Reg8::AH),
            RegField::gp(Reg8::R8B),
        );
    }

    #[test]
    fn memory_forms() {
        // mov ecx, [esp]
        let mut buf = x86();
        emit_rm_op(
            &mut buf,
            OpSpec::sized(&[0x8B], OperandSize::Dword),
            RegField::gp(Reg32::ECX),
            &Rm::Mem(Mem::base(Reg32::ESP)),
        );
        assert_eq!(buf.as_slice(), &[0x8B, 0x0C, 0x24]);

        // mov rax, [r13]
        let mut buf = CodeBuffer::new();
        emit_rm_op(
            &mut buf,
            OpSpec::sized(&[0x8B], OperandSize::Qword),
            RegField::gp(Reg64::RAX),
            &Rm::Mem(Mem::base(Reg64::R13)),
        );
        assert_eq!(buf.as_slice(), &[0x49, 0x8B, 0x45, 0x00]);

        // mov eax, [ecx] in long mode: address-size override
        let mut buf = CodeBuffer::new();
        emit_rm_op(
            &mut buf,
            OpSpec::sized(&[0x8B], OperandSize::Dword),
            RegField::gp(Reg32::EAX),
            &Rm::Mem(Mem::base(Reg32::ECX)),
        );
        assert_eq!(buf.as_slice(), &[0x67, 0x8B, 0x01]);
    }

    #[test]
    fn mandatory_prefix_precedes_rex() {
        // addss xmm9, xmm1
        let mut buf = CodeBuffer::new();
        emit_rr_op(
            &mut buf,
            OpSpec::new(&[0x0F, 0x58]).with_prefix(Some(0xF3)),
            RegField::vec(Xmm::XMM9),
            RegField::vec(Xmm::XMM1),
        );
        assert_eq!(buf.as_slice(), &[0xF3, 0x44, 0x0F, 0x58, 0xC9]);
    }

    #[test]
    fn plus_r_form() {
        let mut buf = CodeBuffer::new();
        emit_o(&mut buf, OpSpec::new(&[0x50]), RegField::gp(Reg64::R12));
        assert_eq!(buf.as_slice(), &[0x41, 0x54]);
    }

    #[test]
    #[should_panic(expected = "x86-emit: rip-relative addressing is not encodable in x86 mode")]
    fn unencodable_memory_panics() {
        let mut buf = x86();
        emit_rm_op(
            &mut buf,
            OpSpec::new(&[0x8B]),
            RegField::gp(Reg32::EAX),
            &Rm::Mem(Mem::rip(0)),
        );
    }
}
