//! SSE and MMX templates.
//!
//! Every mnemonic is a constant descriptor (name, mandatory prefix, `0F`
//! opcode, which register files it accepts) consumed by a handful of
//! generic emitters. MMX-capable integer operations share their opcode with
//! the SSE2 form; the `66` prefix selects XMM registers.

use crate::buffer::CodeBuffer;
use crate::encoder::{emit_rm_op, OpSpec, RegField, Rm};
use crate::operand::{GpReg, Mem, OperandSize, Reg32, Reg64, VecReg, Xmm};

/// Register files a descriptor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegFile {
    /// XMM registers only.
    Xmm,
    /// MMX registers only.
    Mmx,
    /// Either; the mandatory prefix applies to the XMM form only.
    Both,
}

#[track_caller]
fn prefix_for<V: VecReg>(name: &str, regs: RegFile, prefix: Option<u8>) -> Option<u8> {
    match (V::IS_MMX, regs) {
        (true, RegFile::Xmm) => panic!("{} has no MMX form", name),
        (false, RegFile::Mmx) => panic!("{} has no XMM form", name),
        (true, _) => None,
        (false, _) => prefix,
    }
}

// ─── Two-operand arithmetic ─────────────────────────────────

/// Descriptor of a `op xmm/mm, xmm/mm/m` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdOp {
    /// Mnemonic.
    pub name: &'static str,
    /// Mandatory prefix of the XMM form.
    pub prefix: Option<u8>,
    /// Opcode byte after `0F`.
    pub opcode: u8,
    /// Accepted register files.
    pub regs: RegFile,
}

const fn ps(name: &'static str, opcode: u8) -> SimdOp {
    SimdOp {
        name,
        prefix: None,
        opcode,
        regs: RegFile::Xmm,
    }
}

const fn pfx(name: &'static str, prefix: u8, opcode: u8) -> SimdOp {
    SimdOp {
        name,
        prefix: Some(prefix),
        opcode,
        regs: RegFile::Xmm,
    }
}

const fn pint(name: &'static str, opcode: u8) -> SimdOp {
    SimdOp {
        name,
        prefix: Some(0x66),
        opcode,
        regs: RegFile::Both,
    }
}

impl SimdOp {
    // Packed single
    pub const ADDPS: SimdOp = ps("addps", 0x58);
    pub const MULPS: SimdOp = ps("mulps", 0x59);
    pub const SUBPS: SimdOp = ps("subps", 0x5C);
    pub const MINPS: SimdOp = ps("minps", 0x5D);
    pub const DIVPS: SimdOp = ps("divps", 0x5E);
    pub const MAXPS: SimdOp = ps("maxps", 0x5F);
    pub const SQRTPS: SimdOp = ps("sqrtps", 0x51);
    pub const RSQRTPS: SimdOp = ps("rsqrtps", 0x52);
    pub const RCPPS: SimdOp = ps("rcpps", 0x53);
    pub const ANDPS: SimdOp = ps("andps", 0x54);
    pub const ANDNPS: SimdOp = ps("andnps", 0x55);
    pub const ORPS: SimdOp = ps("orps", 0x56);
    pub const XORPS: SimdOp = ps("xorps", 0x57);
    pub const UNPCKLPS: SimdOp = ps("unpcklps", 0x14);
    pub const UNPCKHPS: SimdOp = ps("unpckhps", 0x15);
    pub const COMISS: SimdOp = ps("comiss", 0x2F);
    pub const UCOMISS: SimdOp = ps("ucomiss", 0x2E);
    pub const CVTPS2PD: SimdOp = ps("cvtps2pd", 0x5A);
    pub const CVTDQ2PS: SimdOp = ps("cvtdq2ps", 0x5B);

    // Scalar single
    pub const ADDSS: SimdOp = pfx("addss", 0xF3, 0x58);
    pub const MULSS: SimdOp = pfx("mulss", 0xF3, 0x59);
    pub const SUBSS: SimdOp = pfx("subss", 0xF3, 0x5C);
    pub const MINSS: SimdOp = pfx("minss", 0xF3, 0x5D);
    pub const DIVSS: SimdOp = pfx("divss", 0xF3, 0x5E);
    pub const MAXSS: SimdOp = pfx("maxss", 0xF3, 0x5F);
    pub const SQRTSS: SimdOp = pfx("sqrtss", 0xF3, 0x51);
    pub const RSQRTSS: SimdOp = pfx("rsqrtss", 0xF3, 0x52);
    pub const RCPSS: SimdOp = pfx("rcpss", 0xF3, 0x53);
    pub const CVTSS2SD: SimdOp = pfx("cvtss2sd", 0xF3, 0x5A);
    pub const CVTTPS2DQ: SimdOp = pfx("cvttps2dq", 0xF3, 0x5B);

    // Packed double
    pub const ADDPD: SimdOp = pfx("addpd", 0x66, 0x58);
    pub const MULPD: SimdOp = pfx("mulpd", 0x66, 0x59);
    pub const SUBPD: SimdOp = pfx("subpd", 0x66, 0x5C);
    pub const MINPD: SimdOp = pfx("minpd", 0x66, 0x5D);
    pub const DIVPD: SimdOp = pfx("divpd", 0x66, 0x5E);
    pub const MAXPD: SimdOp = pfx("maxpd", 0x66, 0x5F);
    pub const SQRTPD: SimdOp = pfx("sqrtpd", 0x66, 0x51);
    pub const ANDPD: SimdOp = pfx("andpd", 0x66, 0x54);
    pub const ANDNPD: SimdOp = pfx("andnpd", 0x66, 0x55);
    pub const ORPD: SimdOp = pfx("orpd", 0x66, 0x56);
    pub const XORPD: SimdOp = pfx("xorpd", 0x66, 0x57);
    pub const UNPCKLPD: SimdOp = pfx("unpcklpd", 0x66, 0x14);
    pub const UNPCKHPD: SimdOp = pfx("unpckhpd", 0x66, 0x15);
    pub const COMISD: SimdOp = pfx("comisd", 0x66, 0x2F);
    pub const UCOMISD: SimdOp = pfx("ucomisd", 0x66, 0x2E);
    pub const CVTPD2PS: SimdOp = pfx("cvtpd2ps", 0x66, 0x5A);
    pub const CVTPS2DQ: SimdOp = pfx("cvtps2dq", 0x66, 0x5B);
    pub const PUNPCKLQDQ: SimdOp = pfx("punpcklqdq", 0x66, 0x6C);
    pub const PUNPCKHQDQ: SimdOp = pfx("punpckhqdq", 0x66, 0x6D);

    // Scalar double
    pub const ADDSD: SimdOp = pfx("addsd", 0xF2, 0x58);
    pub const MULSD: SimdOp = pfx("mulsd", 0xF2, 0x59);
    pub const SUBSD: SimdOp = pfx("subsd", 0xF2, 0x5C);
    pub const MINSD: SimdOp = pfx("minsd", 0xF2, 0x5D);
    pub const DIVSD: SimdOp = pfx("divsd", 0xF2, 0x5E);
    pub const MAXSD: SimdOp = pfx("maxsd", 0xF2, 0x5F);
    pub const SQRTSD: SimdOp = pfx("sqrtsd", 0xF2, 0x51);
    pub const CVTSD2SS: SimdOp = pfx("cvtsd2ss", 0xF2, 0x5A);

    // Packed integer, MMX or SSE2
    pub const PADDB: SimdOp = pint("paddb", 0xFC);
    pub const PADDW: SimdOp = pint("paddw", 0xFD);
    pub const PADDD: SimdOp = pint("paddd", 0xFE);
    pub const PADDQ: SimdOp = pint("paddq", 0xD4);
    pub const PADDSB: SimdOp = pint("paddsb", 0xEC);
    pub const PADDSW: SimdOp = pint("paddsw", 0xED);
    pub const PADDUSB: SimdOp = pint("paddusb", 0xDC);
    pub const PADDUSW: SimdOp = pint("paddusw", 0xDD);
    pub const PSUBB: SimdOp = pint("psubb", 0xF8);
    pub const PSUBW: SimdOp = pint("psubw", 0xF9);
    pub const PSUBD: SimdOp = pint("psubd", 0xFA);
    pub const PSUBQ: SimdOp = pint("psubq", 0xFB);
    pub const PSUBSB: SimdOp = pint("psubsb", 0xE8);
    pub const PSUBSW: SimdOp = pint("psubsw", 0xE9);
    pub const PSUBUSB: SimdOp = pint("psubusb", 0xD8);
    pub const PSUBUSW: SimdOp = pint("psubusw", 0xD9);
    pub const PAND: SimdOp = pint("pand", 0xDB);
    pub const PANDN: SimdOp = pint("pandn", 0xDF);
    pub const POR: SimdOp = pint("por", 0xEB);
    pub const PXOR: SimdOp = pint("pxor", 0xEF);
    pub const PCMPEQB: SimdOp = pint("pcmpeqb", 0x74);
    pub const PCMPEQW: SimdOp = pint("pcmpeqw", 0x75);
    pub const PCMPEQD: SimdOp = pint("pcmpeqd", 0x76);
    pub const PCMPGTB: SimdOp = pint("pcmpgtb", 0x64);
    pub const PCMPGTW: SimdOp = pint("pcmpgtw", 0x65);
    pub const PCMPGTD: SimdOp = pint("pcmpgtd", 0x66);
    pub const PMULLW: SimdOp = pint("pmullw", 0xD5);
    pub const PMULHW: SimdOp = pint("pmulhw", 0xE5);
    pub const PMULUDQ: SimdOp = pint("pmuludq", 0xF4);
    pub const PMADDWD: SimdOp = pint("pmaddwd", 0xF5);
    pub const PUNPCKLBW: SimdOp = pint("punpcklbw", 0x60);
    pub const PUNPCKLWD: SimdOp = pint("punpcklwd", 0x61);
    pub const PUNPCKLDQ: SimdOp = pint("punpckldq", 0x62);
    pub const PUNPCKHBW: SimdOp = pint("punpckhbw", 0x68);
    pub const PUNPCKHWD: SimdOp = pint("punpckhwd", 0x69);
    pub const PUNPCKHDQ: SimdOp = pint("punpckhdq", 0x6A);
    pub const PACKSSWB: SimdOp = pint("packsswb", 0x63);
    pub const PACKUSWB: SimdOp = pint("packuswb", 0x67);
    pub const PACKSSDW: SimdOp = pint("packssdw", 0x6B);
    pub const PSLLW: SimdOp = pint("psllw", 0xF1);
    pub const PSLLD: SimdOp = pint("pslld", 0xF2);
    pub const PSLLQ: SimdOp = pint("psllq", 0xF3);
    pub const PSRLW: SimdOp = pint("psrlw", 0xD1);
    pub const PSRLD: SimdOp = pint("psrld", 0xD2);
    pub const PSRLQ: SimdOp = pint("psrlq", 0xD3);
    pub const PSRAW: SimdOp = pint("psraw", 0xE1);
    pub const PSRAD: SimdOp = pint("psrad", 0xE2);
    pub const PMINUB: SimdOp = pint("pminub", 0xDA);
    pub const PMAXUB: SimdOp = pint("pmaxub", 0xDE);
    pub const PMINSW: SimdOp = pint("pminsw", 0xEA);
    pub const PMAXSW: SimdOp = pint("pmaxsw", 0xEE);
    pub const PAVGB: SimdOp = pint("pavgb", 0xE0);
    pub const PAVGW: SimdOp = pint("pavgw", 0xE3);
    pub const PSADBW: SimdOp = pint("psadbw", 0xF6);

    /// `op dst, src`
    ///
    /// # Panics
    ///
    /// Panics if the register file does not match the descriptor.
    #[track_caller]
    pub fn rr<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: V) {
        self.emit::<V>(buf, RegField::vec(dst), &Rm::vec(src));
    }

    /// `op dst, [src]`
    #[track_caller]
    pub fn rm<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: Mem) {
        self.emit::<V>(buf, RegField::vec(dst), &Rm::Mem(src));
    }

    #[track_caller]
    fn emit<V: VecReg>(&self, buf: &mut CodeBuffer, reg: RegField, rm: &Rm) {
        let prefix = prefix_for::<V>(self.name, self.regs, self.prefix);
        emit_rm_op(buf, OpSpec::new(&[0x0F, self.opcode]).with_prefix(prefix), reg, rm);
    }
}

// ─── Moves ──────────────────────────────────────────────────

/// Descriptor of a load/store move pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdMove {
    /// Mnemonic.
    pub name: &'static str,
    /// Mandatory prefix.
    pub prefix: Option<u8>,
    /// `op reg, reg/m` opcode.
    pub load: u8,
    /// `op m, reg` opcode.
    pub store: u8,
    /// Accepted register files.
    pub regs: RegFile,
}

const fn mv(name: &'static str, prefix: Option<u8>, load: u8, store: u8) -> SimdMove {
    SimdMove {
        name,
        prefix,
        load,
        store,
        regs: RegFile::Xmm,
    }
}

impl SimdMove {
    pub const MOVAPS: SimdMove = mv("movaps", None, 0x28, 0x29);
    pub const MOVUPS: SimdMove = mv("movups", None, 0x10, 0x11);
    pub const MOVAPD: SimdMove = mv("movapd", Some(0x66), 0x28, 0x29);
    pub const MOVUPD: SimdMove = mv("movupd", Some(0x66), 0x10, 0x11);
    pub const MOVDQA: SimdMove = mv("movdqa", Some(0x66), 0x6F, 0x7F);
    pub const MOVDQU: SimdMove = mv("movdqu", Some(0xF3), 0x6F, 0x7F);
    pub const MOVSS: SimdMove = mv("movss", Some(0xF3), 0x10, 0x11);
    pub const MOVSD: SimdMove = mv("movsd", Some(0xF2), 0x10, 0x11);
    pub const MOVLPS: SimdMove = mv("movlps", None, 0x12, 0x13);
    pub const MOVHPS: SimdMove = mv("movhps", None, 0x16, 0x17);
    /// `movq mm, mm/m64`
    pub const MOVQ_MMX: SimdMove = SimdMove {
        name: "movq",
        prefix: None,
        load: 0x6F,
        store: 0x7F,
        regs: RegFile::Mmx,
    };

    /// `mov dst, src` (load form)
    #[track_caller]
    pub fn rr<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: V) {
        let prefix = prefix_for::<V>(self.name, self.regs, self.prefix);
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, self.load]).with_prefix(prefix),
            RegField::vec(dst),
            &Rm::vec(src),
        );
    }

    /// `mov dst, [src]`
    #[track_caller]
    pub fn load<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: Mem) {
        let prefix = prefix_for::<V>(self.name, self.regs, self.prefix);
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, self.load]).with_prefix(prefix),
            RegField::vec(dst),
            &Rm::Mem(src),
        );
    }

    /// `mov [dst], src`
    #[track_caller]
    pub fn store<V: VecReg>(&self, buf: &mut CodeBuffer, dst: Mem, src: V) {
        let prefix = prefix_for::<V>(self.name, self.regs, self.prefix);
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, self.store]).with_prefix(prefix),
            RegField::vec(src),
            &Rm::Mem(dst),
        );
    }
}

fn movd_prefix<V: VecReg>() -> Option<u8> {
    if V::IS_MMX {
        None
    } else {
        Some(0x66)
    }
}

/// `movd dst, src32`
#[track_caller]
pub fn movd_to_vec<V: VecReg>(buf: &mut CodeBuffer, dst: V, src: Reg32) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x6E]).with_prefix(movd_prefix::<V>()),
        RegField::vec(dst),
        &Rm::gp(src),
    );
}

/// `movd dst32, src`
#[track_caller]
pub fn movd_from_vec<V: VecReg>(buf: &mut CodeBuffer, dst: Reg32, src: V) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x7E]).with_prefix(movd_prefix::<V>()),
        RegField::vec(src),
        &Rm::gp(dst),
    );
}

/// `movd dst, [src]`
#[track_caller]
pub fn movd_load<V: VecReg>(buf: &mut CodeBuffer, dst: V, src: Mem) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x6E]).with_prefix(movd_prefix::<V>()),
        RegField::vec(dst),
        &Rm::Mem(src),
    );
}

/// `movd [dst], src`
#[track_caller]
pub fn movd_store<V: VecReg>(buf: &mut CodeBuffer, dst: Mem, src: V) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x7E]).with_prefix(movd_prefix::<V>()),
        RegField::vec(src),
        &Rm::Mem(dst),
    );
}

/// `movq xmm, r64` (long mode)
#[track_caller]
pub fn movq_to_xmm(buf: &mut CodeBuffer, dst: Xmm, src: Reg64) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x6E]).with_prefix(Some(0x66)).with_w(true),
        RegField::vec(dst),
        &Rm::gp(src),
    );
}

/// `movq r64, xmm` (long mode)
#[track_caller]
pub fn movq_from_xmm(buf: &mut CodeBuffer, dst: Reg64, src: Xmm) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x7E]).with_prefix(Some(0x66)).with_w(true),
        RegField::vec(src),
        &Rm::gp(dst),
    );
}

/// `movq xmm, xmm`: copies the low quadword, zeroing the high one.
#[track_caller]
pub fn movq_rr(buf: &mut CodeBuffer, dst: Xmm, src: Xmm) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x7E]).with_prefix(Some(0xF3)),
        RegField::vec(dst),
        &Rm::vec(src),
    );
}

/// `movq xmm, [m64]`
#[track_caller]
pub fn movq_load(buf: &mut CodeBuffer, dst: Xmm, src: Mem) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x7E]).with_prefix(Some(0xF3)),
        RegField::vec(dst),
        &Rm::Mem(src),
    );
}

/// `movq [m64], xmm`
#[track_caller]
pub fn movq_store(buf: &mut CodeBuffer, dst: Mem, src: Xmm) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0xD6]).with_prefix(Some(0x66)),
        RegField::vec(src),
        &Rm::Mem(dst),
    );
}

/// `movmskps r32, xmm`
#[track_caller]
pub fn movmskps(buf: &mut CodeBuffer, dst: Reg32, src: Xmm) {
    emit_rm_op(buf, OpSpec::new(&[0x0F, 0x50]), RegField::gp(dst), &Rm::vec(src));
}

/// `movmskpd r32, xmm`
#[track_caller]
pub fn movmskpd(buf: &mut CodeBuffer, dst: Reg32, src: Xmm) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0x50]).with_prefix(Some(0x66)),
        RegField::gp(dst),
        &Rm::vec(src),
    );
}

/// `pmovmskb r32, xmm/mm`
#[track_caller]
pub fn pmovmskb<V: VecReg>(buf: &mut CodeBuffer, dst: Reg32, src: V) {
    emit_rm_op(
        buf,
        OpSpec::new(&[0x0F, 0xD7]).with_prefix(movd_prefix::<V>()),
        RegField::gp(dst),
        &Rm::vec(src),
    );
}

// ─── Integer conversions ────────────────────────────────────

/// Integer-to-scalar conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvtFromInt {
    /// `cvtsi2ss`
    Ss,
    /// `cvtsi2sd`
    Sd,
}

impl CvtFromInt {
    fn prefix(self) -> u8 {
        match self {
            CvtFromInt::Ss => 0xF3,
            CvtFromInt::Sd => 0xF2,
        }
    }

    /// `cvtsi2ss xmm, r32/r64`
    #[track_caller]
    pub fn rr<R: GpReg>(self, buf: &mut CodeBuffer, dst: Xmm, src: R) {
        assert!(
            matches!(R::SIZE, OperandSize::Dword | OperandSize::Qword),
            "conversion source must be a 32- or 64-bit register"
        );
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, 0x2A])
                .with_prefix(Some(self.prefix()))
                .with_w(R::SIZE == OperandSize::Qword),
            RegField::vec(dst),
            &Rm::gp(src),
        );
    }

    /// `cvtsi2ss xmm, dword [src]`
    #[track_caller]
    pub fn rm(self, buf: &mut CodeBuffer, dst: Xmm, src: Mem) {
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, 0x2A]).with_prefix(Some(self.prefix())),
            RegField::vec(dst),
            &Rm::Mem(src),
        );
    }
}

/// Scalar-to-integer conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvtToInt {
    /// `cvttss2si`: truncating
    TruncSs,
    /// `cvttsd2si`: truncating
    TruncSd,
    /// `cvtss2si`: current rounding mode
    Ss,
    /// `cvtsd2si`: current rounding mode
    Sd,
}

impl CvtToInt {
    fn encoding(self) -> (u8, u8) {
        match self {
            CvtToInt::TruncSs => (0xF3, 0x2C),
            CvtToInt::TruncSd => (0xF2, 0x2C),
            CvtToInt::Ss => (0xF3, 0x2D),
            CvtToInt::Sd => (0xF2, 0x2D),
        }
    }

    /// `cvttss2si r32/r64, xmm`
    #[track_caller]
    pub fn rr<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: Xmm) {
        self.emit(buf, dst, &Rm::vec(src));
    }

    /// `cvttss2si r32/r64, [src]`
    #[track_caller]
    pub fn rm<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: Mem) {
        self.emit(buf, dst, &Rm::Mem(src));
    }

    #[track_caller]
    fn emit<R: GpReg>(self, buf: &mut CodeBuffer, dst: R, src: &Rm) {
        assert!(
            matches!(R::SIZE, OperandSize::Dword | OperandSize::Qword),
            "conversion destination must be a 32- or 64-bit register"
        );
        let (prefix, opcode) = self.encoding();
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, opcode])
                .with_prefix(Some(prefix))
                .with_w(R::SIZE == OperandSize::Qword),
            RegField::gp(dst),
            src,
        );
    }
}

// ─── Immediate forms ────────────────────────────────────────

/// Descriptor of a `op dst, src, imm8` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdImm {
    /// Mnemonic.
    pub name: &'static str,
    /// Mandatory prefix of the XMM form.
    pub prefix: Option<u8>,
    /// Opcode byte after `0F`.
    pub opcode: u8,
    /// Accepted register files.
    pub regs: RegFile,
}

const fn imm(name: &'static str, prefix: Option<u8>, opcode: u8) -> SimdImm {
    SimdImm {
        name,
        prefix,
        opcode,
        regs: RegFile::Xmm,
    }
}

/// `CMPxx` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPredicate {
    Eq = 0,
    Lt = 1,
    Le = 2,
    Unord = 3,
    Neq = 4,
    Nlt = 5,
    Nle = 6,
    Ord = 7,
}

impl SimdImm {
    pub const SHUFPS: SimdImm = imm("shufps", None, 0xC6);
    pub const SHUFPD: SimdImm = imm("shufpd", Some(0x66), 0xC6);
    pub const PSHUFD: SimdImm = imm("pshufd", Some(0x66), 0x70);
    pub const PSHUFHW: SimdImm = imm("pshufhw", Some(0xF3), 0x70);
    pub const PSHUFLW: SimdImm = imm("pshuflw", Some(0xF2), 0x70);
    pub const CMPPS: SimdImm = imm("cmpps", None, 0xC2);
    pub const CMPSS: SimdImm = imm("cmpss", Some(0xF3), 0xC2);
    pub const CMPPD: SimdImm = imm("cmppd", Some(0x66), 0xC2);
    pub const CMPSD: SimdImm = imm("cmpsd", Some(0xF2), 0xC2);
    /// `pshufw mm, mm/m64, imm8`
    pub const PSHUFW: SimdImm = SimdImm {
        name: "pshufw",
        prefix: None,
        opcode: 0x70,
        regs: RegFile::Mmx,
    };

    /// `op dst, src, imm8`
    #[track_caller]
    pub fn rri<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: V, imm8: u8) {
        self.emit::<V>(buf, RegField::vec(dst), &Rm::vec(src), imm8);
    }

    /// `op dst, [src], imm8`
    #[track_caller]
    pub fn rmi<V: VecReg>(&self, buf: &mut CodeBuffer, dst: V, src: Mem, imm8: u8) {
        self.emit::<V>(buf, RegField::vec(dst), &Rm::Mem(src), imm8);
    }

    /// `cmpps dst, src, pred`
    #[track_caller]
    pub fn cmp(&self, buf: &mut CodeBuffer, dst: Xmm, src: Xmm, pred: CmpPredicate) {
        self.rri(buf, dst, src, pred as u8);
    }

    #[track_caller]
    fn emit<V: VecReg>(&self, buf: &mut CodeBuffer, reg: RegField, rm: &Rm, imm8: u8) {
        let prefix = prefix_for::<V>(self.name, self.regs, self.prefix);
        emit_rm_op(buf, OpSpec::new(&[0x0F, self.opcode]).with_prefix(prefix), reg, rm);
        buf.emit_u8(imm8);
    }
}

/// Packed shift by immediate (`0F 71`/`72`/`73 /digit ib`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdShift {
    Psrlw,
    Psraw,
    Psllw,
    Psrld,
    Psrad,
    Pslld,
    Psrlq,
    Psllq,
    /// Byte shift, XMM only.
    Psrldq,
    /// Byte shift, XMM only.
    Pslldq,
}

impl SimdShift {
    fn encoding(self) -> (u8, u8) {
        match self {
            SimdShift::Psrlw => (0x71, 2),
            SimdShift::Psraw => (0x71, 4),
            SimdShift::Psllw => (0x71, 6),
            SimdShift::Psrld => (0x72, 2),
            SimdShift::Psrad => (0x72, 4),
            SimdShift::Pslld => (0x72, 6),
            SimdShift::Psrlq => (0x73, 2),
            SimdShift::Psllq => (0x73, 6),
            SimdShift::Psrldq => (0x73, 3),
            SimdShift::Pslldq => (0x73, 7),
        }
    }

    /// `op reg, imm8`
    #[track_caller]
    pub fn ri<V: VecReg>(self, buf: &mut CodeBuffer, reg: V, count: u8) {
        let regs = match self {
            SimdShift::Psrldq | SimdShift::Pslldq => RegFile::Xmm,
            _ => RegFile::Both,
        };
        let prefix = prefix_for::<V>("byte shift", regs, Some(0x66));
        let (opcode, digit) = self.encoding();
        emit_rm_op(
            buf,
            OpSpec::new(&[0x0F, opcode]).with_prefix(prefix),
            RegField::digit(digit),
            &Rm::vec(reg),
        );
        buf.emit_u8(count);
    }
}

/// `ldmxcsr [mem]`
#[track_caller]
pub fn ldmxcsr(buf: &mut CodeBuffer, src: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0x0F, 0xAE]), RegField::digit(2), &Rm::Mem(src));
}

/// `stmxcsr [mem]`
#[track_caller]
pub fn stmxcsr(buf: &mut CodeBuffer, dst: Mem) {
    emit_rm_op(buf, OpSpec::new(&[0x0F, 0xAE]), RegField::digit(3), &Rm::Mem(dst));
}
