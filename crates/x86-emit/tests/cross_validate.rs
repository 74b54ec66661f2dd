//! Cross-validation tests: encode with x86_emit, decode with iced-x86.
//!
//! Every emitted stream is decoded instruction by instruction; the decoder
//! must consume it exactly and agree on mnemonics, registers, memory
//! operands and branch targets.

use iced_x86::{Decoder, DecoderOptions, Instruction, Mnemonic, Register};
use x86_emit::{
    dword_ptr, family, fpu, jump_to, qword_ptr, simd, BitScan, BitTest, CodeBuffer, Cond, CvtToInt,
    DoubleShift, Extend, Fixed, ForwardJump, FpuArith, Group1, Group2, Group3, IncDec, Index,
    JumpKind, JumpWidth, Mem, Mode, Reg16, Reg32, Reg64, Reg8, Scale, SimdImm, SimdMove, SimdOp,
    SimdShift, SmartJump, St, Xmm,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn bitness(mode: Mode) -> u32 {
    match mode {
        Mode::X86 => 32,
        Mode::X64 => 64,
    }
}

/// Emit with `f`, then decode the whole buffer.
fn decode(mode: Mode, f: impl FnOnce(&mut CodeBuffer)) -> Vec<Instruction> {
    let mut buf = CodeBuffer::for_mode(mode);
    f(&mut buf);
    let bytes = buf.finish().expect("all jumps resolved");
    let mut decoder = Decoder::with_ip(bitness(mode), &bytes, 0, DecoderOptions::NONE);
    let mut out = Vec::new();
    let mut consumed = 0;
    while decoder.can_decode() {
        let instr = decoder.decode();
        assert!(
            !instr.is_invalid(),
            "iced-x86 decoded INVALID at {:#x} in {:02X?}",
            consumed,
            bytes
        );
        consumed += instr.len();
        out.push(instr);
    }
    assert_eq!(consumed, bytes.len());
    out
}

fn mnemonics(instrs: &[Instruction]) -> Vec<Mnemonic> {
    instrs.iter().map(Instruction::mnemonic).collect()
}

// ─── Integer ──────────────────────────────────────────────────────────────────

#[test]
fn group1_all_forms_64() {
    for op in Group1::ALL {
        let instrs = decode(Mode::X64, |b| {
            op.rr(b, Reg64::R9, Reg64::RAX);
            op.rm(b, Reg32::EDX, Mem::base_disp(Reg64::RBP, -16));
            op.mr(b, Mem::base(Reg64::R12), Reg16::CX);
            op.ri(b, Reg8::SIL, 0x7F);
            op.ri(b, Reg64::RAX, 0x1234_5678);
            op.mi(b, dword_ptr(Mem::rip(0x40)), -2);
        });
        assert_eq!(instrs.len(), 6);
        let expected = instrs[0].mnemonic();
        assert!(instrs.iter().all(|i| i.mnemonic() == expected), "{:?}", op);
        assert_eq!(instrs[0].op0_register(), Register::R9);
        assert_eq!(instrs[1].memory_base(), Register::RBP);
        assert_eq!(instrs[1].memory_displacement64(), (-16i64) as u64);
        assert_eq!(instrs[2].memory_base(), Register::R12);
        assert_eq!(instrs[2].op1_register(), Register::CX);
        assert_eq!(instrs[3].op0_register(), Register::SIL);
        assert_eq!(instrs[4].op0_register(), Register::RAX);
    }
}

#[test]
fn shifts_unary_and_bits() {
    let instrs = decode(Mode::X64, |b| {
        Group2::Rol.ri(b, Reg32::EAX, 3);
        Group2::Sar.r_cl(b, Reg64::R10);
        Group3::Mul.r(b, Reg32::ECX);
        Group3::Not.m(b, qword_ptr(Mem::base(Reg64::RDI)));
        IncDec::Inc.r(b, Reg64::RBX);
        BitTest::Bts.ri(b, Reg32::EDX, 7);
        BitScan::Bsr.rr(b, Reg64::RAX, Reg64::R8);
        DoubleShift::Shld.rri(b, Reg32::EAX, Reg32::EDX, 4);
    });
    assert_eq!(
        mnemonics(&instrs),
        [
            Mnemonic::Rol,
            Mnemonic::Sar,
            Mnemonic::Mul,
            Mnemonic::Not,
            Mnemonic::Inc,
            Mnemonic::Bts,
            Mnemonic::Bsr,
            Mnemonic::Shld,
        ]
    );
    assert_eq!(instrs[1].op0_register(), Register::R10);
    assert_eq!(instrs[6].op1_register(), Register::R8);
}

#[test]
fn moves_64() {
    let instrs = decode(Mode::X64, |b| {
        family::mov_ri(b, Reg64::RAX, -1);
        family::mov_ri(b, Reg64::R11, 0x1122_3344_5566_7788);
        family::mov_ri(b, Reg32::R15D, 0xFFFF_FFFF);
        family::movx(b, Extend::Zero, Reg64::RAX, Reg16::R8W);
        family::movx(b, Extend::Sign, Reg64::RCX, Reg32::EDX);
        family::lea(b, Reg64::RSP, Mem::base_disp(Reg64::RSP, 8));
        family::xchg_rr(b, Reg64::RAX, Reg64::R13);
        family::cmov_rr(b, Cond::Below, Reg32::EAX, Reg32::ECX);
        family::setcc(b, Cond::Greater, Reg8::R9B);
        family::imul_rri(b, Reg32::EAX, Reg32::EBX, 1000);
    });
    assert_eq!(
        mnemonics(&instrs),
        [
            Mnemonic::Mov,
            Mnemonic::Mov,
            Mnemonic::Mov,
            Mnemonic::Movzx,
            Mnemonic::Movsxd,
            Mnemonic::Lea,
            Mnemonic::Xchg,
            Mnemonic::Cmovb,
            Mnemonic::Setg,
            Mnemonic::Imul,
        ]
    );
    assert_eq!(instrs[0].immediate(1), u64::MAX);
    assert_eq!(instrs[1].immediate(1), 0x1122_3344_5566_7788);
    assert_eq!(instrs[2].op0_register(), Register::R15D);
    assert_eq!(instrs[8].op0_register(), Register::R9L);
}

#[test]
fn addressing_shapes_32() {
    let idx = Index::new(Reg32::EDI).unwrap();
    let instrs = decode(Mode::X86, |b| {
        family::mov_rm(b, Reg32::EAX, Mem::base(Reg32::ESP));
        family::mov_rm(b, Reg32::EAX, Mem::base(Reg32::EBP));
        family::mov_rm(b, Reg32::EAX, Mem::indexed(Reg32::EBX, idx, Scale::S8, 0x100));
        family::mov_rm(b, Reg32::EAX, Mem::index_only(idx, Scale::S4, 0x20));
        family::mov_rm(b, Reg32::ECX, Mem::abs(0xDEAD_BEE0));
        family::mov_rm(b, Reg32::EAX, Mem::abs(0x1000));
    });
    assert_eq!(instrs[0].memory_base(), Register::ESP);
    assert_eq!(instrs[1].memory_base(), Register::EBP);
    assert_eq!(instrs[1].memory_displacement32(), 0);
    assert_eq!(instrs[2].memory_index(), Register::EDI);
    assert_eq!(instrs[2].memory_index_scale(), 8);
    assert_eq!(instrs[2].memory_displacement32(), 0x100);
    assert_eq!(instrs[3].memory_base(), Register::None);
    assert_eq!(instrs[3].memory_index_scale(), 4);
    assert_eq!(instrs[4].memory_displacement32(), 0xDEAD_BEE0);
    // accumulator moffs form
    assert_eq!(instrs[5].len(), 5);
    assert_eq!(instrs[5].memory_displacement32(), 0x1000);
}

#[test]
fn addressing_shapes_64() {
    let instrs = decode(Mode::X64, |b| {
        family::mov_rm(b, Reg64::RAX, Mem::base(Reg64::R13));
        family::mov_rm(b, Reg64::RAX, Mem::abs(0x7FFF_0000));
        family::mov_rm(b, Reg64::RAX, Mem::rip(-7));
        family::mov_rm(b, Reg32::EAX, Mem::base(Reg32::R8D));
    });
    assert_eq!(instrs[0].memory_base(), Register::R13);
    assert_eq!(instrs[1].memory_base(), Register::None);
    assert_eq!(instrs[1].memory_displacement64(), 0x7FFF_0000);
    assert!(instrs[2].is_ip_rel_memory_operand());
    assert_eq!(instrs[3].memory_base(), Register::R8D);
}

#[test]
fn fixed_table_64() {
    let fixed = [
        (Fixed::Ret, Mnemonic::Ret),
        (Fixed::Int3, Mnemonic::Int3),
        (Fixed::Cdq, Mnemonic::Cdq),
        (Fixed::Cqo, Mnemonic::Cqo),
        (Fixed::Pause, Mnemonic::Pause),
        (Fixed::Cpuid, Mnemonic::Cpuid),
        (Fixed::Rdtsc, Mnemonic::Rdtsc),
        (Fixed::Ud2, Mnemonic::Ud2),
        (Fixed::Mfence, Mnemonic::Mfence),
        (Fixed::Leave, Mnemonic::Leave),
    ];
    for (op, mnemonic) in fixed {
        let instrs = decode(Mode::X64, |b| op.emit(b));
        assert_eq!(mnemonics(&instrs), [mnemonic], "{:?}", op);
    }
}

// ─── SIMD / x87 ───────────────────────────────────────────────────────────────

#[test]
fn sse_stream() {
    let instrs = decode(Mode::X64, |b| {
        SimdOp::ADDPS.rr(b, Xmm::XMM0, Xmm::XMM15);
        SimdOp::SQRTSD.rm(b, Xmm::XMM8, Mem::base(Reg64::RSP));
        SimdOp::PXOR.rr(b, Xmm::XMM3, Xmm::XMM3);
        SimdMove::MOVDQU.store(b, Mem::base_disp(Reg64::RDI, 16), Xmm::XMM12);
        SimdImm::PSHUFD.rri(b, Xmm::XMM1, Xmm::XMM2, 0x4E);
        SimdShift::Psrldq.ri(b, Xmm::XMM5, 8);
        CvtToInt::TruncSd.rr(b, Reg64::RAX, Xmm::XMM1);
        simd::movq_to_xmm(b, Xmm::XMM2, Reg64::R10);
        simd::ldmxcsr(b, Mem::base(Reg64::RAX));
    });
    assert_eq!(
        mnemonics(&instrs),
        [
            Mnemonic::Addps,
            Mnemonic::Sqrtsd,
            Mnemonic::Pxor,
            Mnemonic::Movdqu,
            Mnemonic::Pshufd,
            Mnemonic::Psrldq,
            Mnemonic::Cvttsd2si,
            Mnemonic::Movq,
            Mnemonic::Ldmxcsr,
        ]
    );
    assert_eq!(instrs[0].op1_register(), Register::XMM15);
    assert_eq!(instrs[1].op0_register(), Register::XMM8);
    assert_eq!(instrs[3].op1_register(), Register::XMM12);
    assert_eq!(instrs[7].op1_register(), Register::R10);
}

#[test]
fn x87_stream() {
    let instrs = decode(Mode::X86, |b| {
        fpu::fld_m64(b, Mem::base(Reg32::ESP));
        FpuArith::Mul.m32(b, Mem::base_disp(Reg32::EBP, 8));
        FpuArith::Sub.sti_st0(b, St::ST2);
        FpuArith::Div.pop(b, St::ST1);
        fpu::fxch(b, St::ST3);
        fpu::fstp_m64(b, Mem::base(Reg32::EAX));
    });
    assert_eq!(
        mnemonics(&instrs),
        [
            Mnemonic::Fld,
            Mnemonic::Fmul,
            Mnemonic::Fsub,
            Mnemonic::Fdivp,
            Mnemonic::Fxch,
            Mnemonic::Fstp,
        ]
    );
    assert_eq!(instrs[2].op0_register(), Register::ST2);
}

// ─── Branches ─────────────────────────────────────────────────────────────────

#[test]
fn branch_targets_after_compaction() {
    let instrs = decode(Mode::X64, |b| {
        let top = b.cursor();
        let exit = SmartJump::reserve(b, Cond::Equal.into());
        let skip = ForwardJump::emit(b, JumpKind::Always, JumpWidth::Near);
        Group1::Add.ri(b, Reg32::EAX, 1);
        skip.resolve(b).unwrap();
        assert_eq!(jump_to(b, JumpKind::Always, top), Ok(JumpWidth::Short));
        assert_eq!(exit.resolve(b), Ok(JumpWidth::Short));
        Fixed::Ret.emit(b);
    });
    // je exit; jmp +3; add eax,1; jmp top; ret
    assert_eq!(
        mnemonics(&instrs),
        [Mnemonic::Je, Mnemonic::Jmp, Mnemonic::Add, Mnemonic::Jmp, Mnemonic::Ret]
    );
    let ret = instrs[4].ip();
    assert_eq!(instrs[0].near_branch_target(), ret);
    assert_eq!(instrs[1].near_branch_target(), instrs[3].ip());
    assert_eq!(instrs[3].near_branch_target(), 0);
}
