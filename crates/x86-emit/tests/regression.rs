//! Regression tests for bug fixes.
//!
//! Each test documents a specific mistake that was found and
//! fixed, so the fix is never accidentally reverted.

use x86_emit::{
    family, CodeBuffer, Cond, EmitterConfig, ForwardJump, Group1, Group2, IncDec, Index, JumpKind,
    JumpWidth, Mem, Mode, Reg32, Reg64, Reg8, Scale, SmartJump,
};

fn emit(mode: Mode, f: impl FnOnce(&mut CodeBuffer)) -> Vec<u8> {
    let mut buf = CodeBuffer::for_mode(mode);
    f(&mut buf);
    buf.finish().unwrap()
}

/// Regression: 32-bit INC/DEC use the one-byte `40+r`/`48+r` forms, which
/// are REX prefixes in long mode and must become `FF /0`, `FF /1` there.
#[test]
fn inc_dec_forms_per_mode() {
    assert_eq!(
        emit(Mode::X86, |b| {
            IncDec::Inc.r(b, Reg32::EAX);
            IncDec::Dec.r(b, Reg32::EBX);
        }),
        [0x40, 0x4B]
    );
    assert_eq!(emit(Mode::X64, |b| IncDec::Inc.r(b, Reg32::EAX)), [0xFF, 0xC0]);
}

/// Regression: `xchg eax, eax` in long mode zero-extends RAX, so it must not
/// collapse to `90` (a true NOP there).
#[test]
fn xchg_eax_eax_is_not_nop_in_long_mode() {
    assert_eq!(emit(Mode::X64, |b| family::xchg_rr(b, Reg32::EAX, Reg32::EAX)), [0x87, 0xC0]);
    assert_eq!(emit(Mode::X64, |b| family::xchg_rr(b, Reg64::RAX, Reg64::RCX)), [0x48, 0x91]);
}

/// Regression: `[ebp]` / `[r13]` with no displacement must be encoded with
/// mod=01 and disp8=0; mod=00 rm=101 means disp32 (or RIP-relative).
#[test]
fn frame_pointer_base_without_displacement() {
    assert_eq!(
        emit(Mode::X86, |b| family::mov_mr(b, Mem::base(Reg32::EBP), Reg32::ECX)),
        [0x89, 0x4D, 0x00]
    );
    let idx = Index::new(Reg64::RAX).unwrap();
    assert_eq!(
        emit(Mode::X64, |b| family::lea(b, Reg64::RDX, Mem::indexed(Reg64::R13, idx, Scale::S1, 0))),
        [0x49, 0x8D, 0x54, 0x05, 0x00]
    );
}

/// Regression: a SIB base of 101 with mod=00 means "no base"; an index-only
/// operand must carry a full disp32 even when it is zero.
#[test]
fn index_only_always_has_disp32() {
    let idx = Index::new(Reg32::ECX).unwrap();
    assert_eq!(
        emit(Mode::X86, |b| family::mov_rm(b, Reg32::EAX, Mem::index_only(idx, Scale::S4, 0))),
        [0x8B, 0x04, 0x8D, 0x00, 0x00, 0x00, 0x00]
    );
}

/// Regression: byte-sized arithmetic has no sign-extended imm8 opcode; `83`
/// with a byte register would address the full dword register.
#[test]
fn byte_immediates_never_use_83() {
    assert_eq!(emit(Mode::X86, |b| Group1::Add.ri(b, Reg8::AL, 0x80)), [0x04, 0x80]);
    assert_eq!(emit(Mode::X86, |b| Group1::Cmp.ri(b, Reg8::BL, -1)), [0x80, 0xFB, 0xFF]);
}

/// Regression: `mov r64, imm` with bit 31 set but nothing above must use the
/// zero-extending `B8+r imm32` form, not `C7` (which sign-extends).
#[test]
fn mov_r64_u32_zero_extends() {
    assert_eq!(
        emit(Mode::X64, |b| family::mov_ri(b, Reg64::RAX, 0xFFFF_FFFF)),
        [0xB8, 0xFF, 0xFF, 0xFF, 0xFF]
    );
    assert_eq!(
        emit(Mode::X64, |b| family::mov_ri(b, Reg64::RAX, -1)),
        [0x48, 0xC7, 0xC0, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

/// Regression: absolute addressing in long mode needs the SIB "no base, no
/// index" form; `ModRM(0, r, 5)` would be RIP-relative.
#[test]
fn absolute_address_in_long_mode() {
    assert_eq!(
        emit(Mode::X64, |b| Group1::Cmp.rm(b, Reg32::EAX, Mem::abs(0xFFFF_FFFF_FFFF_F000))),
        [0x3B, 0x04, 0x25, 0x00, 0xF0, 0xFF, 0xFF]
    );
}

/// Regression: shifting by zero is a no-op and must emit nothing; shifting
/// by one uses the `D1` form without an immediate.
#[test]
fn shift_count_edge_cases() {
    assert!(emit(Mode::X86, |b| Group2::Shl.ri(b, Reg32::EAX, 0)).is_empty());
    assert_eq!(emit(Mode::X86, |b| Group2::Shr.ri(b, Reg32::EAX, 1)), [0xD1, 0xE8]);
}

/// Regression: a label bound exactly at the smart jump's target offset must
/// follow the slide, otherwise it points past the compacted code.
#[test]
fn label_at_smart_jump_target_moves() {
    let mut buf = CodeBuffer::for_mode(Mode::X86);
    let j = SmartJump::reserve(&mut buf, Cond::Equal.into());
    buf.emit_nops(3);
    let target = buf.bind_label();
    assert_eq!(buf.label_offset(target), 9);
    assert_eq!(j.resolve(&mut buf), Ok(JumpWidth::Short));
    assert_eq!(buf.label_offset(target), 5);
    assert_eq!(buf.cursor(), 5);
}

/// Regression: slides are measured from the buffer start, but alignment is
/// measured from the execution base address.
#[test]
fn alignment_uses_base_address() {
    let mut buf = CodeBuffer::with_config(EmitterConfig::new(Mode::X64).base_address(0x1004));
    buf.align(16);
    assert_eq!(buf.len(), 12);
    assert_eq!(buf.address(), 0x1010);
}

/// Regression: a buffer dropped while jumps were still pending used to go
/// unnoticed, leaving zero displacements in code nobody checked.
#[test]
#[should_panic(expected = "2 jump(s) left unresolved")]
fn dropping_buffer_with_pending_jumps_panics() {
    let mut buf = CodeBuffer::for_mode(Mode::X86);
    std::mem::forget(ForwardJump::emit(&mut buf, Cond::Equal.into(), JumpWidth::Near));
    std::mem::forget(SmartJump::reserve(&mut buf, JumpKind::Always));
    assert_eq!(buf.as_slice(), &[0x0F, 0x84, 0, 0, 0, 0, 0xE9, 0, 0, 0, 0]);
    drop(buf);
}

/// Regression: `reset` used to clear the outstanding count silently.
#[test]
#[should_panic(expected = "1 jump(s) left unresolved")]
fn reset_with_pending_jump_panics() {
    let mut buf = CodeBuffer::for_mode(Mode::X86);
    std::mem::forget(ForwardJump::emit(&mut buf, JumpKind::Always, JumpWidth::Short));
    buf.reset();
}

/// Regression: an aligned short target used to be padded even when the
/// cursor sat only a few bytes past a 16-byte boundary.
#[test]
fn aligned_short_target_pads_only_past_slack() {
    let bind_at = |past: usize| {
        let mut buf = CodeBuffer::for_mode(Mode::X86);
        buf.emit_nops(16);
        let j = ForwardJump::emit(&mut buf, Cond::Equal.into(), JumpWidth::Short);
        buf.emit_nops(past - 2);
        j.resolve_aligned(&mut buf, 16).unwrap();
        buf.finish().unwrap()
    };
    // 16 + 3: bound in place
    let code = bind_at(3);
    assert_eq!(code.len(), 19);
    assert_eq!(&code[16..18], &[0x74, 0x01]);
    // 16 + 5: padded to 32
    let code = bind_at(5);
    assert_eq!(code.len(), 32);
    assert_eq!(&code[16..18], &[0x74, 0x0E]);
}
