//! Property-based tests using proptest.
//!
//! These cover the encoder invariants over randomly chosen registers,
//! immediates, distances and buffer positions.

use proptest::prelude::*;
use x86_emit::{
    family, CodeBuffer, Cond, ForwardJump, Group1, JumpKind, JumpWidth, Mem, Mode, Reg32, Reg64,
    SmartJump,
};

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_group1() -> impl Strategy<Value = Group1> {
    prop::sample::select(Group1::ALL.to_vec())
}

fn arb_cond() -> impl Strategy<Value = Cond> {
    prop::sample::select(Cond::ALL.to_vec())
}

fn arb_kind() -> impl Strategy<Value = JumpKind> {
    prop_oneof![Just(JumpKind::Always), arb_cond().prop_map(JumpKind::If)]
}

fn x86() -> CodeBuffer {
    CodeBuffer::for_mode(Mode::X86)
}

proptest! {
    /// Register-to-register Group1 forms are two bytes:
    /// `base | op<<3 | 1` then `ModRM(3, src, dst)`.
    #[test]
    fn group1_rr_is_two_bytes(op in arb_group1(), dst in 0u8..8, src in 0u8..8) {
        let mut buf = x86();
        op.rr(&mut buf, Reg32::new(dst), Reg32::new(src));
        prop_assert_eq!(
            buf.as_slice(),
            &[(op.digit() << 3) | 0x01, 0xC0 | (src << 3) | dst][..]
        );
    }

    /// Immediates in -128..=127 always take the sign-extended `83` form.
    #[test]
    fn small_immediates_use_imm8(op in arb_group1(), reg in 0u8..8, imm in -128i64..=127) {
        let mut buf = x86();
        op.ri(&mut buf, Reg32::new(reg), imm);
        prop_assert_eq!(
            buf.as_slice(),
            &[0x83, 0xC0 | (op.digit() << 3) | reg, imm as i8 as u8][..]
        );
    }

    /// Larger immediates never use the `83` form.
    #[test]
    fn large_immediates_use_imm32(op in arb_group1(), reg in 1u8..8, imm in 128i64..=0x7FFF_FFFF) {
        let mut buf = x86();
        op.ri(&mut buf, Reg32::new(reg), imm);
        let code = buf.as_slice();
        prop_assert_eq!(code.len(), 6);
        prop_assert_eq!(code[0], 0x81);
        prop_assert_eq!(&code[2..], &(imm as u32).to_le_bytes()[..]);
    }

    /// A forward `jmp` past 127 bytes is `E9` with `target - end`.
    #[test]
    fn far_forward_jump_is_near(gap in 128usize..2048) {
        let mut buf = x86();
        let j = ForwardJump::emit(&mut buf, JumpKind::Always, JumpWidth::Near);
        buf.emit_nops(gap);
        j.resolve(&mut buf).unwrap();
        let code = buf.finish().unwrap();
        prop_assert_eq!(code.len(), 5 + gap);
        prop_assert_eq!(code[0], 0xE9);
        prop_assert_eq!(&code[1..5], &(gap as u32).to_le_bytes()[..]);
    }

    /// A smart jump whose distance fits shrinks to two bytes and keeps the
    /// code between reservation and target intact and in order.
    #[test]
    fn smart_jump_preserves_region(
        kind in arb_kind(),
        prefix in 0usize..64,
        body in prop::collection::vec(any::<u8>(), 0..=127),
    ) {
        let mut buf = x86();
        buf.emit_nops(prefix);
        let j = SmartJump::reserve(&mut buf, kind);
        buf.emit_bytes(&body);
        prop_assert_eq!(j.resolve(&mut buf), Ok(JumpWidth::Short));
        let code = buf.finish().unwrap();
        prop_assert_eq!(code.len(), prefix + 2 + body.len());
        prop_assert_eq!(code[prefix + 1], body.len() as u8);
        prop_assert_eq!(&code[prefix + 2..], &body[..]);
    }

    /// Smart jumps that cannot shrink keep their reserved length.
    #[test]
    fn smart_jump_far_stays_near(kind in arb_kind(), gap in 128usize..1024) {
        let mut buf = x86();
        let j = SmartJump::reserve(&mut buf, kind);
        buf.emit_nops(gap);
        prop_assert_eq!(j.resolve(&mut buf), Ok(JumpWidth::Near));
        prop_assert_eq!(buf.len(), kind.near_len() + gap);
    }

    /// `align` lands on a multiple of `n` with NOP filler only, never
    /// moving backward.
    #[test]
    fn align_reaches_boundary(start in 0usize..300, shift in 0u32..7) {
        let n = 1usize << shift;
        let mut buf = x86();
        buf.emit_bytes(&vec![0xCC; start]);
        buf.align(n);
        let end = buf.cursor();
        prop_assert_eq!(end % n, 0);
        prop_assert!(end >= start);
        prop_assert!(end - start < n);
        prop_assert!(buf.as_slice()[start..].iter().all(|&b| b != 0xCC));
    }

    /// An RSP/R12 base always gets a SIB byte with index "none".
    #[test]
    fn stack_pointer_base_forces_sib(r12 in any::<bool>(), reg in 0u8..8, disp in any::<i32>()) {
        let base = if r12 { Reg64::R12 } else { Reg64::RSP };
        let mut buf = CodeBuffer::for_mode(Mode::X64);
        family::mov_rm(&mut buf, Reg64::new(reg), Mem::base_disp(base, disp));
        let code = buf.as_slice();
        prop_assert_eq!(code[2] & 7, 4);
        prop_assert_eq!(code[3], 0x24);
    }

    /// Backward jumps resolve to the target whichever form is chosen.
    #[test]
    fn backward_jump_lands_on_target(cond in arb_cond(), gap in 0usize..400) {
        let mut buf = x86();
        buf.emit_nops(gap);
        let site = buf.cursor();
        let width = x86_emit::jcc_to(&mut buf, cond, 0).unwrap();
        let code = buf.as_slice();
        let landed = match width {
            JumpWidth::Short => {
                (site + 2) as i64 + i64::from(code[site + 1] as i8)
            }
            JumpWidth::Near => {
                let rel = i32::from_le_bytes([code[site + 2], code[site + 3], code[site + 4], code[site + 5]]);
                (site + 6) as i64 + i64::from(rel)
            }
        };
        prop_assert_eq!(landed, 0);
    }
}
