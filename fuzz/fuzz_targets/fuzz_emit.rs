#![no_main]
use libfuzzer_sys::fuzz_target;

use x86_emit::{
    jump_to, CodeBuffer, Cond, ForwardJump, Group1, JumpKind, JumpWidth, Mode, Reg32, SmartJump,
};

fuzz_target!(|data: &[u8]| {
    // Replay the input as a stream of emitter calls. Every jump opened is
    // resolved before `finish`, which must then succeed.
    let mode = if data.first().is_some_and(|b| b & 1 == 1) { Mode::X64 } else { Mode::X86 };
    let mut buf = CodeBuffer::for_mode(mode);
    let mut smart = Vec::new();
    let mut forward = Vec::new();

    for pair in data.chunks_exact(2) {
        let (op, arg) = (pair[0], pair[1]);
        let kind = match arg & 0x10 {
            0 => JumpKind::Always,
            _ => JumpKind::If(Cond::ALL[usize::from(arg & 0x0F)]),
        };
        match op % 8 {
            0 => buf.emit_nops(usize::from(arg)),
            1 => Group1::ALL[usize::from(arg % 8)].ri(&mut buf, Reg32::new(arg >> 5), i64::from(arg as i8)),
            2 if smart.len() < 32 => smart.push(SmartJump::reserve(&mut buf, kind)),
            3 => {
                if let Some(j) = smart.pop() {
                    j.resolve(&mut buf).unwrap();
                }
            }
            4 if forward.len() < 32 => forward.push(ForwardJump::emit(&mut buf, kind, JumpWidth::Near)),
            5 => {
                if let Some(j) = forward.pop() {
                    j.resolve(&mut buf).unwrap();
                }
            }
            6 => {
                let target = buf.cursor() * usize::from(arg) / 256;
                jump_to(&mut buf, kind, target).unwrap();
            }
            _ => buf.align(1 << (arg % 6)),
        }
    }

    while let Some(j) = smart.pop() {
        j.resolve(&mut buf).unwrap();
    }
    while let Some(j) = forward.pop() {
        j.resolve(&mut buf).unwrap();
    }
    buf.finish().unwrap();
});
