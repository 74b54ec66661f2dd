//! Jumps, calls and labels.
//!
//! Three ways to emit a branch, by how much is known about the target:
//!
//! - **Known target** ([`jump_to`] and friends): the displacement is
//!   computed now and the shortest legal form is chosen.
//! - **Unknown target** ([`ForwardJump`]): the chosen form is emitted with
//!   a zero displacement and patched once the target is bound. Only the
//!   explicit short form can fail to reach it.
//! - **Deferred length** ([`SmartJump`]): the near form is reserved; on
//!   resolution the jump shrinks to the short form when it fits, and the
//!   code emitted since the reservation slides back to close the gap.
//!
//! Displacements are always relative to the end of the branch instruction.

use crate::buffer::{CodeBuffer, Label, Ticket};
use crate::error::EmitError;

// ─── Condition codes ────────────────────────────────────────

/// Condition code (`tttn` field of `Jcc`, `SETcc`, `CMOVcc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cond {
    Overflow = 0x0,
    NoOverflow = 0x1,
    Below = 0x2,
    AboveEqual = 0x3,
    Equal = 0x4,
    NotEqual = 0x5,
    BelowEqual = 0x6,
    Above = 0x7,
    Sign = 0x8,
    NoSign = 0x9,
    Parity = 0xA,
    NoParity = 0xB,
    Less = 0xC,
    GreaterEqual = 0xD,
    LessEqual = 0xE,
    Greater = 0xF,
}

impl Cond {
    pub const CARRY: Cond = Cond::Below;
    pub const NO_CARRY: Cond = Cond::AboveEqual;
    pub const ZERO: Cond = Cond::Equal;
    pub const NOT_ZERO: Cond = Cond::NotEqual;
    pub const NOT_ABOVE_EQUAL: Cond = Cond::Below;
    pub const NOT_BELOW: Cond = Cond::AboveEqual;
    pub const NOT_ABOVE: Cond = Cond::BelowEqual;
    pub const NOT_BELOW_EQUAL: Cond = Cond::Above;
    pub const PARITY_EVEN: Cond = Cond::Parity;
    pub const PARITY_ODD: Cond = Cond::NoParity;
    pub const NOT_GREATER_EQUAL: Cond = Cond::Less;
    pub const NOT_LESS: Cond = Cond::GreaterEqual;
    pub const NOT_GREATER: Cond = Cond::LessEqual;
    pub const NOT_LESS_EQUAL: Cond = Cond::Greater;

    /// All sixteen codes, in encoding order.
    pub const ALL: [Cond; 16] = [
        Cond::Overflow,
        Cond::NoOverflow,
        Cond::Below,
        Cond::AboveEqual,
        Cond::Equal,
        Cond::NotEqual,
        Cond::BelowEqual,
        Cond::Above,
        Cond::Sign,
        Cond::NoSign,
        Cond::Parity,
        Cond::NoParity,
        Cond::Less,
        Cond::GreaterEqual,
        Cond::LessEqual,
        Cond::Greater,
    ];

    /// Four-bit condition field.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// The opposite condition. Flips the low bit.
    pub fn invert(self) -> Cond {
        Cond::ALL[(self.code() ^ 1) as usize]
    }

    /// `Jcc` mnemonic.
    pub fn mnemonic(self) -> &'static str {
        const NAMES: [&str; 16] = [
            "jo", "jno", "jb", "jae", "je", "jne", "jbe", "ja", "js", "jns", "jp", "jnp", "jl",
            "jge", "jle", "jg",
        ];
        NAMES[self.code() as usize]
    }
}

// ─── Branch shapes ──────────────────────────────────────────

/// Unconditional or conditional jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JumpKind {
    /// `JMP`
    Always,
    /// `Jcc`
    If(Cond),
}

impl From<Cond> for JumpKind {
    fn from(cond: Cond) -> Self {
        JumpKind::If(cond)
    }
}

impl JumpKind {
    /// Length of the short (rel8) form.
    pub const SHORT_LEN: usize = 2;

    /// Length of the near (rel32) form: 5 for `JMP`, 6 for `Jcc`.
    pub fn near_len(self) -> usize {
        match self {
            JumpKind::Always => 5,
            JumpKind::If(_) => 6,
        }
    }

    /// Mnemonic for diagnostics.
    pub fn mnemonic(self) -> &'static str {
        match self {
            JumpKind::Always => "jmp",
            JumpKind::If(c) => c.mnemonic(),
        }
    }

    fn short_opcode(self) -> u8 {
        match self {
            JumpKind::Always => 0xEB,
            JumpKind::If(c) => 0x70 | c.code(),
        }
    }

    #[track_caller]
    fn emit_near_opcode(self, buf: &mut CodeBuffer) {
        match self {
            JumpKind::Always => buf.emit_u8(0xE9),
            JumpKind::If(c) => buf.emit_bytes(&[0x0F, 0x80 | c.code()]),
        }
    }
}

/// Displacement width of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JumpWidth {
    /// rel8
    Short,
    /// rel32
    Near,
}

impl JumpWidth {
    /// Largest forward displacement.
    pub fn max_disp(self) -> i64 {
        match self {
            JumpWidth::Short => i8::MAX as i64,
            JumpWidth::Near => i32::MAX as i64,
        }
    }

    fn fits(self, disp: i64) -> bool {
        match self {
            JumpWidth::Short => i8::try_from(disp).is_ok(),
            JumpWidth::Near => i32::try_from(disp).is_ok(),
        }
    }

    fn bytes(self) -> usize {
        match self {
            JumpWidth::Short => 1,
            JumpWidth::Near => 4,
        }
    }
}

/// A patchable relative branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Jump(JumpKind),
    Call,
}

impl Branch {
    fn mnemonic(self) -> &'static str {
        match self {
            Branch::Jump(kind) => kind.mnemonic(),
            Branch::Call => "call",
        }
    }

    /// Emit the opcode of `width` and return the displacement field offset.
    #[track_caller]
    fn emit_opcode(self, buf: &mut CodeBuffer, width: JumpWidth) -> usize {
        match (self, width) {
            (Branch::Jump(kind), JumpWidth::Short) => buf.emit_u8(kind.short_opcode()),
            (Branch::Jump(kind), JumpWidth::Near) => kind.emit_near_opcode(buf),
            (Branch::Call, JumpWidth::Near) => buf.emit_u8(0xE8),
            (Branch::Call, JumpWidth::Short) => panic!("call has no rel8 form"),
        }
        buf.cursor()
    }
}

#[track_caller]
fn write_disp(buf: &mut CodeBuffer, field: usize, width: JumpWidth, disp: i64) {
    match width {
        JumpWidth::Short => buf.patch_u8(field, disp as i8 as u8),
        JumpWidth::Near => buf.patch_i32(field, disp as i32),
    }
    buf.note_branch(field, width.bytes() as u8, field as i64 + width.bytes() as i64 + disp);
}

fn out_of_range(branch: Branch, site: usize, target: usize, disp: i64, width: JumpWidth) -> EmitError {
    EmitError::BranchOutOfRange {
        instr: branch.mnemonic().into(),
        site,
        target,
        disp,
        max: width.max_disp(),
    }
}

fn check_target(buf: &CodeBuffer, target: usize) -> Result<(), EmitError> {
    if target > buf.len() {
        return Err(EmitError::TargetOutOfBounds {
            target,
            len: buf.len(),
        });
    }
    Ok(())
}

// ─── Known targets ──────────────────────────────────────────

/// Emit a jump to an already-emitted `target`, choosing the short form
/// when the displacement fits a signed byte.
///
/// # Errors
///
/// [`EmitError::TargetOutOfBounds`] if `target` lies beyond the cursor.
///
/// # Examples
///
/// ```
/// use x86_emit::{jump_to, CodeBuffer, JumpKind, JumpWidth};
///
/// let mut buf = CodeBuffer::new();
/// let head = buf.cursor();
/// buf.emit_u8(0x90);
/// assert_eq!(jump_to(&mut buf, JumpKind::Always, head), Ok(JumpWidth::Short));
/// assert_eq!(buf.as_slice(), &[0x90, 0xEB, 0xFD]);
/// ```
#[track_caller]
pub fn jump_to(buf: &mut CodeBuffer, kind: JumpKind, target: usize) -> Result<JumpWidth, EmitError> {
    check_target(buf, target)?;
    let site = buf.cursor();
    let short_disp = target as i64 - (site + JumpKind::SHORT_LEN) as i64;
    let width = if JumpWidth::Short.fits(short_disp) {
        JumpWidth::Short
    } else {
        JumpWidth::Near
    };
    emit_known(buf, Branch::Jump(kind), width, target)?;
    Ok(width)
}

/// Emit the short form of a jump to an already-emitted `target`.
///
/// # Errors
///
/// [`EmitError::BranchOutOfRange`] if the displacement does not fit a
/// signed byte; nothing is emitted.
#[track_caller]
pub fn jump_short_to(buf: &mut CodeBuffer, kind: JumpKind, target: usize) -> Result<(), EmitError> {
    check_target(buf, target)?;
    emit_known(buf, Branch::Jump(kind), JumpWidth::Short, target)
}

/// Emit the near form of a jump to an already-emitted `target`.
#[track_caller]
pub fn jump_near_to(buf: &mut CodeBuffer, kind: JumpKind, target: usize) -> Result<(), EmitError> {
    check_target(buf, target)?;
    emit_known(buf, Branch::Jump(kind), JumpWidth::Near, target)
}

/// Emit a jump to a bound label, choosing the shortest form.
#[track_caller]
pub fn jump_to_label(buf: &mut CodeBuffer, kind: JumpKind, label: Label) -> Result<JumpWidth, EmitError> {
    let target = buf.label_offset(label);
    jump_to(buf, kind, target)
}

/// `jmp target`
#[track_caller]
pub fn jmp_to(buf: &mut CodeBuffer, target: usize) -> Result<JumpWidth, EmitError> {
    jump_to(buf, JumpKind::Always, target)
}

/// `jcc target`
#[track_caller]
pub fn jcc_to(buf: &mut CodeBuffer, cond: Cond, target: usize) -> Result<JumpWidth, EmitError> {
    jump_to(buf, JumpKind::If(cond), target)
}

/// `call target` (rel32) to an already-emitted offset.
#[track_caller]
pub fn call_to(buf: &mut CodeBuffer, target: usize) -> Result<(), EmitError> {
    check_target(buf, target)?;
    emit_known(buf, Branch::Call, JumpWidth::Near, target)
}

/// `call addr` to an absolute execution address, relative to the
/// buffer's [`base_address`](crate::EmitterConfig::base_address).
///
/// # Errors
///
/// [`EmitError::BranchOutOfRange`] if `addr` is more than ±2 GiB away.
#[track_caller]
pub fn call_address(buf: &mut CodeBuffer, addr: u64) -> Result<(), EmitError> {
    emit_to_address(buf, Branch::Call, addr)
}

/// `jmp addr` to an absolute execution address.
#[track_caller]
pub fn jump_to_address(buf: &mut CodeBuffer, addr: u64) -> Result<(), EmitError> {
    emit_to_address(buf, Branch::Jump(JumpKind::Always), addr)
}

#[track_caller]
fn emit_to_address(buf: &mut CodeBuffer, branch: Branch, addr: u64) -> Result<(), EmitError> {
    let site = buf.cursor();
    let end = buf.address_of(site + 5);
    let disp = addr.wrapping_sub(end) as i64;
    if !JumpWidth::Near.fits(disp) {
        return Err(out_of_range(branch, site, addr as usize, disp, JumpWidth::Near));
    }
    let field = branch.emit_opcode(buf, JumpWidth::Near);
    buf.emit_u32(disp as i32 as u32);
    buf.note_branch(field, 4, (field + 4) as i64 + disp);
    Ok(())
}

#[track_caller]
fn emit_known(buf: &mut CodeBuffer, branch: Branch, width: JumpWidth, target: usize) -> Result<(), EmitError> {
    let site = buf.cursor();
    let opcode_len = match (branch, width) {
        (Branch::Jump(JumpKind::If(_)), JumpWidth::Near) => 2,
        _ => 1,
    };
    let end = site + opcode_len + width.bytes();
    let disp = target as i64 - end as i64;
    if !width.fits(disp) {
        return Err(out_of_range(branch, site, target, disp, width));
    }
    let field = branch.emit_opcode(buf, width);
    match width {
        JumpWidth::Short => buf.emit_u8(0),
        JumpWidth::Near => buf.emit_u32(0),
    }
    write_disp(buf, field, width, disp);
    Ok(())
}

// ─── Forward jumps ──────────────────────────────────────────

/// Bytes past an alignment boundary a short aligned target tolerates
/// before [`ForwardJump::resolve_aligned`] pads.
pub const SHORT_ALIGN_SLACK: usize = 4;

/// A branch to a target not emitted yet.
///
/// Consumed by exactly one `resolve*` call. A forward jump that is never
/// resolved makes [`CodeBuffer::finish`] fail.
///
/// # Examples
///
/// ```
/// use x86_emit::{CodeBuffer, Cond, ForwardJump, JumpWidth};
///
/// let mut buf = CodeBuffer::new();
/// let skip = ForwardJump::emit(&mut buf, Cond::Equal.into(), JumpWidth::Short);
/// buf.emit_u8(0x90);
/// skip.resolve(&mut buf).unwrap();
/// assert_eq!(buf.finish().unwrap(), vec![0x74, 0x01, 0x90]);
/// ```
#[derive(Debug)]
#[must_use = "a forward jump must be resolved"]
pub struct ForwardJump {
    ticket: Ticket,
    branch: Branch,
    width: JumpWidth,
}

impl ForwardJump {
    /// Emit a jump of the given width with a placeholder displacement.
    #[track_caller]
    pub fn emit(buf: &mut CodeBuffer, kind: JumpKind, width: JumpWidth) -> Self {
        Self::open(buf, Branch::Jump(kind), width)
    }

    /// Emit a near `call` with a placeholder displacement.
    #[track_caller]
    pub fn call(buf: &mut CodeBuffer) -> Self {
        Self::open(buf, Branch::Call, JumpWidth::Near)
    }

    #[track_caller]
    fn open(buf: &mut CodeBuffer, branch: Branch, width: JumpWidth) -> Self {
        let field = branch.emit_opcode(buf, width);
        match width {
            JumpWidth::Short => buf.emit_u8(0),
            JumpWidth::Near => buf.emit_u32(0),
        }
        ForwardJump {
            ticket: buf.open_site(field),
            branch,
            width,
        }
    }

    /// Displacement width.
    pub fn width(&self) -> JumpWidth {
        self.width
    }

    /// Current offset of the displacement field.
    pub fn field(&self, buf: &CodeBuffer) -> usize {
        buf.site(&self.ticket)
    }

    /// Bind the target to the cursor.
    ///
    /// # Errors
    ///
    /// [`EmitError::BranchOutOfRange`] if a short jump cannot reach.
    #[track_caller]
    pub fn resolve(self, buf: &mut CodeBuffer) -> Result<(), EmitError> {
        let target = buf.cursor();
        self.resolve_to(buf, target)
    }

    /// Bind the target to `target`.
    ///
    /// # Errors
    ///
    /// [`EmitError::TargetOutOfBounds`] if `target` is beyond the cursor,
    /// [`EmitError::BranchOutOfRange`] if the displacement does not fit.
    /// Either way the site is consumed.
    #[track_caller]
    pub fn resolve_to(self, buf: &mut CodeBuffer, target: usize) -> Result<(), EmitError> {
        let field = buf.close_site(self.ticket);
        check_target(buf, target)?;
        let disp = target as i64 - (field + self.width.bytes()) as i64;
        if !self.width.fits(disp) {
            let opcode_len = match (self.branch, self.width) {
                (Branch::Jump(JumpKind::If(_)), JumpWidth::Near) => 2,
                _ => 1,
            };
            return Err(out_of_range(self.branch, field - opcode_len, target, disp, self.width));
        }
        write_disp(buf, field, self.width, disp);
        Ok(())
    }

    /// Bind the target to a label.
    #[track_caller]
    pub fn resolve_to_label(self, buf: &mut CodeBuffer, label: Label) -> Result<(), EmitError> {
        let target = buf.label_offset(label);
        self.resolve_to(buf, target)
    }

    /// Pad the cursor to `alignment` with NOPs, then bind the target.
    ///
    /// A short jump is only padded when the cursor sits more than
    /// [`SHORT_ALIGN_SLACK`] bytes past a boundary and the aligned target
    /// is still in range; otherwise it binds to the unaligned cursor.
    /// A near jump is always padded.
    #[track_caller]
    pub fn resolve_aligned(self, buf: &mut CodeBuffer, alignment: usize) -> Result<(), EmitError> {
        let padding = buf.padding_for(alignment);
        let field = self.field(buf);
        let aligned_disp = (buf.cursor() + padding) as i64 - (field + self.width.bytes()) as i64;
        let past = (buf.address() & (alignment as u64 - 1)) as usize;
        let worth_it = match self.width {
            JumpWidth::Short => past > SHORT_ALIGN_SLACK,
            JumpWidth::Near => true,
        };
        if worth_it && self.width.fits(aligned_disp) {
            buf.emit_nops(padding);
        }
        self.resolve(buf)
    }
}

// ─── Smart jumps ────────────────────────────────────────────

/// A jump whose length is decided when its target is bound.
///
/// [`reserve`](Self::reserve) emits the near form. [`resolve`](Self::resolve)
/// binds the target to the cursor: if the short form reaches, it is written
/// at the reserved offset and everything emitted since the reservation
/// slides back to follow it.
///
/// Outstanding jumps and labels inside the slid code move with it. Branches
/// resolved while the smart jump was outstanding are re-patched when only
/// one of their ends moved (see [`EmitterConfig::validate_slides`]); if one
/// would no longer fit, the smart jump keeps its near form instead.
///
/// Raw offsets a caller recorded in between (`cursor()` values) do not
/// move. Bind a [`Label`] for positions that must survive compaction.
///
/// [`EmitterConfig::validate_slides`]: crate::EmitterConfig::validate_slides
///
/// # Examples
///
/// ```
/// use x86_emit::{CodeBuffer, Cond, JumpWidth, SmartJump};
///
/// let mut buf = CodeBuffer::new();
/// let jl = SmartJump::reserve(&mut buf, Cond::Less.into());
/// buf.emit_bytes(&[0x90; 10]);
/// assert_eq!(jl.resolve(&mut buf), Ok(JumpWidth::Short));
/// assert_eq!(&buf.as_slice()[..2], &[0x7C, 0x0A]);
/// assert_eq!(buf.len(), 12);
/// ```
#[derive(Debug)]
#[must_use = "a smart jump must be resolved"]
pub struct SmartJump {
    ticket: Ticket,
    kind: JumpKind,
}

impl SmartJump {
    /// Reserve the near form of `kind` at the cursor.
    #[track_caller]
    pub fn reserve(buf: &mut CodeBuffer, kind: JumpKind) -> Self {
        let start = buf.cursor();
        kind.emit_near_opcode(buf);
        buf.emit_u32(0);
        let ticket = buf.open_site(start);
        buf.begin_smart();
        SmartJump { ticket, kind }
    }

    /// Current offset of the reserved instruction.
    pub fn site(&self, buf: &CodeBuffer) -> usize {
        buf.site(&self.ticket)
    }

    /// Bind the target to the cursor and settle the jump's length.
    ///
    /// # Errors
    ///
    /// [`EmitError::BranchOutOfRange`] if even the near form cannot reach,
    /// which takes more than 2 GiB of intervening code.
    #[track_caller]
    pub fn resolve(self, buf: &mut CodeBuffer) -> Result<JumpWidth, EmitError> {
        let base = buf.close_site(self.ticket);
        let near_len = self.kind.near_len();
        let reserved_end = base + near_len;
        let target = buf.cursor();
        let dist = (target - reserved_end) as i64;

        let width = if JumpWidth::Short.fits(dist)
            && buf.slide_back(reserved_end, near_len - JumpKind::SHORT_LEN)
        {
            buf.patch_u8(base, self.kind.short_opcode());
            write_disp(buf, base + 1, JumpWidth::Short, dist);
            JumpWidth::Short
        } else if JumpWidth::Near.fits(dist) {
            write_disp(buf, reserved_end - 4, JumpWidth::Near, dist);
            JumpWidth::Near
        } else {
            buf.end_smart();
            return Err(out_of_range(
                Branch::Jump(self.kind),
                base,
                target,
                dist,
                JumpWidth::Near,
            ));
        };
        buf.end_smart();
        Ok(width)
    }
}
