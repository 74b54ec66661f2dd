//! Code buffer: the byte arena every emitter writes into.
//!
//! A [`CodeBuffer`] owns the emitted bytes and a single write cursor (the
//! end of the emitted code). Besides raw little-endian writers it keeps
//! the bookkeeping the jump subsystem needs:
//!
//! - outstanding patch sites (forward and smart jumps), addressed by
//!   ticket so their offsets stay valid when a smart jump compacts code;
//! - bound [`Label`]s, relocated the same way;
//! - while a smart jump is outstanding, the relative branches resolved in
//!   the meantime, so compaction can re-patch or refuse to move them.

use alloc::vec::Vec;

use crate::config::{EmitterConfig, Mode};
use crate::error::{fatal, EmitError};

// ─── Multi-byte NOP padding ─────────────────────────────────

/// Intel-recommended multi-byte NOP instruction sequences.
///
/// Valid on every P6-or-later processor in both 32- and 64-bit mode, so
/// alignment padding can be executed through.
const NOP_SEQUENCES: [&[u8]; 10] = [
    &[],
    &[0x90],                                                 // NOP
    &[0x66, 0x90],                                           // 66 NOP
    &[0x0F, 0x1F, 0x00],                                     // NOP [EAX]
    &[0x0F, 0x1F, 0x40, 0x00],                               // NOP [EAX+0]
    &[0x0F, 0x1F, 0x44, 0x00, 0x00],                         // NOP [EAX+EAX*1+0]
    &[0x66, 0x0F, 0x1F, 0x44, 0x00, 0x00],                   // 66 NOP [EAX+EAX*1+0]
    &[0x0F, 0x1F, 0x80, 0x00, 0x00, 0x00, 0x00],             // NOP [EAX+0] disp32
    &[0x0F, 0x1F, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00],       // NOP [EAX+EAX*1+0] disp32
    &[0x66, 0x0F, 0x1F, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00], // 66 NOP [EAX+EAX*1+0] disp32
];

/// Longest single NOP instruction used for padding.
pub(crate) const MAX_NOP_LEN: usize = 9;

/// `INT3`: filler for bytes that are skipped, never executed.
const TRAP: u8 = 0xCC;

// ─── Handles ────────────────────────────────────────────────

/// A bound position in a [`CodeBuffer`].
///
/// Unlike a raw offset, a label follows the code it marks when a smart
/// jump compacts the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

/// Ticket for an outstanding patch site. Not `Clone`: a site
/// is closed exactly once.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Ticket(usize);

/// A resolved relative branch: displacement field and its target.
///
/// The target is signed: calls to host functions land outside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RelRef {
    field: usize,
    width: u8,
    target: i64,
}

// ─── CodeBuffer ─────────────────────────────────────────────

/// Growable (or externally bounded) machine-code buffer.
///
/// # Examples
///
/// ```
/// use x86_emit::CodeBuffer;
///
/// let mut buf = CodeBuffer::new();
/// buf.emit_u8(0x90);
/// buf.emit_u32(0xDEAD_BEEF);
/// assert_eq!(buf.cursor(), 5);
/// assert_eq!(buf.as_slice(), &[0x90, 0xEF, 0xBE, 0xAD, 0xDE]);
/// ```
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    code: Vec<u8>,
    config: EmitterConfig,
    /// Outstanding patch sites indexed by ticket; `None` once closed.
    sites: Vec<Option<usize>>,
    outstanding: usize,
    labels: Vec<usize>,
    open_smart: usize,
    refs: Vec<RelRef>,
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBuffer {
    /// Create an empty, unbounded x86-64 buffer.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create an empty buffer for the given mode.
    pub fn for_mode(mode: Mode) -> Self {
        Self::with_config(EmitterConfig::new(mode))
    }

    /// Create an empty buffer with explicit configuration.
    pub fn with_config(config: EmitterConfig) -> Self {
        let capacity = config.max_code_bytes.unwrap_or(0);
        Self {
            code: Vec::with_capacity(capacity),
            config,
            sites: Vec::new(),
            outstanding: 0,
            labels: Vec::new(),
            open_smart: 0,
            refs: Vec::new(),
        }
    }

    /// Create an empty, unbounded x86-64 buffer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Self::new();
        buf.code.reserve(capacity);
        buf
    }

    /// The buffer's configuration.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Encoding mode.
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Number of emitted bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Current write position. Always equal to [`len`](Self::len).
    pub fn cursor(&self) -> usize {
        self.code.len()
    }

    /// Execution address of the current write position.
    pub fn address(&self) -> u64 {
        self.address_of(self.cursor())
    }

    /// Execution address of `offset`.
    pub fn address_of(&self, offset: usize) -> u64 {
        self.config.base_address.wrapping_add(offset as u64)
    }

    /// The emitted bytes, as a raw view.
    ///
    /// Displacements of jumps still outstanding read as zero here. Code
    /// handed to an executor should come from [`finish`](Self::finish),
    /// which rejects a buffer with unresolved jumps.
    pub fn as_slice(&self) -> &[u8] {
        &self.code
    }

    /// Bytes left before the configured bound, `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.config
            .max_code_bytes
            .map(|limit| limit.saturating_sub(self.code.len()))
    }

    /// Check that `n` more bytes fit.
    ///
    /// Recompilers call this before emitting a block so a full cache can
    /// be flushed instead of tripping the overflow assertion mid-block.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::BufferOverflow`] if the write would exceed
    /// [`EmitterConfig::max_code_bytes`].
    pub fn check_space(&self, n: usize) -> Result<(), EmitError> {
        match self.config.max_code_bytes {
            Some(limit) if self.code.len() + n > limit => Err(EmitError::BufferOverflow {
                requested: self.code.len() + n,
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Number of forward and smart jumps not yet resolved.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Consume the buffer and return the code.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::UnresolvedFixups`] if any forward or smart
    /// jump was never resolved; its displacement would be garbage.
    pub fn finish(mut self) -> Result<Vec<u8>, EmitError> {
        if self.outstanding > 0 {
            let count = core::mem::take(&mut self.outstanding);
            return Err(EmitError::UnresolvedFixups { count });
        }
        Ok(core::mem::take(&mut self.code))
    }

    /// Discard all code and bookkeeping, keeping the allocation for the
    /// next compilation unit.
    ///
    /// # Panics
    ///
    /// Panics if a forward or smart jump is still outstanding.
    #[track_caller]
    pub fn reset(&mut self) {
        self.check_resolved();
        self.code.clear();
        self.sites.clear();
        self.outstanding = 0;
        self.labels.clear();
        self.open_smart = 0;
        self.refs.clear();
    }

    #[track_caller]
    fn check_resolved(&self) {
        if self.outstanding > 0 {
            fatal(EmitError::UnresolvedFixups {
                count: self.outstanding,
            });
        }
    }

    // ── Raw writers ─────────────────────────────────────────

    #[inline]
    #[track_caller]
    fn ensure(&self, n: usize) {
        if let Err(err) = self.check_space(n) {
            fatal(err);
        }
    }

    /// Emit one byte.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is bounded and full.
    #[inline]
    #[track_caller]
    pub fn emit_u8(&mut self, byte: u8) {
        self.ensure(1);
        self.code.push(byte);
    }

    /// Emit a 16-bit value (little-endian).
    #[inline]
    #[track_caller]
    pub fn emit_u16(&mut self, value: u16) {
        self.emit_bytes(&value.to_le_bytes());
    }

    /// Emit a 32-bit value (little-endian).
    #[inline]
    #[track_caller]
    pub fn emit_u32(&mut self, value: u32) {
        self.emit_bytes(&value.to_le_bytes());
    }

    /// Emit a 64-bit value (little-endian).
    #[inline]
    #[track_caller]
    pub fn emit_u64(&mut self, value: u64) {
        self.emit_bytes(&value.to_le_bytes());
    }

    /// Emit a byte slice.
    #[inline]
    #[track_caller]
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.ensure(bytes.len());
        self.code.extend_from_slice(bytes);
    }

    /// Overwrite one already-emitted byte without moving the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not inside the emitted code.
    #[track_caller]
    pub fn patch_u8(&mut self, offset: usize, value: u8) {
        assert!(
            offset < self.code.len(),
            "patch at {:#x} outside emitted code (len {:#x})",
            offset,
            self.code.len()
        );
        self.code[offset] = value;
    }

    /// Overwrite four already-emitted bytes (little-endian).
    ///
    /// # Panics
    ///
    /// Panics if the field is not entirely inside the emitted code.
    #[track_caller]
    pub fn patch_i32(&mut self, offset: usize, value: i32) {
        assert!(
            offset + 4 <= self.code.len(),
            "patch at {:#x}..{:#x} outside emitted code (len {:#x})",
            offset,
            offset + 4,
            self.code.len()
        );
        self.code[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Move the cursor forward to `pos`, filling the gap with `INT3`.
    ///
    /// Lets callers reserve space whose contents they write later with
    /// the `patch_*` methods.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is behind the cursor: emitted code is never
    /// discarded except by smart-jump compaction.
    #[track_caller]
    pub fn set_cursor(&mut self, pos: usize) {
        assert!(
            pos >= self.code.len(),
            "cursor may not move backward ({:#x} -> {:#x})",
            self.code.len(),
            pos
        );
        let gap = pos - self.code.len();
        self.ensure(gap);
        self.code.resize(pos, TRAP);
    }

    // ── Alignment ───────────────────────────────────────────

    /// Bytes of padding needed to reach the next multiple of `alignment`.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    #[track_caller]
    pub fn padding_for(&self, alignment: usize) -> usize {
        assert!(
            alignment.is_power_of_two(),
            "alignment {} is not a power of two",
            alignment
        );
        let addr = self.address();
        let mask = alignment as u64 - 1;
        ((alignment as u64 - (addr & mask)) & mask) as usize
    }

    /// Pad with NOP instructions up to the next multiple of `alignment`.
    ///
    /// Uses the longest multi-byte NOPs first, so the padding executes
    /// in as few instructions as possible. Never moves the cursor
    /// backward; a no-op when already aligned.
    ///
    /// # Examples
    ///
    /// ```
    /// use x86_emit::CodeBuffer;
    ///
    /// let mut buf = CodeBuffer::new();
    /// buf.emit_bytes(&[0xC3; 13]);
    /// buf.align(16);
    /// assert_eq!(buf.cursor(), 16);
    /// assert_eq!(&buf.as_slice()[13..], &[0x0F, 0x1F, 0x00]);
    /// ```
    #[track_caller]
    pub fn align(&mut self, alignment: usize) {
        let padding = self.padding_for(alignment);
        self.emit_nops(padding);
    }

    /// Pad with `fill` bytes up to the next multiple of `alignment`.
    ///
    /// For data and for call targets that are never fallen into.
    #[track_caller]
    pub fn align_fill(&mut self, alignment: usize, fill: u8) {
        let padding = self.padding_for(alignment);
        self.ensure(padding);
        self.code.resize(self.code.len() + padding, fill);
    }

    /// Align code that may be fallen into, jumping over wide padding.
    ///
    /// Padding that fits one NOP instruction is emitted as that NOP;
    /// anything wider becomes a jump to the aligned position with the
    /// skipped bytes filled with `INT3`.
    #[track_caller]
    pub fn align_with_jump(&mut self, alignment: usize) {
        let padding = self.padding_for(alignment);
        if padding <= MAX_NOP_LEN {
            self.emit_nops(padding);
            return;
        }
        self.ensure(padding);
        let end = self.code.len() + padding;
        let skip = padding - 2;
        if skip <= i8::MAX as usize {
            self.emit_bytes(&[0xEB, skip as u8]);
        } else {
            self.emit_u8(0xE9);
            self.emit_u32((padding - 5) as u32);
        }
        self.code.resize(end, TRAP);
    }

    /// Emit exactly `n` bytes of NOP instructions.
    #[track_caller]
    pub fn emit_nops(&mut self, mut n: usize) {
        self.ensure(n);
        while n > 0 {
            let chunk = core::cmp::min(n, MAX_NOP_LEN);
            self.code.extend_from_slice(NOP_SEQUENCES[chunk]);
            n -= chunk;
        }
    }

    // ── Labels ──────────────────────────────────────────────

    /// Bind a label at the cursor.
    pub fn bind_label(&mut self) -> Label {
        self.labels.push(self.code.len());
        Label(self.labels.len() - 1)
    }

    /// Current offset of a label.
    ///
    /// # Panics
    ///
    /// Panics if the label was bound in a different buffer.
    #[track_caller]
    pub fn label_offset(&self, label: Label) -> usize {
        match self.labels.get(label.0) {
            Some(&offset) => offset,
            None => panic!("label {} does not belong to this buffer", label.0),
        }
    }

    // ── Patch-site bookkeeping (jump subsystem) ─────────────

    pub(crate) fn open_site(&mut self, offset: usize) -> Ticket {
        self.sites.push(Some(offset));
        self.outstanding += 1;
        Ticket(self.sites.len() - 1)
    }

    #[track_caller]
    pub(crate) fn site(&self, ticket: &Ticket) -> usize {
        match self.sites.get(ticket.0) {
            Some(Some(offset)) => *offset,
            _ => panic!("patch site {} is not open in this buffer", ticket.0),
        }
    }

    #[track_caller]
    pub(crate) fn close_site(&mut self, ticket: Ticket) -> usize {
        match self.sites.get_mut(ticket.0).and_then(Option::take) {
            Some(offset) => {
                self.outstanding -= 1;
                offset
            }
            None => panic!("patch site {} is not open in this buffer", ticket.0),
        }
    }

    pub(crate) fn begin_smart(&mut self) {
        self.open_smart += 1;
    }

    pub(crate) fn end_smart(&mut self) {
        self.open_smart -= 1;
        if self.open_smart == 0 {
            self.refs.clear();
        }
    }

    /// Record a resolved relative branch if compaction may still move it.
    pub(crate) fn note_branch(&mut self, field: usize, width: u8, target: i64) {
        if self.open_smart > 0 && self.config.validate_slides {
            self.refs.push(RelRef {
                field,
                width,
                target,
            });
        }
    }

    /// Slide `from..len` back by `delta` bytes, dropping the `delta`
    /// bytes just before `from`.
    ///
    /// Outstanding sites and labels in the moved range follow it.
    /// Recorded branches are re-patched when exactly one end moves; if a
    /// re-patched 8-bit displacement would overflow, nothing is moved and
    /// `false` is returned.
    #[track_caller]
    pub(crate) fn slide_back(&mut self, from: usize, delta: usize) -> bool {
        let to = self.code.len();
        assert!(
            delta <= from && from <= to,
            "invalid slide of {:#x}..{:#x} by {}",
            from,
            to,
            delta
        );
        let moves_field = |off: usize| off >= from && off < to;
        let moves_target = |off: usize| off >= from && off <= to;

        let mut patched = Vec::with_capacity(self.refs.len());
        for r in &self.refs {
            let field_moves = moves_field(r.field);
            let target_moves = usize::try_from(r.target).map_or(false, moves_target);
            let field = if field_moves { r.field - delta } else { r.field };
            let target = if target_moves {
                r.target - delta as i64
            } else {
                r.target
            };
            let disp = target - (field + r.width as usize) as i64;
            let fits = match r.width {
                1 => i8::try_from(disp).is_ok(),
                _ => i32::try_from(disp).is_ok(),
            };
            if !fits {
                return false;
            }
            patched.push((
                RelRef {
                    field,
                    width: r.width,
                    target,
                },
                disp,
                field_moves != target_moves,
            ));
        }

        self.code.copy_within(from..to, from - delta);
        self.code.truncate(to - delta);

        for site in self.sites.iter_mut().flatten() {
            if moves_field(*site) {
                *site -= delta;
            }
        }
        for label in &mut self.labels {
            if moves_target(*label) {
                *label -= delta;
            }
        }
        self.refs.clear();
        for (r, disp, repatch) in patched {
            if repatch {
                if r.width == 1 {
                    self.code[r.field] = disp as i8 as u8;
                } else {
                    self.code[r.field..r.field + 4].copy_from_slice(&(disp as i32).to_le_bytes());
                }
            }
            self.refs.push(r);
        }
        true
    }
}

impl Drop for CodeBuffer {
    /// Dropping a buffer with unresolved jumps is a bug in the caller.
    fn drop(&mut self) {
        #[cfg(feature = "std")]
        if std::thread::panicking() {
            return;
        }
        self.check_resolved();
    }
}
