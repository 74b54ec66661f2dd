//! Encoding mode and code-buffer configuration.

use core::fmt;

/// Target encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// 32-bit protected mode. No REX prefixes; `[disp32]` is absolute.
    X86,
    /// 64-bit long mode.
    #[default]
    X64,
}

impl Mode {
    /// Whether REX prefixes (and registers 8–15) are available.
    #[must_use]
    pub fn is_64(self) -> bool {
        self == Mode::X64
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::X86 => write!(f, "x86"),
            Mode::X64 => write!(f, "x86-64"),
        }
    }
}

/// Configuration of a [`CodeBuffer`](crate::CodeBuffer).
///
/// # Examples
///
/// ```
/// use x86_emit::{CodeBuffer, EmitterConfig, Mode};
///
/// let config = EmitterConfig::new(Mode::X86)
///     .max_code_bytes(4096)
///     .base_address(0x1000_0000);
/// let buf = CodeBuffer::with_config(config);
/// assert_eq!(buf.mode(), Mode::X86);
/// assert_eq!(buf.remaining(), Some(4096));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmitterConfig {
    /// Encoding mode. Default: [`Mode::X64`].
    pub mode: Mode,
    /// Upper bound on emitted bytes, for buffers backed by a fixed-size
    /// recompiler cache. `None` (default) grows without bound.
    pub max_code_bytes: Option<usize>,
    /// Address the first byte of the buffer will execute at. Used for
    /// alignment and for `call`/`jmp` to absolute host addresses.
    /// Default: 0.
    pub base_address: u64,
    /// Track relative branches while a smart jump is outstanding so that
    /// compaction never breaks an already-resolved displacement.
    /// Default: `true`.
    pub validate_slides: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            mode: Mode::X64,
            max_code_bytes: None,
            base_address: 0,
            validate_slides: true,
        }
    }
}

impl EmitterConfig {
    /// Default configuration for the given mode.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Bound the buffer to `limit` bytes.
    #[must_use]
    pub fn max_code_bytes(mut self, limit: usize) -> Self {
        self.max_code_bytes = Some(limit);
        self
    }

    /// Set the execution address of offset 0.
    #[must_use]
    pub fn base_address(mut self, addr: u64) -> Self {
        self.base_address = addr;
        self
    }

    /// Enable or disable reference tracking during smart-jump compaction.
    #[must_use]
    pub fn validate_slides(mut self, on: bool) -> Self {
        self.validate_slides = on;
        self
    }
}
