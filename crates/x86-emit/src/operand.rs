//! Operand model: typed registers and memory-operand descriptors.
//!
//! Registers are width-tagged newtypes over the hardware register number
//! (0–15), so a 32-bit and a 64-bit form of the same instruction are
//! distinct calls checked at compile time. Memory operands are validated
//! when they are built: an illegal scale or an index register that aliases
//! "no index" cannot be expressed as a [`Mem`].
//!
//! [`Mem::layout`] lowers a memory operand to the raw ModR/M, SIB and
//! displacement fields, applying the two reserved-encoding rules:
//!
//! - a base whose low three bits are `100` (ESP/RSP/R12) always goes
//!   through a SIB byte with index "none";
//! - a base whose low three bits are `101` (EBP/RBP/R13) never uses
//!   `mod = 00`, because that pattern means "disp32 only".

use alloc::string::ToString;
use core::fmt;

use crate::config::Mode;
use crate::error::EmitError;

// ─── Operand size ───────────────────────────────────────────

/// Width of an integer operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandSize {
    /// 8-bit.
    Byte,
    /// 16-bit.
    Word,
    /// 32-bit.
    Dword,
    /// 64-bit.
    Qword,
}

impl OperandSize {
    /// Size in bytes.
    pub fn bytes(self) -> usize {
        match self {
            OperandSize::Byte => 1,
            OperandSize::Word => 2,
            OperandSize::Dword => 4,
            OperandSize::Qword => 8,
        }
    }
}

impl fmt::Display for OperandSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSize::Byte => write!(f, "byte"),
            OperandSize::Word => write!(f, "word"),
            OperandSize::Dword => write!(f, "dword"),
            OperandSize::Qword => write!(f, "qword"),
        }
    }
}

// ─── General-purpose registers ──────────────────────────────

/// A general-purpose register of a fixed width.
pub trait GpReg: Copy + fmt::Debug {
    /// Operand width of the register.
    const SIZE: OperandSize;

    /// Hardware register number, 0–15.
    fn id(self) -> u8;

    /// Low three bits, as placed in ModR/M or SIB.
    fn code(self) -> u8 {
        self.id() & 7
    }

    /// Whether the register needs a REX extension bit (R8–R15).
    fn is_extended(self) -> bool {
        self.id() >= 8
    }

    /// Whether the register is only reachable with a REX prefix present
    /// (SPL, BPL, SIL, DIL).
    fn forces_rex(self) -> bool {
        false
    }

    /// Whether this is one of the legacy high-byte registers AH–BH, which
    /// cannot be encoded together with any REX prefix.
    fn is_high_byte(self) -> bool {
        false
    }
}

macro_rules! gp_register {
    ($(#[$meta:meta])* $name:ident, $size:expr, [$($reg:ident = $id:expr),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u8);

        impl $name {
            $(
                #[doc = concat!("`", stringify!($reg), "`")]
                pub const $reg: $name = $name($id);
            )*

            /// Register with hardware number `id`.
            ///
            /// # Panics
            ///
            /// Panics if `id` is not in `0..16`.
            #[track_caller]
            pub const fn new(id: u8) -> Self {
                assert!(id < 16, "general-purpose register id out of range");
                Self(id)
            }
        }

        impl GpReg for $name {
            const SIZE: OperandSize = $size;

            #[inline]
            fn id(self) -> u8 {
                self.0
            }
        }
    };
}

gp_register!(
    /// 16-bit general-purpose register.
    Reg16, OperandSize::Word,
    [AX = 0, CX = 1, DX = 2, BX = 3, SP = 4, BP = 5, SI = 6, DI = 7,
     R8W = 8, R9W = 9, R10W = 10, R11W = 11, R12W = 12, R13W = 13, R14W = 14, R15W = 15]
);

gp_register!(
    /// 32-bit general-purpose register.
    Reg32, OperandSize::Dword,
    [EAX = 0, ECX = 1, EDX = 2, EBX = 3, ESP = 4, EBP = 5, ESI = 6, EDI = 7,
     R8D = 8, R9D = 9, R10D = 10, R11D = 11, R12D = 12, R13D = 13, R14D = 14, R15D = 15]
);

gp_register!(
    /// 64-bit general-purpose register.
    Reg64, OperandSize::Qword,
    [RAX = 0, RCX = 1, RDX = 2, RBX = 3, RSP = 4, RBP = 5, RSI = 6, RDI = 7,
     R8 = 8, R9 = 9, R10 = 10, R11 = 11, R12 = 12, R13 = 13, R14 = 14, R15 = 15]
);

impl Reg16 {
    /// The 32-bit register with the same number.
    pub fn r32(self) -> Reg32 {
        Reg32(self.0)
    }
}

impl Reg32 {
    /// The low-byte register with the same number (SPL–DIL for 4–7).
    pub fn r8(self) -> Reg8 {
        Reg8(self.0)
    }

    /// The 16-bit register with the same number.
    pub fn r16(self) -> Reg16 {
        Reg16(self.0)
    }

    /// The 64-bit register with the same number.
    pub fn r64(self) -> Reg64 {
        Reg64(self.0)
    }
}

impl Reg64 {
    /// The 32-bit register with the same number.
    pub fn r32(self) -> Reg32 {
        Reg32(self.0)
    }
}

/// 8-bit general-purpose register.
///
/// Numbers 4–7 mean SPL, BPL, SIL and DIL (REX required); the legacy
/// high-byte registers are the separate constants [`AH`](Self::AH) to
/// [`BH`](Self::BH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reg8(u8);

const HIGH_BYTE: u8 = 0x10;

impl Reg8 {
    pub const AL: Reg8 = Reg8(0);
    pub const CL: Reg8 = Reg8(1);
    pub const DL: Reg8 = Reg8(2);
    pub const BL: Reg8 = Reg8(3);
    pub const AH: Reg8 = Reg8(HIGH_BYTE | 4);
    pub const CH: Reg8 = Reg8(HIGH_BYTE | 5);
    pub const DH: Reg8 = Reg8(HIGH_BYTE | 6);
    pub const BH: Reg8 = Reg8(HIGH_BYTE | 7);
    pub const SPL: Reg8 = Reg8(4);
    pub const BPL: Reg8 = Reg8(5);
    pub const SIL: Reg8 = Reg8(6);
    pub const DIL: Reg8 = Reg8(7);
    pub const R8B: Reg8 = Reg8(8);
    pub const R9B: Reg8 = Reg8(9);
    pub const R10B: Reg8 = Reg8(10);
    pub const R11B: Reg8 = Reg8(11);
    pub const R12B: Reg8 = Reg8(12);
    pub const R13B: Reg8 = Reg8(13);
    pub const R14B: Reg8 = Reg8(14);
    pub const R15B: Reg8 = Reg8(15);

    /// Low-byte register with hardware number `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in `0..16`.
    #[track_caller]
    pub const fn new(id: u8) -> Self {
        assert!(id < 16, "general-purpose register id out of range");
        Self(id)
    }
}

impl GpReg for Reg8 {
    const SIZE: OperandSize = OperandSize::Byte;

    #[inline]
    fn id(self) -> u8 {
        self.0 & 0x0F
    }

    fn forces_rex(self) -> bool {
        (4..8).contains(&self.0)
    }

    fn is_high_byte(self) -> bool {
        self.0 & HIGH_BYTE != 0
    }
}

// ─── Vector and x87 registers ───────────────────────────────

/// A SIMD register usable by the [`simd`](crate::simd) templates.
pub trait VecReg: Copy + fmt::Debug {
    /// Whether this is a 64-bit MMX register rather than an XMM register.
    const IS_MMX: bool;

    /// Hardware register number.
    fn id(self) -> u8;
}

/// 128-bit SSE register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Xmm(u8);

impl Xmm {
    pub const XMM0: Xmm = Xmm(0);
    pub const XMM1: Xmm = Xmm(1);
    pub const XMM2: Xmm = Xmm(2);
    pub const XMM3: Xmm = Xmm(3);
    pub const XMM4: Xmm = Xmm(4);
    pub const XMM5: Xmm = Xmm(5);
    pub const XMM6: Xmm = Xmm(6);
    pub const XMM7: Xmm = Xmm(7);
    pub const XMM8: Xmm = Xmm(8);
    pub const XMM9: Xmm = Xmm(9);
    pub const XMM10: Xmm = Xmm(10);
    pub const XMM11: Xmm = Xmm(11);
    pub const XMM12: Xmm = Xmm(12);
    pub const XMM13: Xmm = Xmm(13);
    pub const XMM14: Xmm = Xmm(14);
    pub const XMM15: Xmm = Xmm(15);

    /// `XMMid`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in `0..16`.
    #[track_caller]
    pub const fn new(id: u8) -> Self {
        assert!(id < 16, "xmm register id out of range");
        Self(id)
    }
}

impl VecReg for Xmm {
    const IS_MMX: bool = false;

    fn id(self) -> u8 {
        self.0
    }
}

/// 64-bit MMX register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mmx(u8);

impl Mmx {
    pub const MM0: Mmx = Mmx(0);
    pub const MM1: Mmx = Mmx(1);
    pub const MM2: Mmx = Mmx(2);
    pub const MM3: Mmx = Mmx(3);
    pub const MM4: Mmx = Mmx(4);
    pub const MM5: Mmx = Mmx(5);
    pub const MM6: Mmx = Mmx(6);
    pub const MM7: Mmx = Mmx(7);

    /// `MMid`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in `0..8`.
    #[track_caller]
    pub const fn new(id: u8) -> Self {
        assert!(id < 8, "mmx register id out of range");
        Self(id)
    }
}

impl VecReg for Mmx {
    const IS_MMX: bool = true;

    fn id(self) -> u8 {
        self.0
    }
}

/// x87 stack register, relative to the current top of stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct St(u8);

impl St {
    pub const ST0: St = St(0);
    pub const ST1: St = St(1);
    pub const ST2: St = St(2);
    pub const ST3: St = St(3);
    pub const ST4: St = St(4);
    pub const ST5: St = St(5);
    pub const ST6: St = St(6);
    pub const ST7: St = St(7);

    /// `ST(i)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not in `0..8`.
    #[track_caller]
    pub const fn new(i: u8) -> Self {
        assert!(i < 8, "x87 stack index out of range");
        Self(i)
    }

    /// Stack slot, 0–7.
    pub fn index(self) -> u8 {
        self.0
    }
}

// ─── Addressing ─────────────────────────────────────────────

/// Register used to form an address: 64-bit in long mode, 32-bit in
/// 32-bit mode (or in long mode behind an address-size override).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddrReg {
    id: u8,
    wide: bool,
}

impl AddrReg {
    /// Hardware register number.
    pub fn id(self) -> u8 {
        self.id
    }

    /// Whether this is a 64-bit register.
    pub fn is_wide(self) -> bool {
        self.wide
    }

    fn code(self) -> u8 {
        self.id & 7
    }
}

impl From<Reg64> for AddrReg {
    fn from(r: Reg64) -> Self {
        AddrReg {
            id: r.id(),
            wide: true,
        }
    }
}

impl From<Reg32> for AddrReg {
    fn from(r: Reg32) -> Self {
        AddrReg {
            id: r.id(),
            wide: false,
        }
    }
}

/// SIB scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scale {
    /// ×1
    #[default]
    S1,
    /// ×2
    S2,
    /// ×4
    S4,
    /// ×8
    S8,
}

impl Scale {
    /// Two-bit SIB.scale field.
    pub fn bits(self) -> u8 {
        match self {
            Scale::S1 => 0,
            Scale::S2 => 1,
            Scale::S4 => 2,
            Scale::S8 => 3,
        }
    }

    /// The multiplier.
    pub fn factor(self) -> u8 {
        1 << self.bits()
    }
}

impl TryFrom<u8> for Scale {
    type Error = EmitError;

    fn try_from(scale: u8) -> Result<Self, EmitError> {
        match scale {
            1 => Ok(Scale::S1),
            2 => Ok(Scale::S2),
            4 => Ok(Scale::S4),
            8 => Ok(Scale::S8),
            _ => Err(EmitError::InvalidScale { scale }),
        }
    }
}

/// A register validated for use as a SIB index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Index(AddrReg);

impl Index {
    /// Validate `reg` as an index register.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::InvalidIndex`] for ESP/RSP: index field `100`
    /// without REX.X encodes "no index". R12 is accepted.
    pub fn new(reg: impl Into<AddrReg>) -> Result<Self, EmitError> {
        let reg = reg.into();
        if reg.id == 4 {
            return Err(EmitError::InvalidIndex { reg: reg.id });
        }
        Ok(Index(reg))
    }

    /// The underlying register.
    pub fn reg(self) -> AddrReg {
        self.0
    }
}

/// A memory operand.
///
/// # Examples
///
/// ```
/// use x86_emit::{Mem, Reg64, Scale};
///
/// // [rcx + rdx*4 + 8]
/// let m = Mem::sib(Reg64::RCX, Reg64::RDX, 4, 8).unwrap();
/// assert_eq!(m, Mem::indexed(Reg64::RCX, x86_emit::Index::new(Reg64::RDX).unwrap(), Scale::S4, 8));
///
/// // ESP cannot be an index
/// assert!(Mem::sib(Reg64::RAX, Reg64::RSP, 1, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mem {
    /// `[addr]`: absolute address, encoded as a 32-bit displacement.
    Absolute(u64),
    /// `[base + disp]`
    Base {
        /// Base register.
        base: AddrReg,
        /// Constant displacement.
        disp: i32,
    },
    /// `[base + index*scale + disp]`, or `[index*scale + disp32]` with no base.
    Indexed {
        /// Base register, if any.
        base: Option<AddrReg>,
        /// Index register.
        index: Index,
        /// Index multiplier.
        scale: Scale,
        /// Constant displacement.
        disp: i32,
    },
    /// `[rip + disp]` (long mode only).
    RipRelative(i32),
}

impl Mem {
    /// `[addr]`
    pub fn abs(addr: u64) -> Self {
        Mem::Absolute(addr)
    }

    /// `[base]`
    pub fn base(base: impl Into<AddrReg>) -> Self {
        Mem::Base {
            base: base.into(),
            disp: 0,
        }
    }

    /// `[base + disp]`
    pub fn base_disp(base: impl Into<AddrReg>, disp: i32) -> Self {
        Mem::Base {
            base: base.into(),
            disp,
        }
    }

    /// `[base + index*scale + disp]`
    pub fn indexed(base: impl Into<AddrReg>, index: Index, scale: Scale, disp: i32) -> Self {
        Mem::Indexed {
            base: Some(base.into()),
            index,
            scale,
            disp,
        }
    }

    /// `[index*scale + disp32]`
    pub fn index_only(index: Index, scale: Scale, disp: i32) -> Self {
        Mem::Indexed {
            base: None,
            index,
            scale,
            disp,
        }
    }

    /// `[rip + disp]`
    pub fn rip(disp: i32) -> Self {
        Mem::RipRelative(disp)
    }

    /// `[base + index*scale + disp]` from unchecked parts.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::InvalidScale`] or [`EmitError::InvalidIndex`].
    pub fn sib(
        base: impl Into<AddrReg>,
        index: impl Into<AddrReg>,
        scale: u8,
        disp: i32,
    ) -> Result<Self, EmitError> {
        let scale = Scale::try_from(scale)?;
        let index = Index::new(index)?;
        Ok(Mem::indexed(base, index, scale, disp))
    }

    /// The same operand `delta` bytes further on.
    ///
    /// Displacements wrap on overflow, matching the hardware's address
    /// arithmetic.
    pub fn offset(self, delta: i32) -> Self {
        match self {
            Mem::Absolute(addr) => Mem::Absolute(addr.wrapping_add(delta as i64 as u64)),
            Mem::Base { base, disp } => Mem::Base {
                base,
                disp: disp.wrapping_add(delta),
            },
            Mem::Indexed {
                base,
                index,
                scale,
                disp,
            } => Mem::Indexed {
                base,
                index,
                scale,
                disp: disp.wrapping_add(delta),
            },
            Mem::RipRelative(disp) => Mem::RipRelative(disp.wrapping_add(delta)),
        }
    }

    /// Lower to raw ModR/M, SIB and displacement fields for `mode`.
    ///
    /// # Errors
    ///
    /// - [`EmitError::AddressOutOfRange`] for an absolute address that
    ///   does not fit a 32-bit displacement (sign-extended in long mode).
    /// - [`EmitError::ModeMismatch`] for 64-bit or R8–R15 address
    ///   registers in 32-bit mode, RIP-relative addressing outside long
    ///   mode, or a base and index of different widths.
    pub fn layout(&self, mode: Mode) -> Result<AddressLayout, EmitError> {
        match *self {
            Mem::Absolute(addr) => absolute_layout(addr, mode),
            Mem::Base { base, disp } => {
                check_addr_reg(base, mode)?;
                let disp = Disp::for_base(disp, base.code());
                let sib = (base.code() == 4).then_some(SibFields {
                    scale: 0,
                    index: 4,
                    base: 4,
                });
                Ok(AddressLayout {
                    mod_bits: disp.mod_bits(),
                    rm: base.code(),
                    sib,
                    disp,
                    rex_x: false,
                    rex_b: base.id >= 8,
                    addr_override: mode.is_64() && !base.wide,
                })
            }
            Mem::Indexed {
                base: Some(base),
                index,
                scale,
                disp,
            } => {
                check_addr_reg(base, mode)?;
                check_addr_reg(index.0, mode)?;
                if base.wide != index.0.wide {
                    return Err(EmitError::ModeMismatch {
                        detail: "base and index registers of different widths".to_string(),
                        mode,
                    });
                }
                let disp = Disp::for_base(disp, base.code());
                Ok(AddressLayout {
                    mod_bits: disp.mod_bits(),
                    rm: 4,
                    sib: Some(SibFields {
                        scale: scale.bits(),
                        index: index.0.code(),
                        base: base.code(),
                    }),
                    disp,
                    rex_x: index.0.id >= 8,
                    rex_b: base.id >= 8,
                    addr_override: mode.is_64() && !base.wide,
                })
            }
            Mem::Indexed {
                base: None,
                index,
                scale,
                disp,
            } => {
                check_addr_reg(index.0, mode)?;
                Ok(AddressLayout {
                    mod_bits: 0,
                    rm: 4,
                    sib: Some(SibFields {
                        scale: scale.bits(),
                        index: index.0.code(),
                        base: 5,
                    }),
                    disp: Disp::I32(disp),
                    rex_x: index.0.id >= 8,
                    rex_b: false,
                    addr_override: mode.is_64() && !index.0.wide,
                })
            }
            Mem::RipRelative(disp) => {
                if !mode.is_64() {
                    return Err(EmitError::ModeMismatch {
                        detail: "rip-relative addressing".to_string(),
                        mode,
                    });
                }
                Ok(AddressLayout {
                    mod_bits: 0,
                    rm: 5,
                    sib: None,
                    disp: Disp::I32(disp),
                    rex_x: false,
                    rex_b: false,
                    addr_override: false,
                })
            }
        }
    }

    /// Check that the operand is encodable in `mode`.
    ///
    /// # Errors
    ///
    /// Same as [`layout`](Self::layout).
    pub fn validate(&self, mode: Mode) -> Result<(), EmitError> {
        self.layout(mode).map(|_| ())
    }
}

fn check_addr_reg(reg: AddrReg, mode: Mode) -> Result<(), EmitError> {
    if !mode.is_64() && (reg.wide || reg.id >= 8) {
        return Err(EmitError::ModeMismatch {
            detail: alloc::format!(
                "{} address register {}",
                if reg.wide { "64-bit" } else { "extended" },
                reg.id
            ),
            mode,
        });
    }
    Ok(())
}

fn absolute_layout(addr: u64, mode: Mode) -> Result<AddressLayout, EmitError> {
    match mode {
        Mode::X86 => {
            let addr = u32::try_from(addr).map_err(|_| EmitError::AddressOutOfRange { address: addr, mode })?;
            Ok(AddressLayout {
                mod_bits: 0,
                rm: 5,
                sib: None,
                disp: Disp::I32(addr as i32),
                rex_x: false,
                rex_b: false,
                addr_override: false,
            })
        }
        Mode::X64 => {
            // mod=00 rm=101 is RIP-relative here; absolute needs SIB with
            // no base and no index.
            let disp = i32::try_from(addr as i64)
                .map_err(|_| EmitError::AddressOutOfRange { address: addr, mode })?;
            Ok(AddressLayout {
                mod_bits: 0,
                rm: 4,
                sib: Some(SibFields {
                    scale: 0,
                    index: 4,
                    base: 5,
                }),
                disp: Disp::I32(disp),
                rex_x: false,
                rex_b: false,
                addr_override: false,
            })
        }
    }
}

/// Raw SIB fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SibFields {
    /// Two-bit scale.
    pub scale: u8,
    /// Low three bits of the index register (4 = none).
    pub index: u8,
    /// Low three bits of the base register (5 with mod=00 = no base).
    pub base: u8,
}

/// Encoded displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disp {
    /// No displacement bytes.
    None,
    /// One signed byte.
    I8(i8),
    /// Four bytes, little-endian.
    I32(i32),
}

impl Disp {
    /// Shortest displacement for a base register with low bits `code`.
    fn for_base(disp: i32, code: u8) -> Self {
        if disp == 0 && code != 5 {
            Disp::None
        } else if let Ok(d) = i8::try_from(disp) {
            Disp::I8(d)
        } else {
            Disp::I32(disp)
        }
    }

    fn mod_bits(self) -> u8 {
        match self {
            Disp::None => 0,
            Disp::I8(_) => 1,
            Disp::I32(_) => 2,
        }
    }

    /// Encoded length in bytes.
    pub fn len(self) -> usize {
        match self {
            Disp::None => 0,
            Disp::I8(_) => 1,
            Disp::I32(_) => 4,
        }
    }
}

/// Raw fields of a lowered memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLayout {
    /// ModR/M.mod: 0, 1 or 2.
    pub mod_bits: u8,
    /// ModR/M.rm: low three bits of the base, 4 (SIB follows) or 5.
    pub rm: u8,
    /// SIB fields, when a SIB byte is required.
    pub sib: Option<SibFields>,
    /// Displacement.
    pub disp: Disp,
    /// REX.X: index register is R8–R15.
    pub rex_x: bool,
    /// REX.B: base register is R8–R15.
    pub rex_b: bool,
    /// 0x67 address-size override (32-bit registers in long mode).
    pub addr_override: bool,
}

impl AddressLayout {
    /// Whether the operand needs a SIB byte.
    pub fn needs_sib(&self) -> bool {
        self.sib.is_some()
    }

    /// Bytes taken by ModR/M, SIB and displacement.
    pub fn encoded_len(&self) -> usize {
        1 + usize::from(self.needs_sib()) + self.disp.len()
    }
}

// ─── Sized memory ───────────────────────────────────────────

/// A memory operand with an explicit width, for forms where no register
/// implies one (`mov dword [eax], 5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ptr {
    /// Access width.
    pub size: OperandSize,
    /// Address.
    pub mem: Mem,
}

/// `byte [mem]`
pub fn byte_ptr(mem: Mem) -> Ptr {
    Ptr {
        size: OperandSize::Byte,
        mem,
    }
}

/// `word [mem]`
pub fn word_ptr(mem: Mem) -> Ptr {
    Ptr {
        size: OperandSize::Word,
        mem,
    }
}

/// `dword [mem]`
pub fn dword_ptr(mem: Mem) -> Ptr {
    Ptr {
        size: OperandSize::Dword,
        mem,
    }
}

/// `qword [mem]`
pub fn qword_ptr(mem: Mem) -> Ptr {
    Ptr {
        size: OperandSize::Qword,
        mem,
    }
}
