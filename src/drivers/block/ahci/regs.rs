//! # Layout de registradores do HBA
//!
//! ```text
//! 0x0000 ┌──────────────────────────┐
//!        │ Generic Host Control     │ CAP GHC IS PI VS ...
//! 0x002C ├──────────────────────────┤
//!        │ reservado / NVMHCI       │
//! 0x00A0 ├──────────────────────────┤
//!        │ vendor                   │
//! 0x0100 ├──────────────────────────┤
//!        │ porta 0   (0x80 bytes)   │
//! 0x0180 ├──────────────────────────┤
//!        │ porta 1                  │
//!        │ ...                      │
//! 0x1080 │ porta 31                 │
//! 0x1100 └──────────────────────────┘
//! ```
//!
//! As structs são `#[repr(C)]` e só servem para calcular endereços; todo
//! acesso passa por `MmioRegister` (volatile).

use super::MAX_PORTS;
use crate::hal::MmioRegister;
use bitflags::bitflags;
use core::mem::size_of;
use core::ptr::{addr_of_mut, NonNull};

/// Offset da primeira porta dentro do HBA
pub const PORT_BASE: usize = 0x100;

/// Tamanho do bloco de cada porta
pub const PORT_REG_SIZE: usize = 0x80;

#[repr(C)]
pub struct GenericHostControl {
    pub cap: u32,
    pub ghc: u32,
    pub is: u32,
    pub pi: u32,
    pub vs: u32,
    pub ccc_ctl: u32,
    pub ccc_ports: u32,
    pub em_loc: u32,
    pub em_ctl: u32,
    pub cap2: u32,
    pub bohc: u32,
}

#[repr(C)]
pub struct PortRegisterBlock {
    pub clb: u32,
    pub clbu: u32,
    pub fb: u32,
    pub fbu: u32,
    pub is: u32,
    pub ie: u32,
    pub cmd: u32,
    _reserved0: u32,
    pub tfd: u32,
    pub sig: u32,
    pub ssts: u32,
    pub sctl: u32,
    pub serr: u32,
    pub sact: u32,
    pub ci: u32,
    pub sntf: u32,
    pub fbs: u32,
    pub devslp: u32,
    _reserved1: [u32; 10],
    _vendor: [u32; 4],
}

/// Região MMIO inteira do HBA (ABAR).
#[repr(C)]
pub struct HbaMemory {
    pub control: GenericHostControl,
    _reserved: [u32; 29],
    _vendor: [u32; 24],
    pub ports: [PortRegisterBlock; MAX_PORTS],
}

const _: () = assert!(size_of::<GenericHostControl>() == 0x2C);
const _: () = assert!(size_of::<PortRegisterBlock>() == PORT_REG_SIZE);
const _: () = assert!(size_of::<HbaMemory>() == PORT_BASE + MAX_PORTS * PORT_REG_SIZE);

impl PortRegisterBlock {
    const ZERO: Self = Self {
        clb: 0,
        clbu: 0,
        fb: 0,
        fbu: 0,
        is: 0,
        ie: 0,
        cmd: 0,
        _reserved0: 0,
        tfd: 0,
        sig: 0,
        ssts: 0,
        sctl: 0,
        serr: 0,
        sact: 0,
        ci: 0,
        sntf: 0,
        fbs: 0,
        devslp: 0,
        _reserved1: [0; 10],
        _vendor: [0; 4],
    };
}

impl HbaMemory {
    /// HBA com todos os registradores em zero (RAM comum, para self-tests).
    pub const fn zeroed() -> Self {
        Self {
            control: GenericHostControl {
                cap: 0,
                ghc: 0,
                is: 0,
                pi: 0,
                vs: 0,
                ccc_ctl: 0,
                ccc_ports: 0,
                em_loc: 0,
                em_ctl: 0,
                cap2: 0,
                bohc: 0,
            },
            _reserved: [0; 29],
            _vendor: [0; 24],
            ports: [PortRegisterBlock::ZERO; MAX_PORTS],
        }
    }
}

/// Handle para o bloco de registradores de UMA porta.
///
/// É o que a porta recebe na construção; copiar o handle não copia estado.
#[derive(Clone, Copy)]
pub struct PortRegisters {
    block: NonNull<PortRegisterBlock>,
    index: u8,
}

// SAFETY: só carrega o endereço; acessos são volatile via MmioRegister.
unsafe impl Send for PortRegisters {}
unsafe impl Sync for PortRegisters {}

macro_rules! port_register {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&self) -> MmioRegister {
                // SAFETY: contrato de `PortRegisters::new`
                unsafe {
                    let field = addr_of_mut!((*self.block.as_ptr()).$name);
                    MmioRegister::new(NonNull::new_unchecked(field))
                }
            }
        )*
    };
}

impl PortRegisters {
    /// # Safety
    ///
    /// `block` deve apontar para o bloco da porta `index` dentro de um HBA
    /// mapeado que sobrevive a todas as cópias deste handle.
    pub const unsafe fn new(block: NonNull<PortRegisterBlock>, index: u8) -> Self {
        Self { block, index }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Endereço do bloco (para diagnóstico e testes).
    pub fn base_address(&self) -> usize {
        self.block.as_ptr() as usize
    }

    port_register! {
        /// Command List Base (low)
        clb;
        /// Command List Base (high)
        clbu;
        /// FIS Base (low)
        fb;
        /// FIS Base (high)
        fbu;
        /// Interrupt Status da porta (write-1-to-clear)
        is;
        ie;
        cmd;
        tfd;
        sig;
        ssts;
        sctl;
        serr;
        sact;
        ci;
    }
}

bitflags! {
    /// Registrador CAP (HBA Capabilities).
    ///
    /// Campos numéricos (NP, NCS, ISS) são lidos pelos helpers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HbaCapabilities: u32 {
        /// Endereçamento 64 bits
        const S64A = 1 << 31;
        /// Native Command Queuing
        const SNCQ = 1 << 30;
        const SSNTF = 1 << 29;
        const SMPS = 1 << 28;
        /// Staggered Spin-up
        const SSS = 1 << 27;
        const SALP = 1 << 26;
        const SAL = 1 << 25;
        const SCLO = 1 << 24;
        /// Somente modo AHCI (sem legado IDE)
        const SAM = 1 << 18;
        /// Port Multiplier
        const SPM = 1 << 17;
        const FBSS = 1 << 16;
        const PMD = 1 << 15;
        const SSC = 1 << 14;
        const PSC = 1 << 13;
        const CCCS = 1 << 7;
        const EMS = 1 << 6;
        const SXS = 1 << 5;

        const _ = !0;
    }
}

impl HbaCapabilities {
    /// Número de portas suportadas pelo silício (NP + 1).
    pub const fn port_count(self) -> u8 {
        ((self.bits() & 0x1F) + 1) as u8
    }

    /// Slots de comando por porta (NCS + 1).
    pub const fn command_slots(self) -> u8 {
        (((self.bits() >> 8) & 0x1F) + 1) as u8
    }

    /// Geração SATA máxima (ISS): 1 = 1.5Gbps, 2 = 3Gbps, 3 = 6Gbps.
    pub const fn interface_speed(self) -> u8 {
        ((self.bits() >> 20) & 0xF) as u8
    }
}

bitflags! {
    /// Registrador GHC (Global HBA Control).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GlobalHostControl: u32 {
        /// AHCI Enable
        const AE = 1 << 31;
        /// MSI Revert to Single Message
        const MRSM = 1 << 2;
        /// Interrupt Enable
        const IE = 1 << 1;
        /// HBA Reset
        const HR = 1 << 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::Register32;
    use alloc::boxed::Box;

    #[test]
    fn capability_fields_decode() {
        // NP=5 (6 portas), NCS=31 (32 slots), ISS=3, S64A, SNCQ
        let raw = (1 << 31) | (1 << 30) | (3 << 20) | (31 << 8) | 5;
        let caps = HbaCapabilities::from_bits_retain(raw);

        assert_eq!(caps.port_count(), 6);
        assert_eq!(caps.command_slots(), 32);
        assert_eq!(caps.interface_speed(), 3);
        assert!(caps.contains(HbaCapabilities::S64A | HbaCapabilities::SNCQ));
        assert!(!caps.contains(HbaCapabilities::SPM));
        assert_eq!(caps.bits(), raw);
    }

    #[test]
    fn port_block_offsets() {
        let mut hba = Box::new(HbaMemory::zeroed());
        let base = &mut *hba as *mut HbaMemory as usize;
        let port = unsafe {
            PortRegisters::new(NonNull::from(&mut hba.ports[3]), 3)
        };

        assert_eq!(port.base_address() - base, PORT_BASE + 3 * PORT_REG_SIZE);
        port.is().write(0xAB);
        port.ci().write(0x1);
        assert_eq!(hba.ports[3].is, 0xAB);
        assert_eq!(hba.ports[3].ci, 0x1);
        assert_eq!(port.index(), 3);
    }
}
