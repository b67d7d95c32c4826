//! # Addr - Wrappers Type-Safe para Endereços
//!
//! O driver AHCI só lida com endereços físicos (programados no HBA para DMA).

mod phys;

pub use phys::PhysAddr;
