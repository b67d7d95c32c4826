//! Forge AHCI.
//!
//! Camada de roteamento de interrupções e posse de portas do driver AHCI do
//! kernel Forge: uma linha de IRQ compartilhada, até 32 portas SATA atrás
//! dela, e a região de scratch DMA onde cada porta recebe seus dados de
//! IDENTIFY.
//!
//! Fora de `cfg(test)` a crate é `no_std` + `alloc`, como o resto do kernel.

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (Vec/Arc)
extern crate alloc;

// --- Módulos de Baixo Nível (Hardware) ---
pub mod drivers; // Serial, IRQ, AHCI
pub mod hal; // Registradores MMIO

// --- Módulos Centrais ---
pub mod core; // Logging, linha de comando
pub mod klib; // Framework de self-test
pub mod mm; // Endereços físicos, frames, PMM

pub use crate::drivers::block::ahci::{AhciController, PortHandler};
