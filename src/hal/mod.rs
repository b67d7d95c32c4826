//! Hardware Abstraction Layer (HAL)
//!
//! Acesso a registradores de dispositivos independentemente de como o
//! registrador é materializado (MMIO real ou espelho em memória), e controle
//! de interrupções da CPU local.

pub mod cpu;
pub mod mmio;

pub use cpu::InterruptGuard;
pub use mmio::{MmioRegister, Register32};
