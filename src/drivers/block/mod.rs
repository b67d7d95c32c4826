//! # Dispositivos de Bloco
//!
//! | Driver | Status    | Descrição |
//! |--------|-----------|-----------|
//! | AHCI   | Funcional | Roteamento de IRQ e posse de portas SATA |

pub mod ahci;
