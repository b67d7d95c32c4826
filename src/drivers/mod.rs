//! # Camada de Drivers
//!
//! | Driver   | Arquivo        | Papel |
//! |----------|----------------|-------|
//! | Serial   | `serial.rs`    | Sink dos logs do kernel (COM1) |
//! | IRQ      | `irq.rs`       | Tabela de linhas compartilhadas |
//! | AHCI     | `block/ahci/`  | Roteamento de interrupções e posse de portas SATA |
//!
//! ```text
//!   linha IRQ ──► IrqTable::dispatch ──► PortHandler::handle_irq
//!                                              │
//!                                 ┌────────────┼────────────┐
//!                                 ▼            ▼            ▼
//!                              porta 2      porta 5      porta 9
//! ```

pub mod block; // Armazenamento (AHCI)
pub mod irq; // Linhas de interrupção compartilhadas
pub mod serial; // UART 16550 - Logs
