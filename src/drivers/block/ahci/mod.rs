//! # AHCI - Roteamento de Interrupções e Posse de Portas
//!
//! Um HBA AHCI expõe até 32 portas SATA e UM registrador de status global
//! (`IS`), onde o bit `i` indica interrupção pendente na porta `i`. O
//! controlador pode ser servido por uma ou mais linhas de IRQ; cada linha tem
//! um `PortHandler` responsável por um subconjunto DISJUNTO das portas.
//!
//! ## Fluxo
//!
//! ```text
//! cmdline (ahci_reset_mode) ──► política
//!                                   │
//! AhciController::attach_port_handlers(irqs)
//!     │  distribute_ports: PI dividido entre as linhas
//!     ▼
//! PortHandler::create(controller, irq, máscara)
//!     1. claim dos bits de IS (sobreposição = erro)
//!     2. 4 páginas de scratch IDENTIFY
//!     3. set_all() limpa interrupções velhas
//!     4. registra a linha na IrqTable
//!     5. cria uma porta por bit da máscara
//!     6. reset() ou initialize_without_reset() em TODAS as portas
//!
//! IRQ ──► IrqTable::dispatch ──► PortHandler::handle_irq
//!     snapshot de IS & máscara, porta a porta em ordem crescente:
//!     handle_interrupt() e depois ack (write-1-to-clear)
//! ```
//!
//! ## Regras de contexto
//! `handle_irq` roda em contexto de interrupção: sem alocação, sem lock, sem
//! espera. Tudo que ele usa é pré-alocado na criação.

pub mod bitfield;
pub mod controller;
pub mod error;
pub mod handler;
pub mod port;
pub mod regs;
pub mod scratch;


#[cfg(test)]
mod testing;

/// Portas por HBA (largura de IS/PI)
pub const MAX_PORTS: usize = 32;

/// Tamanho do bloco de dados de IDENTIFY
pub const IDENTIFY_BLOCK_SIZE: usize = 512;

pub use crate::core::boot::AhciResetMode;
pub use bitfield::{InterruptStatus, MaskedBitField, PortMask};
pub use controller::{distribute_ports, AhciController, HostController};
pub use error::AhciError;
pub use handler::{HandlerResources, PortHandler};
pub use port::{AhciPort, PortBinding, PortError, PortFactory};
pub use regs::{HbaCapabilities, HbaMemory, PortRegisters};
pub use scratch::IdentifyScratch;
