//! # Interface das portas
//!
//! A máquina de estados de cada porta SATA (command list, FIS, slots) vive
//! fora desta camada. O handler só precisa de três operações:
//!
//! - `reset()`: bring-up agressivo (COMRESET completo)
//! - `initialize_without_reset()`: bring-up conservador
//! - `handle_interrupt()`: tratar o IS da porta (contexto de IRQ)
//!
//! As portas são criadas por uma `PortFactory`, que recebe um `PortBinding`
//! com tudo que a porta pode guardar: referência fraca ao handler, o handle
//! do bloco de registradores e o índice.

use super::handler::PortHandler;
use super::regs::PortRegisters;
use alloc::sync::{Arc, Weak};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// Nenhum dispositivo detectado (SSTS.DET != 3)
    NoDevice,
    /// Link SATA não estabeleceu
    LinkDown,
    /// Dispositivo não respondeu a tempo
    Timeout,
    /// Task file reportou erro
    DeviceFault,
    /// Sem memória para as estruturas da porta
    OutOfMemory,
}

impl PortError {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortError::NoDevice => "Nenhum dispositivo",
            PortError::LinkDown => "Link SATA inativo",
            PortError::Timeout => "Dispositivo não respondeu",
            PortError::DeviceFault => "Erro reportado pelo dispositivo",
            PortError::OutOfMemory => "Sem memória para a porta",
        }
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uma porta SATA atrás do handler.
pub trait AhciPort: Send + Sync {
    /// Índice global da porta (0..32)
    fn index(&self) -> u8;

    /// Reset completo de hardware e bring-up.
    fn reset(&self) -> Result<(), PortError>;

    /// Bring-up preservando o estado deixado pelo firmware.
    fn initialize_without_reset(&self) -> Result<(), PortError>;

    /// Atende a interrupção pendente da porta.
    ///
    /// Contexto de IRQ: não pode bloquear nem alocar.
    fn handle_interrupt(&self);
}

/// O que uma porta recebe ao ser construída.
#[derive(Clone)]
pub struct PortBinding {
    /// Referência fraca: a porta não mantém o handler vivo.
    pub handler: Weak<PortHandler>,
    pub registers: PortRegisters,
    pub index: u8,
}

/// Constrói as portas de um handler.
pub trait PortFactory: Send + Sync {
    fn create_port(&self, binding: PortBinding) -> Result<Arc<dyn AhciPort>, PortError>;
}
