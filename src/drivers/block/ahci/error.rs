//! Erros da camada AHCI.

use super::port::PortError;
use crate::drivers::irq::IrqError;
use crate::mm::MmError;
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AhciError {
    /// Sem frames para o scratch de IDENTIFY (ou sem heap)
    OutOfMemory,
    /// Outro erro do gerenciador de memória
    Memory(MmError),
    /// Algum bit da máscara já pertence a outro handler
    PortsAlreadyClaimed,
    /// Falha ao registrar/habilitar a linha de IRQ
    Irq(IrqError),
    /// A fábrica não conseguiu construir a porta `index`
    PortCreation { index: u8, error: PortError },
    /// GHC.HR não voltou a zero
    HbaResetTimeout,
    /// PI = 0
    NoImplementedPorts,
    /// Nenhuma linha de IRQ fornecida
    NoInterruptLines,
}

impl AhciError {
    pub fn as_str(&self) -> &'static str {
        match self {
            AhciError::OutOfMemory => "Sem memória para o scratch IDENTIFY",
            AhciError::Memory(err) => err.as_str(),
            AhciError::PortsAlreadyClaimed => "Portas já pertencem a outro handler",
            AhciError::Irq(err) => err.as_str(),
            AhciError::PortCreation { error, .. } => error.as_str(),
            AhciError::HbaResetTimeout => "Timeout no reset do HBA",
            AhciError::NoImplementedPorts => "Nenhuma porta implementada",
            AhciError::NoInterruptLines => "Nenhuma linha de IRQ",
        }
    }
}

impl fmt::Display for AhciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AhciError::PortCreation { index, error } => {
                write!(f, "Falha ao criar porta {}: {}", index, error)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<MmError> for AhciError {
    fn from(err: MmError) -> Self {
        match err {
            MmError::OutOfMemory => AhciError::OutOfMemory,
            other => AhciError::Memory(other),
        }
    }
}

impl From<IrqError> for AhciError {
    fn from(err: IrqError) -> Self {
        AhciError::Irq(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn conversions_and_messages() {
        assert_eq!(AhciError::from(MmError::OutOfMemory), AhciError::OutOfMemory);
        assert_eq!(
            AhciError::from(MmError::DoubleFree),
            AhciError::Memory(MmError::DoubleFree)
        );
        assert_eq!(
            AhciError::from(IrqError::LineUnavailable),
            AhciError::Irq(IrqError::LineUnavailable)
        );

        let err = AhciError::PortCreation {
            index: 7,
            error: PortError::NoDevice,
        };
        assert_eq!(err.to_string(), "Falha ao criar porta 7: Nenhum dispositivo");
        assert_eq!(AhciError::HbaResetTimeout.to_string(), "Timeout no reset do HBA");
    }
}
