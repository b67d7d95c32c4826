//! Tipos de Erro do Subsistema de Memória

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem memória física disponível (OOM)
    OutOfMemory,
    /// Parâmetro inválido
    InvalidParameter,
    /// Endereço não alinhado a página
    NotAligned,
    /// Frame fora da região gerenciada
    OutOfBounds,
    /// Double free detectado
    DoubleFree,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem frames físicos disponíveis",
            Self::InvalidParameter => "Parâmetro inválido",
            Self::NotAligned => "Endereço não alinhado a página",
            Self::OutOfBounds => "Frame fora da região gerenciada",
            Self::DoubleFree => "Double free detectado",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
