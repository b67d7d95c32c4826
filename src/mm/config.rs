//! # Configuração do Módulo de Memória
//!
//! Tamanho de página e verificação de alinhamento.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

// =============================================================================
// HELPERS DE ALINHAMENTO
// =============================================================================

/// Verifica alinhamento.
#[inline]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    (val & (align - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_check() {
        assert!(is_aligned(0, PAGE_SIZE));
        assert!(is_aligned(3 * PAGE_SIZE, PAGE_SIZE));
        assert!(!is_aligned(3 * PAGE_SIZE + 512, PAGE_SIZE));
        assert!(is_aligned(3 * PAGE_SIZE + 512, 512));
    }
}
