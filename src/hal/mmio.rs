//! # Registradores de 32 bits
//!
//! `Register32` é a fronteira entre o driver e o hardware: o driver AHCI só
//! enxerga leituras e escritas de palavras de 32 bits. A semântica de cada
//! registrador (RW, RO, write-1-to-clear) pertence ao dispositivo, não à trait.
//!
//! `MmioRegister` implementa a trait sobre memória mapeada usando
//! `volatile::VolatilePtr`, garantindo que o compilador não elimine nem
//! reordene acessos.

use core::ptr::NonNull;
use volatile::VolatilePtr;

/// Registrador de 32 bits acessível de qualquer contexto (inclusive IRQ).
pub trait Register32: Send + Sync {
    /// Lê o valor atual (sem cache).
    fn read(&self) -> u32;

    /// Escreve `value` em uma única operação.
    fn write(&self, value: u32);
}

/// Registrador MMIO.
#[derive(Clone, Copy)]
pub struct MmioRegister {
    addr: NonNull<u32>,
}

// SAFETY: O registrador é um endereço de dispositivo; acessos são volatile e
// de palavra inteira. Quem serializa escritas concorrentes é o dono do bit
// (ver MaskedBitField).
unsafe impl Send for MmioRegister {}
unsafe impl Sync for MmioRegister {}

impl MmioRegister {
    /// # Safety
    ///
    /// `addr` deve apontar para um registrador de 32 bits mapeado e alinhado,
    /// válido enquanto este valor (ou cópias dele) existir.
    pub const unsafe fn new(addr: NonNull<u32>) -> Self {
        Self { addr }
    }

    #[inline]
    fn ptr(&self) -> VolatilePtr<'_, u32> {
        // SAFETY: garantido pelo contrato de `new`
        unsafe { VolatilePtr::new(self.addr) }
    }

    /// Leitura-modificação-escrita. NÃO usar em registradores write-1-to-clear.
    #[inline]
    pub fn update(&self, f: impl FnOnce(u32) -> u32) {
        self.ptr().update(f);
    }

    /// Liga `bits` preservando os demais (RMW).
    #[inline]
    pub fn set_bits(&self, bits: u32) {
        self.update(|value| value | bits);
    }

    /// Desliga `bits` preservando os demais (RMW).
    #[inline]
    pub fn clear_bits(&self, bits: u32) {
        self.update(|value| value & !bits);
    }
}

impl Register32 for MmioRegister {
    #[inline]
    fn read(&self) -> u32 {
        self.ptr().read()
    }

    #[inline]
    fn write(&self, value: u32) {
        self.ptr().write(value);
    }
}
