//! # Visões mascaradas do registrador IS do HBA
//!
//! O registrador `IS` (Interrupt Status) é UM só para o controlador inteiro,
//! mas cada `PortHandler` responde apenas por um subconjunto das portas.
//!
//! - `PortMask`: conjunto imutável de índices de porta (bit i = porta i).
//! - `InterruptStatus`: dono do registrador; registra quais bits já foram
//!   entregues.
//! - `MaskedBitField`: visão de um subconjunto. Só se obtém via
//!   `InterruptStatus::claim`, que falha se algum bit já tiver dono. Ao ser
//!   destruída, devolve os bits.
//!
//! ## Write-1-to-clear
//! Escrever 1 num bit do IS o APAGA; escrever 0 não faz nada. Por isso
//! `set_at` escreve só o bit da porta (nunca read-modify-write): os bits
//! pendentes dos outros handlers ficam intactos.

use super::error::AhciError;
use super::MAX_PORTS;
use crate::hal::Register32;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Conjunto de portas (bit i = porta i).
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PortMask(u32);

impl PortMask {
    pub const EMPTY: Self = Self(0);

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Monta a máscara a partir de índices. Índices >= 32 são ignorados.
    pub fn from_indices(indices: impl IntoIterator<Item = u8>) -> Self {
        let bits = indices
            .into_iter()
            .filter(|&i| (i as usize) < MAX_PORTS)
            .fold(0u32, |acc, i| acc | (1 << i));
        Self(bits)
    }

    #[inline]
    pub const fn contains(self, index: u8) -> bool {
        (index as usize) < MAX_PORTS && self.0 & (1 << index) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Índices em ordem crescente, sem alocação.
    pub fn indices(self) -> SetBits {
        SetBits(self.0)
    }
}

impl fmt::Debug for PortMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortMask({:#010x})", self.0)
    }
}

/// Iterador sobre as posições ligadas de uma palavra, da menor para a maior.
///
/// É uma cópia da palavra: clonar reinicia a iteração do mesmo snapshot.
#[derive(Clone, Copy, Debug)]
pub struct SetBits(u32);

impl Iterator for SetBits {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SetBits {}

/// Dono do registrador de status compartilhado.
pub struct InterruptStatus {
    register: Arc<dyn Register32>,
    claimed: AtomicU32,
}

impl InterruptStatus {
    pub fn new(register: Arc<dyn Register32>) -> Arc<Self> {
        Arc::new(Self {
            register,
            claimed: AtomicU32::new(0),
        })
    }

    /// Reserva os bits de `mask` e devolve a visão mascarada.
    ///
    /// Falha com `PortsAlreadyClaimed` se QUALQUER bit já pertence a outra
    /// visão viva. Uma máscara vazia sempre é aceita.
    pub fn claim(self: &Arc<Self>, mask: PortMask) -> Result<MaskedBitField, AhciError> {
        let wanted = mask.bits();
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held & wanted == 0).then_some(held | wanted)
            })
            .map_err(|held| {
                crate::kerror!("(AHCI) Bits de IS já possuem dono: ", held & wanted);
                AhciError::PortsAlreadyClaimed
            })?;

        crate::ktrace!("(AHCI) Bits de IS reservados: ", wanted);
        Ok(MaskedBitField {
            source: Arc::clone(self),
            mask,
        })
    }

    /// Bits atualmente reservados por visões vivas.
    pub fn claimed(&self) -> PortMask {
        PortMask(self.claimed.load(Ordering::Acquire))
    }

    fn release(&self, mask: PortMask) {
        self.claimed.fetch_and(!mask.bits(), Ordering::AcqRel);
        crate::ktrace!("(AHCI) Bits de IS liberados: ", mask.bits());
    }
}

/// Visão de um registrador de 32 bits restrita a uma máscara fixa.
///
/// Bits fora da máscara nunca são escritos nem reportados. Não há lock
/// interno: a exclusividade vem do `claim`.
pub struct MaskedBitField {
    source: Arc<InterruptStatus>,
    mask: PortMask,
}

impl MaskedBitField {
    #[inline]
    fn read(&self) -> u32 {
        self.source.register.read() & self.mask.bits()
    }

    /// Todos os bits mascarados estão em zero? (leitura ao vivo)
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.read() == 0
    }

    /// Escreve 1 em todos os bits mascarados numa única escrita.
    pub fn set_all(&self) {
        self.source.register.write(self.mask.bits());
    }

    /// Escreve 1 em exatamente um bit (ack write-1-to-clear).
    ///
    /// # Panics
    /// Se `index` estiver fora da máscara.
    #[inline]
    pub fn set_at(&self, index: u8) {
        if !self.mask.contains(index) {
            crate::kerror!("(AHCI) set_at fora da máscara: ", index);
            panic!("MaskedBitField::set_at: index outside mask");
        }
        self.source.register.write(1 << index);
    }

    /// Bit `index` ligado (e dentro da máscara)?
    #[inline]
    pub fn is_set_at(&self, index: u8) -> bool {
        self.mask.contains(index) && self.read() & (1 << index) != 0
    }

    /// Snapshot das posições ligadas, em ordem crescente.
    ///
    /// Lê o registrador UMA vez; o iterador não enxerga mudanças posteriores.
    #[inline]
    pub fn to_indices(&self) -> SetBits {
        SetBits(self.read())
    }

    pub fn mask(&self) -> PortMask {
        self.mask
    }
}

impl Drop for MaskedBitField {
    fn drop(&mut self) {
        self.source.release(self.mask);
    }
}
