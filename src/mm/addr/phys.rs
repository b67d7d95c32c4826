use crate::mm::config::is_aligned;
use core::fmt;

/// Endereço físico (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    /// Cria novo endereço físico
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Retorna o valor interno como u64
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Verifica alinhamento
    #[inline]
    pub fn is_aligned(self, align: u64) -> bool {
        is_aligned(self.0 as usize, align as usize)
    }

    /// Adiciona offset
    #[inline]
    pub const fn offset(self, offset: u64) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::PhysAddr;

    #[test]
    fn offset_and_alignment() {
        let addr = PhysAddr::new(0x0000_0001_8000_0200);
        assert_eq!(addr.offset(0x200).as_u64(), 0x0000_0001_8000_0400);
        assert!(!addr.is_aligned(4096));
        assert!(addr.offset(0xE00).is_aligned(4096));
        assert!(addr.is_aligned(512));
    }
}
