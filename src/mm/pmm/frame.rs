use crate::mm::addr::PhysAddr;
use crate::mm::config::PAGE_SIZE;
use core::fmt;

/// Um frame de memória física (tamanho fixo PAGE_SIZE = 4KiB)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysFrame {
    start_address: PhysAddr,
}

impl PhysFrame {
    /// Cria um frame a partir de um endereço já alinhado
    #[inline]
    pub const fn from_start_address(addr: PhysAddr) -> Self {
        Self {
            start_address: addr,
        }
    }

    /// Retorna o endereço inicial do frame
    #[inline]
    pub const fn start_address(&self) -> PhysAddr {
        self.start_address
    }

    /// Retorna o tamanho do frame
    #[inline]
    pub const fn size(&self) -> u64 {
        PAGE_SIZE as u64
    }

    /// Verifica se `addr` cai dentro deste frame
    #[inline]
    pub fn contains(&self, addr: PhysAddr) -> bool {
        let start = self.start_address.as_u64();
        addr.as_u64() >= start && addr.as_u64() < start + self.size()
    }
}

impl fmt::Debug for PhysFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysFrame({:?})", self.start_address)
    }
}
