//! # Scratch de IDENTIFY
//!
//! Cada índice de porta possível (0..32) tem um buffer de 512 bytes onde o
//! dispositivo deposita os dados de IDENTIFY via DMA. São 8 buffers por
//! página de 4 KiB, portanto 4 páginas no total, SEMPRE, independente de
//! quais portas o handler possui.
//!
//! ```text
//! página 0: [p0][p1][p2][p3][p4][p5][p6][p7]
//! página 1: [p8] ...                  [p15]
//! página 2: [p16] ...                 [p23]
//! página 3: [p24] ...                 [p31]
//! ```
//!
//! O layout é indexado pelo índice GLOBAL da porta e nunca é compactado.

use super::{IDENTIFY_BLOCK_SIZE, MAX_PORTS};
use crate::mm::config::PAGE_SIZE;
use crate::mm::{FrameAllocator, MmError, MmResult, PhysAddr, PhysFrame};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Páginas necessárias para `MAX_PORTS` buffers de IDENTIFY.
pub const SCRATCH_PAGE_COUNT: usize = (MAX_PORTS * IDENTIFY_BLOCK_SIZE).div_ceil(PAGE_SIZE);

/// Páginas físicas de scratch, devolvidas ao alocador no `Drop`.
pub struct IdentifyScratch {
    frames: Vec<PhysFrame>,
    allocator: Arc<dyn FrameAllocator>,
}

impl IdentifyScratch {
    /// Aloca `SCRATCH_PAGE_COUNT` frames.
    ///
    /// Em falha, os frames já obtidos voltam ao alocador antes de retornar.
    pub fn allocate(allocator: Arc<dyn FrameAllocator>) -> MmResult<Self> {
        let mut frames = Vec::new();
        frames
            .try_reserve_exact(SCRATCH_PAGE_COUNT)
            .map_err(|_| MmError::OutOfMemory)?;

        // A partir daqui o Drop cuida de qualquer frame parcial
        let mut scratch = Self { frames, allocator };
        for _ in 0..SCRATCH_PAGE_COUNT {
            let frame = scratch.allocator.allocate_frame()?;
            scratch.frames.push(frame);
        }

        crate::kdebug!(
            "(AHCI) Scratch IDENTIFY alocado, base=",
            scratch.frames[0].start_address().as_u64()
        );
        Ok(scratch)
    }

    /// Endereço físico do buffer de IDENTIFY da porta `index`.
    ///
    /// `frames[(i * 512) / PAGE_SIZE] + (i * 512) % PAGE_SIZE`
    ///
    /// # Panics
    /// Se `index >= MAX_PORTS`.
    pub fn address_of(&self, index: u8) -> PhysAddr {
        if index as usize >= MAX_PORTS {
            crate::kerror!("(AHCI) Índice de scratch inválido: ", index);
            panic!("IdentifyScratch::address_of: port index out of range");
        }
        let offset = index as usize * IDENTIFY_BLOCK_SIZE;
        let page = &self.frames[offset / PAGE_SIZE];
        page.start_address().offset((offset % PAGE_SIZE) as u64)
    }

    pub fn frames(&self) -> &[PhysFrame] {
        &self.frames
    }
}

impl Drop for IdentifyScratch {
    fn drop(&mut self) {
        for frame in self.frames.drain(..) {
            self.allocator.deallocate_frame(frame);
        }
        crate::ktrace!("(AHCI) Scratch IDENTIFY liberado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::BitmapFrameAllocator;
    use spin::Mutex;

    const BASE: PhysAddr = PhysAddr::new(0x0020_0000);

    fn region(frames: usize) -> Arc<Mutex<BitmapFrameAllocator>> {
        Arc::new(Mutex::new(BitmapFrameAllocator::new(BASE, frames).unwrap()))
    }

    #[test]
    fn four_pages_for_thirty_two_ports() {
        assert_eq!(SCRATCH_PAGE_COUNT, 4);
    }

    #[test]
    fn every_index_maps_to_its_own_block() {
        let pmm = region(8);
        let scratch = IdentifyScratch::allocate(pmm.clone()).unwrap();
        assert_eq!(scratch.frames().len(), SCRATCH_PAGE_COUNT);

        let mut seen = Vec::new();
        for index in 0..MAX_PORTS as u8 {
            let addr = scratch.address_of(index);
            let page = scratch.frames()[index as usize / 8];
            assert!(page.contains(addr));
            assert!(page.contains(addr.offset(IDENTIFY_BLOCK_SIZE as u64 - 1)));
            assert_eq!(addr.as_u64() % IDENTIFY_BLOCK_SIZE as u64, 0);
            seen.push(addr.as_u64());
        }

        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), MAX_PORTS);

        assert_eq!(scratch.address_of(9), scratch.frames()[1].start_address().offset(512));
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let scratch = IdentifyScratch::allocate(region(4)).unwrap();
        scratch.address_of(MAX_PORTS as u8);
    }

    #[test]
    fn drop_returns_frames() {
        let pmm = region(6);
        let scratch = IdentifyScratch::allocate(pmm.clone()).unwrap();
        assert_eq!(pmm.lock().free_frames(), 2);
        drop(scratch);
        assert_eq!(pmm.lock().free_frames(), 6);
    }

    #[test]
    fn partial_allocation_is_rolled_back() {
        let pmm = region(3);
        assert_eq!(
            IdentifyScratch::allocate(pmm.clone()).err(),
            Some(MmError::OutOfMemory)
        );
        assert_eq!(pmm.lock().free_frames(), 3);
    }
}
