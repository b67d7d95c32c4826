//! # BitmapFrameAllocator
//!
//! Alocador first-fit de frames sobre UMA região física contígua.
//!
//! Cada bit do bitmap representa um frame: `1` = ocupado, `0` = livre.
//! Bits além de `total_frames` na última palavra ficam permanentemente em `1`
//! para que a busca nunca os entregue.
//!
//! O bitmap vive no heap do kernel (não dentro da própria região), então a
//! região inteira fica disponível para DMA.

use super::frame::PhysFrame;
use super::stats::PmmStats;
use super::FrameAllocator;
use crate::mm::addr::PhysAddr;
use crate::mm::config::PAGE_SIZE;
use crate::mm::error::{MmError, MmResult};
use alloc::vec::Vec;

const BITS_PER_WORD: usize = 64;

/// BitmapFrameAllocator - Gerencia uma região física usando um bitmap.
pub struct BitmapFrameAllocator {
    base: PhysAddr,
    bitmap: Vec<u64>,
    total_frames: usize,
    next_free: usize,
    stats: PmmStats,
}

impl BitmapFrameAllocator {
    /// Cria alocador sobre `[base, base + frame_count * PAGE_SIZE)`.
    pub fn new(base: PhysAddr, frame_count: usize) -> MmResult<Self> {
        if !base.is_aligned(PAGE_SIZE as u64) {
            return Err(MmError::NotAligned);
        }
        if frame_count == 0 {
            return Err(MmError::InvalidParameter);
        }

        let words = frame_count.div_ceil(BITS_PER_WORD);
        let mut bitmap = Vec::new();
        bitmap
            .try_reserve_exact(words)
            .map_err(|_| MmError::OutOfMemory)?;
        bitmap.resize(words, 0);

        // Bits de cauda (sem frame real) ficam ocupados
        let tail = frame_count % BITS_PER_WORD;
        if tail != 0 {
            bitmap[words - 1] = !((1u64 << tail) - 1);
        }

        let mut stats = PmmStats::new();
        stats.total_frames = frame_count;

        crate::kdebug!("(PMM) Região bitmap base=", base.as_u64());
        crate::kdebug!("(PMM) Região bitmap frames=", frame_count);

        Ok(Self {
            base,
            bitmap,
            total_frames: frame_count,
            next_free: 0,
            stats,
        })
    }

    /// Aloca o primeiro frame livre a partir da dica `next_free`.
    pub fn allocate(&mut self) -> MmResult<PhysFrame> {
        let words = self.bitmap.len();
        let start_word = self.next_free / BITS_PER_WORD;

        for step in 0..words {
            let word_idx = (start_word + step) % words;
            let word = self.bitmap[word_idx];
            if word == u64::MAX {
                continue;
            }

            let bit = word.trailing_ones() as usize;
            let index = word_idx * BITS_PER_WORD + bit;
            self.bitmap[word_idx] |= 1 << bit;
            self.next_free = index + 1;
            self.stats.inc_alloc();

            crate::ktrace!("(PMM) Frame alocado idx=", index);
            return Ok(self.frame_at(index));
        }

        self.stats.inc_failed();
        crate::kwarn!("(PMM) Região esgotada, frames=", self.total_frames);
        Err(MmError::OutOfMemory)
    }

    /// Devolve um frame. Frames fora da região ou já livres são rejeitados.
    pub fn deallocate(&mut self, frame: PhysFrame) -> MmResult<()> {
        let index = self.index_of(frame)?;
        let (word, bit) = (index / BITS_PER_WORD, index % BITS_PER_WORD);

        if self.bitmap[word] & (1 << bit) == 0 {
            crate::kerror!("(PMM) Double free em ", frame.start_address().as_u64());
            return Err(MmError::DoubleFree);
        }

        self.bitmap[word] &= !(1 << bit);
        self.stats.inc_free();
        if index < self.next_free {
            self.next_free = index;
        }
        Ok(())
    }

    /// Estatísticas da região
    pub fn stats(&self) -> &PmmStats {
        &self.stats
    }

    /// Frames ainda disponíveis
    pub fn free_frames(&self) -> usize {
        self.stats.free_frames()
    }

    fn frame_at(&self, index: usize) -> PhysFrame {
        PhysFrame::from_start_address(self.base.offset((index * PAGE_SIZE) as u64))
    }

    fn index_of(&self, frame: PhysFrame) -> MmResult<usize> {
        let addr = frame.start_address();
        if !addr.is_aligned(PAGE_SIZE as u64) {
            return Err(MmError::NotAligned);
        }
        let Some(delta) = addr.as_u64().checked_sub(self.base.as_u64()) else {
            return Err(MmError::OutOfBounds);
        };
        let index = delta as usize / PAGE_SIZE;
        if index >= self.total_frames {
            return Err(MmError::OutOfBounds);
        }
        Ok(index)
    }
}

impl FrameAllocator for spin::Mutex<BitmapFrameAllocator> {
    fn allocate_frame(&self) -> MmResult<PhysFrame> {
        self.lock().allocate()
    }

    fn deallocate_frame(&self, frame: PhysFrame) {
        if let Err(err) = self.lock().deallocate(frame) {
            crate::kerror!("(PMM) deallocate_frame rejeitado: ", frame.start_address().as_u64());
            crate::kerror!(err.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: PhysAddr = PhysAddr::new(0x0010_0000);

    #[test]
    fn hands_out_consecutive_frames_then_exhausts() {
        let mut pmm = BitmapFrameAllocator::new(BASE, 3).unwrap();

        let a = pmm.allocate().unwrap();
        let b = pmm.allocate().unwrap();
        let c = pmm.allocate().unwrap();
        assert_eq!(a.start_address(), BASE);
        assert_eq!(b.start_address(), BASE.offset(0x1000));
        assert_eq!(c.start_address(), BASE.offset(0x2000));

        assert_eq!(pmm.allocate(), Err(MmError::OutOfMemory));
        assert_eq!(pmm.free_frames(), 0);
        assert_eq!(
            pmm.stats()
                .failed_allocs
                .load(core::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn freed_frame_is_reused_first() {
        let mut pmm = BitmapFrameAllocator::new(BASE, 70).unwrap();
        let frames: Vec<_> = (0..5).map(|_| pmm.allocate().unwrap()).collect();

        pmm.deallocate(frames[1]).unwrap();
        assert_eq!(pmm.free_frames(), 66);
        assert_eq!(pmm.allocate().unwrap(), frames[1]);
    }

    #[test]
    fn rejects_double_free_and_foreign_frames() {
        let mut pmm = BitmapFrameAllocator::new(BASE, 4).unwrap();
        let frame = pmm.allocate().unwrap();

        pmm.deallocate(frame).unwrap();
        assert_eq!(pmm.deallocate(frame), Err(MmError::DoubleFree));

        let outside = PhysFrame::from_start_address(BASE.offset(4 * PAGE_SIZE as u64));
        assert_eq!(pmm.deallocate(outside), Err(MmError::OutOfBounds));

        let below = PhysFrame::from_start_address(PhysAddr::new(0x1000));
        assert_eq!(pmm.deallocate(below), Err(MmError::OutOfBounds));
    }

    #[test]
    fn rejects_bad_region() {
        assert_eq!(
            BitmapFrameAllocator::new(PhysAddr::new(0x1234), 4).err(),
            Some(MmError::NotAligned)
        );
        assert_eq!(
            BitmapFrameAllocator::new(BASE, 0).err(),
            Some(MmError::InvalidParameter)
        );
    }

    #[test]
    fn locked_allocator_implements_trait() {
        let pmm = spin::Mutex::new(BitmapFrameAllocator::new(BASE, 2).unwrap());
        let alloc: &dyn FrameAllocator = &pmm;

        let frame = alloc.allocate_frame().unwrap();
        assert_eq!(pmm.lock().free_frames(), 1);
        alloc.deallocate_frame(frame);
        assert_eq!(pmm.lock().free_frames(), 2);
    }
}
