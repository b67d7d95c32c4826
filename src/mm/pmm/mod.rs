//! # PMM - Physical Memory Manager
//!
//! Interface de alocação de frames físicos consumida pelos drivers.

pub mod bitmap;
pub mod frame;
pub mod stats;

pub use bitmap::BitmapFrameAllocator;
pub use frame::PhysFrame;
pub use stats::PmmStats;

use crate::mm::error::MmResult;

/// Fonte de frames físicos.
///
/// Frames entregues são alinhados a página e permanecem residentes até serem
/// devolvidos com [`FrameAllocator::deallocate_frame`].
pub trait FrameAllocator: Send + Sync {
    /// Aloca um frame. Falha com `MmError::OutOfMemory` quando esgotado.
    fn allocate_frame(&self) -> MmResult<PhysFrame>;

    /// Devolve um frame previamente alocado.
    fn deallocate_frame(&self, frame: PhysFrame);
}
