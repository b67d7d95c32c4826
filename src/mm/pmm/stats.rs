use core::sync::atomic::{AtomicUsize, Ordering};

/// Contadores do PMM (leitura sem lock)
#[derive(Debug, Default)]
pub struct PmmStats {
    pub total_frames: usize,
    pub used_frames: AtomicUsize,
    pub failed_allocs: AtomicUsize,
}

impl PmmStats {
    pub const fn new() -> Self {
        Self {
            total_frames: 0,
            used_frames: AtomicUsize::new(0),
            failed_allocs: AtomicUsize::new(0),
        }
    }

    pub fn inc_alloc(&self) {
        self.used_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_free(&self) {
        self.used_frames.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.failed_allocs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn free_frames(&self) -> usize {
        self.total_frames
            .saturating_sub(self.used_frames.load(Ordering::Relaxed))
    }
}
