//! # Memory Management (MM)
//!
//! Subconjunto do MM do kernel usado pelo driver AHCI.
//!
//! | Módulo   | Responsabilidade                                        |
//! |----------|---------------------------------------------------------|
//! | `config` | Tamanho de página e helpers de alinhamento              |
//! | `addr`   | `PhysAddr` type-safe                                    |
//! | `pmm`    | Frames físicos, trait `FrameAllocator`, alocador bitmap |
//! | `error`  | `MmError` / `MmResult`                                  |
//!
//! O driver só consome frames: páginas de scratch para IDENTIFY precisam ser
//! fisicamente residentes e estáveis enquanto o handler existir.

pub mod addr;
pub mod config;
pub mod error;
pub mod pmm;

pub use addr::PhysAddr;
pub use error::{MmError, MmResult};
pub use pmm::{BitmapFrameAllocator, FrameAllocator, PhysFrame};
