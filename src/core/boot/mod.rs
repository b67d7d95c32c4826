//! Boot: configuração recebida do bootloader.

pub mod cmdline;

pub use cmdline::{AhciResetMode, CommandLine};
