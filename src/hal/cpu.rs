//! # Controle de interrupções da CPU local
//!
//! `InterruptGuard` desabilita interrupções na CPU atual e restaura o estado
//! anterior ao sair do escopo (mesmo esquema do guard de spinlock do kernel).
//! Quem toma um lock que também é usado em contexto de IRQ precisa segurar
//! um guard durante toda a seção crítica.
//!
//! ## Alvos
//! - Kernel x86_64: CLI/STI e RFLAGS.IF.
//! - Testes de host: um IF simulado por thread (cada thread faz papel de CPU).
//! - Outros alvos hospedados: no-op.

/// Desabilita interrupções enquanto existir.
pub struct InterruptGuard {
    were_enabled: bool,
}

impl InterruptGuard {
    pub fn new() -> Self {
        let were_enabled = backend::enabled();
        // SAFETY: o estado anterior é restaurado no Drop
        unsafe { backend::disable() };
        Self { were_enabled }
    }
}

impl Default for InterruptGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.were_enabled {
            // SAFETY: estavam habilitadas quando o guard foi criado
            unsafe { backend::enable() };
        }
    }
}

/// Interrupções estão habilitadas na CPU atual?
pub fn interrupts_enabled() -> bool {
    backend::enabled()
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod backend {
    use core::arch::asm;

    #[inline]
    pub fn enabled() -> bool {
        let rflags: u64;
        unsafe {
            asm!("pushfq; pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        // Bit 9 é IF
        (rflags & (1 << 9)) != 0
    }

    #[inline]
    pub unsafe fn disable() {
        asm!("cli", options(nomem, nostack, preserves_flags));
    }

    #[inline]
    pub unsafe fn enable() {
        asm!("sti", options(nomem, nostack, preserves_flags));
    }
}


#[cfg(not(any(test, all(target_arch = "x86_64", target_os = "none"))))]
mod backend {
    pub fn enabled() -> bool {
        false
    }

    pub unsafe fn disable() {}

    pub unsafe fn enable() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_restores_previous_state() {
        assert!(interrupts_enabled());
        {
            let _outer = InterruptGuard::new();
            assert!(!interrupts_enabled());
            {
                let _inner = InterruptGuard::new();
                assert!(!interrupts_enabled());
            }
            // O guard interno encontrou IF=0 e não religa
            assert!(!interrupts_enabled());
        }
        assert!(interrupts_enabled());
    }
}
