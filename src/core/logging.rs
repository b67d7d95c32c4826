// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// ARQUITETURA:
// - Filtragem em compile-time via features do Cargo
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Evita geração de código SSE/AVX
// - SEM alocação - Seguro dentro de handlers de IRQ
// - Escreve APENAS na serial
//
// NÍVEIS (feature -> níveis ativos):
// - log_error: ERROR, WARN
// - log_info:  + INFO
// - log_debug: + DEBUG
// - log_trace: + TRACE (padrão)
//
// COMO USAR:
//   kinfo!("(AHCI) Inicializando...");        // Apenas string
//   kdebug!("(AHCI) IRQ=", irq);               // String + hex
//
// Convenção: toda mensagem começa com a tag do subsistema entre parênteses.
//
// =============================================================================

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

/// Emite uma linha: prefixo + mensagem.
#[doc(hidden)]
#[inline(never)]
pub fn line(prefix: &str, msg: &str) {
    crate::drivers::serial::emit_str(prefix);
    crate::drivers::serial::emit_str(msg);
    crate::drivers::serial::emit_nl();
}

/// Emite uma linha: prefixo + mensagem + valor hex.
#[doc(hidden)]
#[inline(never)]
pub fn line_hex(prefix: &str, msg: &str, val: u64) {
    crate::drivers::serial::emit_str(prefix);
    crate::drivers::serial::emit_str(msg);
    crate::drivers::serial::emit_hex(val);
    crate::drivers::serial::emit_nl();
}

// =============================================================================
// ERROR / WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_ERROR, $msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::line_hex($crate::core::logging::P_ERROR, $msg, $val as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_WARN, $msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::line_hex($crate::core::logging::P_WARN, $msg, $val as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// INFO
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_INFO, $msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::line_hex($crate::core::logging::P_INFO, $msg, $val as u64);
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// DEBUG
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_DEBUG, $msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::line_hex($crate::core::logging::P_DEBUG, $msg, $val as u64);
    }};
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// TRACE
// =============================================================================

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_TRACE, $msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::line_hex($crate::core::logging::P_TRACE, $msg, $val as u64);
    }};
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_OK, $msg);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::core::logging::line($crate::core::logging::P_FAIL, $msg);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}
