// =============================================================================
// SERIAL DRIVER - ZERO OVERHEAD
// =============================================================================
//
// Sink de log do kernel na porta serial COM1 (UART 16550).
//
// ARQUITETURA:
// - SEM Mutex/Spinlock - Escrita direta via I/O ports
// - SEM core::fmt - Evita geração de código SSE/AVX
// - SEM alocação - Apenas strings e valores imediatos
// - A UART já vem configurada pelo bootloader (38400 8N1)
//
// Pode ser chamado de dentro de handlers de IRQ (o handler AHCI loga cada
// interrupção em log_trace).
//
// ALVOS HOSPEDADOS:
// Fora do kernel (target_os != "none", ex: testes unitários no host) as
// instruções in/out não são permitidas; o sink vira no-op.
//
// =============================================================================

// Porta de dados da COM1
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const COM1_DATA: u16 = 0x3F8;

// Porta de status da COM1 (Line Status Register)
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const COM1_STATUS: u16 = 0x3FD;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
unsafe fn port_out(port: u16, value: u8) {
    core::arch::asm!(
        "out dx, al",
        in("dx") port,
        in("al") value,
        options(nostack, nomem, preserves_flags)
    );
}

// =============================================================================
// ESCRITA - CORE
// =============================================================================

/// Envia um único byte (busy wait no bit 5 do LSR).
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline(always)]
pub fn emit(byte: u8) {
    unsafe {
        loop {
            let status: u8;
            core::arch::asm!(
                "in al, dx",
                out("al") status,
                in("dx") COM1_STATUS,
                options(nostack, nomem, preserves_flags)
            );
            if (status & 0x20) != 0 {
                break;
            }
        }
        port_out(COM1_DATA, byte);
    }
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
#[inline(always)]
pub fn emit(_byte: u8) {}

/// Envia uma string.
#[inline(never)]
pub fn emit_str(s: &str) {
    for &byte in s.as_bytes() {
        emit(byte);
    }
}

/// Envia CRLF.
#[inline(never)]
pub fn emit_nl() {
    emit(b'\r');
    emit(b'\n');
}

// =============================================================================
// ESCRITA - FORMATAÇÃO NUMÉRICA
// =============================================================================

/// Envia um u64 em hexadecimal, sem zeros à esquerda (`0x0` para zero).
#[inline(never)]
pub fn emit_hex(value: u64) {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

    emit(b'0');
    emit(b'x');

    let mut started = false;
    for shift in (0..16).rev() {
        let nibble = ((value >> (shift * 4)) & 0xF) as usize;
        if nibble != 0 || started || shift == 0 {
            started = true;
            emit(DIGITS[nibble]);
        }
    }
}
