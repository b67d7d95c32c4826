//! # Linhas de IRQ compartilhadas
//!
//! Uma linha de interrupção pode ter vários handlers (ex: dois controladores
//! AHCI no mesmo pino do IOAPIC). A `IrqTable` guarda, por linha, referências
//! fracas aos handlers e oferece cada interrupção a todos eles.
//!
//! ## Regras
//! - O primeiro handler de uma linha desmascara a linha no `IrqChip`.
//! - O último handler a sair mascara a linha de novo.
//! - As duas transições acontecem com o lock de escrita seguro, então um
//!   `register` e um `unregister` concorrentes na mesma linha não se cruzam.
//! - O lado de escrita só é tomado com interrupções desabilitadas na CPU
//!   local: uma IRQ nessa CPU não pode cair em `dispatch` enquanto o lock
//!   está seguro.
//! - `dispatch` nunca aloca: os handlers vivos são copiados para um buffer na
//!   pilha e chamados FORA do lock.
//!
//! A tabela guarda `Weak`, então ela não mantém o dono do handler vivo; quem
//! controla o tempo de vida é o `IrqRegistration` devolvido por `register`.

use crate::hal::InterruptGuard;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use spin::RwLock;

/// Linhas válidas (vetores 32..=255 após o remapeamento).
pub const MAX_IRQ_LINES: u8 = 224;

/// Handlers simultâneos por linha.
pub const MAX_SHARED_HANDLERS: usize = 8;

/// Algo que sabe atender uma interrupção.
pub trait IrqHandler: Send + Sync {
    /// Atende a interrupção. `true` se ela era deste handler.
    ///
    /// Roda em contexto de interrupção: não pode bloquear nem alocar.
    fn handle_irq(&self) -> bool;
}

/// Controlador de interrupções (PIC, IOAPIC...).
///
/// Chamado com o lock da `IrqTable` seguro e interrupções desabilitadas:
/// não pode chamar de volta na tabela.
pub trait IrqChip: Send + Sync {
    fn unmask(&self, irq: u8) -> Result<(), IrqError>;
    fn mask(&self, irq: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// Linha fora do intervalo suportado
    InvalidLine,
    /// O chip recusou habilitar a linha
    LineUnavailable,
    /// `MAX_SHARED_HANDLERS` já registrados na linha
    LineFull,
}

impl IrqError {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrqError::InvalidLine => "Linha de IRQ inválida",
            IrqError::LineUnavailable => "Linha de IRQ indisponível",
            IrqError::LineFull => "Linha de IRQ sem vagas",
        }
    }
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Entry {
    irq: u8,
    id: u32,
    handler: Weak<dyn IrqHandler>,
}

/// Tabela de despacho de linhas compartilhadas.
pub struct IrqTable {
    chip: Arc<dyn IrqChip>,
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU32,
}

impl IrqTable {
    pub fn new(chip: Arc<dyn IrqChip>) -> Arc<Self> {
        Arc::new(Self {
            chip,
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(1),
        })
    }

    /// Registra `handler` na linha `irq`.
    ///
    /// Não chamar de contexto de interrupção (pega o lock de escrita).
    pub fn register(
        self: &Arc<Self>,
        irq: u8,
        handler: Weak<dyn IrqHandler>,
    ) -> Result<IrqRegistration, IrqError> {
        if irq >= MAX_IRQ_LINES {
            crate::kerror!("(IRQ) Linha inválida: ", irq);
            return Err(IrqError::InvalidLine);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            // Ordem importa: o lock é solto antes de religar as interrupções
            let _irq_off = InterruptGuard::new();
            let mut entries = self.entries.write();

            let on_line = entries.iter().filter(|e| e.irq == irq).count();
            if on_line >= MAX_SHARED_HANDLERS {
                crate::kwarn!("(IRQ) Linha cheia: ", irq);
                return Err(IrqError::LineFull);
            }
            entries
                .try_reserve(1)
                .map_err(|_| IrqError::LineUnavailable)?;

            if on_line == 0 {
                if let Err(err) = self.chip.unmask(irq) {
                    crate::kerror!("(IRQ) Chip recusou desmascarar linha ", irq);
                    return Err(err);
                }
                crate::kdebug!("(IRQ) Linha desmascarada: ", irq);
            }
            entries.push(Entry { irq, id, handler });
        }

        crate::ktrace!("(IRQ) Handler registrado na linha ", irq);
        Ok(IrqRegistration {
            table: Arc::clone(self),
            irq,
            id,
        })
    }

    /// Oferece a interrupção da linha `irq` a todos os handlers vivos.
    ///
    /// Retorna `true` se algum deles a consumiu. Todos são chamados, mesmo
    /// depois do primeiro `true` (linha compartilhada, vários podem ter causa).
    pub fn dispatch(&self, irq: u8) -> bool {
        const NONE: Option<Arc<dyn IrqHandler>> = None;
        let mut live = [NONE; MAX_SHARED_HANDLERS];
        let mut count = 0;

        {
            let entries = self.entries.read();
            for entry in entries.iter().filter(|e| e.irq == irq) {
                if let Some(handler) = entry.handler.upgrade() {
                    live[count] = Some(handler);
                    count += 1;
                }
            }
        }

        let mut consumed = false;
        for handler in live[..count].iter().flatten() {
            consumed |= handler.handle_irq();
        }

        if !consumed {
            crate::ktrace!("(IRQ) Interrupção espúria na linha ", irq);
        }
        consumed
    }

    /// Existe algum handler registrado na linha?
    pub fn is_registered(&self, irq: u8) -> bool {
        self.entries.read().iter().any(|e| e.irq == irq)
    }

    /// Quantos handlers estão registrados na linha.
    pub fn handler_count(&self, irq: u8) -> usize {
        self.entries.read().iter().filter(|e| e.irq == irq).count()
    }

    fn unregister(&self, irq: u8, id: u32) {
        {
            let _irq_off = InterruptGuard::new();
            let mut entries = self.entries.write();
            entries.retain(|e| e.id != id);

            if !entries.iter().any(|e| e.irq == irq) {
                self.chip.mask(irq);
                crate::kdebug!("(IRQ) Linha mascarada: ", irq);
            }
        }
        crate::ktrace!("(IRQ) Handler removido da linha ", irq);
    }
}

/// Guarda de registro: ao ser destruída remove o handler da tabela.
pub struct IrqRegistration {
    table: Arc<IrqTable>,
    irq: u8,
    id: u32,
}

impl Drop for IrqRegistration {
    fn drop(&mut self) {
        self.table.unregister(self.irq, self.id);
    }
}
