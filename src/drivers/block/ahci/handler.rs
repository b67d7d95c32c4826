//! # PortHandler
//!
//! Dono de UMA linha de IRQ e do subconjunto de portas atrás dela.
//!
//! ## Invariantes
//! - `ports[i]` existe se e somente se o bit `i` de `owned_ports` está ligado.
//!   A tabela é preenchida uma vez, dentro de `create`, e só lida depois.
//! - `pending_interrupts` só enxerga os bits de `owned_ports`; nenhum outro
//!   handler do mesmo controlador possui esses bits.
//! - O scratch de IDENTIFY cobre os 32 índices, independente da máscara.
//!
//! ## Ciclo de vida
//! `create` é a única forma de obter um handler, e ele só retorna um handler
//! completamente inicializado. Qualquer falha antes do bring-up das portas
//! desfaz tudo (frames, registro da linha, bits de IS) via `Drop` dos campos.
//! Falhas de bring-up de UMA porta ficam em `failed_ports` e não abortam.

use super::bitfield::{MaskedBitField, PortMask};
use super::controller::HostController;
use super::error::AhciError;
use super::port::{AhciPort, PortBinding, PortFactory};
use super::regs::HbaCapabilities;
use super::scratch::IdentifyScratch;
use super::{AhciResetMode, MAX_PORTS};
use crate::core::boot::{cmdline, CommandLine};
use crate::drivers::irq::{IrqHandler, IrqRegistration, IrqTable};
use crate::mm::{FrameAllocator, PhysAddr};
use alloc::sync::{Arc, Weak};
use core::sync::atomic::{AtomicU32, Ordering};

/// Dependências externas de um handler.
#[derive(Clone)]
pub struct HandlerResources {
    /// Fonte das páginas de scratch
    pub frames: Arc<dyn FrameAllocator>,
    /// Tabela de linhas de IRQ
    pub irqs: Arc<IrqTable>,
    /// Construtor das portas
    pub ports: Arc<dyn PortFactory>,
    /// Política de bring-up (lida uma vez, na criação)
    pub policy: AhciResetMode,
}

impl HandlerResources {
    /// Recursos com a política vinda da linha de comando do kernel
    /// (`ahci_reset_mode=`). Ausente ou inválida => `Conservative`.
    pub fn from_boot(
        frames: Arc<dyn FrameAllocator>,
        irqs: Arc<IrqTable>,
        ports: Arc<dyn PortFactory>,
    ) -> Self {
        Self::with_cmdline(frames, irqs, ports, cmdline::get())
    }

    pub fn with_cmdline(
        frames: Arc<dyn FrameAllocator>,
        irqs: Arc<IrqTable>,
        ports: Arc<dyn PortFactory>,
        cmdline: &CommandLine,
    ) -> Self {
        let policy = cmdline.ahci_reset_mode();
        crate::kdebug!("(AHCI) Política lida da linha de comando:");
        crate::kdebug!(policy.as_str());
        Self {
            frames,
            irqs,
            ports,
            policy,
        }
    }
}

type PortTable = [Option<Arc<dyn AhciPort>>; MAX_PORTS];

pub struct PortHandler {
    // Primeiro a ser destruído: a linha deixa de apontar para o handler antes
    // das portas e do scratch sumirem.
    registration: Option<IrqRegistration>,
    irq: u8,
    owned_ports: PortMask,
    controller: Arc<dyn HostController>,
    ports: PortTable,
    pending_interrupts: MaskedBitField,
    scratch: IdentifyScratch,
    failed_ports: AtomicU32,
    policy: AhciResetMode,
}

impl PortHandler {
    /// Constrói e inicializa o handler da linha `irq` para `owned_ports`.
    pub fn create(
        controller: Arc<dyn HostController>,
        irq: u8,
        owned_ports: PortMask,
        resources: &HandlerResources,
    ) -> Result<Arc<Self>, AhciError> {
        crate::kinfo!("(AHCI) Criando handler, IRQ=", irq);
        crate::kdebug!("(AHCI) Máscara de portas=", owned_ports.bits());

        let pending_interrupts = controller.claim_interrupt_status(owned_ports)?;

        let scratch = IdentifyScratch::allocate(Arc::clone(&resources.frames)).map_err(|err| {
            crate::kerror!("(AHCI) Falha ao alocar scratch IDENTIFY");
            crate::kerror!(err.as_str());
            AhciError::from(err)
        })?;

        // Interrupções velhas (firmware, boot anterior) das NOSSAS portas
        pending_interrupts.set_all();

        let mut failure = None;
        let handler = Arc::new_cyclic(|this: &Weak<Self>| {
            const NONE: Option<Arc<dyn AhciPort>> = None;
            let mut ports: PortTable = [NONE; MAX_PORTS];

            let as_irq: Weak<dyn IrqHandler> = this.clone();
            let registration = match resources.irqs.register(irq, as_irq) {
                Ok(registration) => Some(registration),
                Err(err) => {
                    failure = Some(AhciError::from(err));
                    None
                }
            };

            if registration.is_some() {
                if let Err(err) = Self::create_ports(
                    this,
                    owned_ports,
                    controller.as_ref(),
                    resources.ports.as_ref(),
                    &mut ports,
                ) {
                    failure = Some(err);
                }
            }

            Self {
                registration,
                irq,
                owned_ports,
                controller,
                ports,
                pending_interrupts,
                scratch,
                failed_ports: AtomicU32::new(0),
                policy: resources.policy,
            }
        });

        if let Some(err) = failure {
            crate::kfail!("(AHCI) Inicialização do handler abortada");
            crate::kerror!(err.as_str());
            // Drop devolve frames, remove a linha e libera os bits de IS
            drop(handler);
            return Err(err);
        }

        handler.bring_up();
        crate::kok!("(AHCI) Handler pronto");
        Ok(handler)
    }

    fn create_ports(
        this: &Weak<Self>,
        owned_ports: PortMask,
        controller: &dyn HostController,
        factory: &dyn PortFactory,
        ports: &mut PortTable,
    ) -> Result<(), AhciError> {
        for index in owned_ports.indices() {
            let binding = PortBinding {
                handler: this.clone(),
                registers: controller.port_registers(index),
                index,
            };
            let port = factory.create_port(binding).map_err(|error| {
                crate::kerror!("(AHCI) Falha ao criar porta ", index);
                AhciError::PortCreation { index, error }
            })?;
            ports[index as usize] = Some(port);
            crate::ktrace!("(AHCI) Porta criada: ", index);
        }
        Ok(())
    }

    /// Aplica a política a TODAS as portas possuídas.
    fn bring_up(&self) {
        crate::kinfo!("(AHCI) Política de bring-up:");
        crate::kinfo!(self.policy.as_str());

        self.for_each_port(|index, port| {
            let result = match self.policy {
                AhciResetMode::Aggressive => port.reset(),
                AhciResetMode::Conservative => port.initialize_without_reset(),
            };
            if let Err(err) = result {
                crate::kwarn!("(AHCI) Bring-up falhou na porta ", index);
                crate::kwarn!(err.as_str());
                self.failed_ports.fetch_or(1 << index, Ordering::Relaxed);
            }
        });

        let failed = self.failed_ports();
        if !failed.is_empty() {
            crate::kwarn!("(AHCI) Portas com falha=", failed.bits());
        }
    }

    /// Porta de índice `index`.
    ///
    /// # Panics
    /// Se `index` não pertence a este handler.
    pub fn port_at(&self, index: u8) -> &Arc<dyn AhciPort> {
        match self.ports.get(index as usize).and_then(Option::as_ref) {
            Some(port) if self.owned_ports.contains(index) => port,
            _ => {
                crate::kerror!("(AHCI) port_at em porta não possuída: ", index);
                panic!("PortHandler::port_at: port not owned by this handler");
            }
        }
    }

    /// Visita as portas em ordem crescente de índice.
    pub fn for_each_port(&self, mut visit: impl FnMut(u8, &Arc<dyn AhciPort>)) {
        for index in self.owned_ports.indices() {
            if let Some(port) = &self.ports[index as usize] {
                visit(index, port);
            }
        }
    }

    /// Endereço físico do buffer de IDENTIFY da porta `index` (0..32).
    pub fn identify_scratch_address(&self, index: u8) -> PhysAddr {
        self.scratch.address_of(index)
    }

    pub fn capabilities(&self) -> HbaCapabilities {
        self.controller.capabilities()
    }

    pub fn irq(&self) -> u8 {
        self.irq
    }

    pub fn owned_ports(&self) -> PortMask {
        self.owned_ports
    }

    /// Portas cujo bring-up falhou.
    pub fn failed_ports(&self) -> PortMask {
        PortMask::new(self.failed_ports.load(Ordering::Relaxed))
    }

    /// Portas possuídas com bring-up bem-sucedido.
    pub fn usable_ports(&self) -> PortMask {
        PortMask::new(self.owned_ports.bits() & !self.failed_ports().bits())
    }

    pub fn policy(&self) -> AhciResetMode {
        self.policy
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }
}

impl IrqHandler for PortHandler {
    fn handle_irq(&self) -> bool {
        if self.pending_interrupts.is_zero() {
            return false;
        }

        for index in self.pending_interrupts.to_indices() {
            let Some(port) = &self.ports[index as usize] else {
                crate::kerror!("(AHCI) IRQ para porta ausente: ", index);
                panic!("PortHandler::handle_irq: pending bit without port");
            };
            crate::ktrace!("(AHCI) IRQ porta ", index);
            port.handle_interrupt();
            self.pending_interrupts.set_at(index);
        }
        true
    }
}

impl Drop for PortHandler {
    fn drop(&mut self) {
        crate::kdebug!("(AHCI) Handler destruído, IRQ=", self.irq);
    }
}
