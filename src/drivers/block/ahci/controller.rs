//! # Controlador AHCI (HBA)
//!
//! `HostController` é o que o `PortHandler` precisa do controlador:
//! capacidades, visões mascaradas do IS e o bloco de registradores de cada
//! porta. `AhciController` implementa isso sobre o ABAR mapeado.
//!
//! ## Sequência de inicialização típica
//! 1. `AhciController::new(abar)`
//! 2. `reset()` (opcional) ou `enable_ahci_mode()`
//! 3. `attach_port_handlers(&[irq], &resources)`

use super::bitfield::{InterruptStatus, MaskedBitField, PortMask};
use super::error::AhciError;
use super::handler::{HandlerResources, PortHandler};
use super::regs::{GlobalHostControl, HbaCapabilities, HbaMemory, PortRegisters};
use super::MAX_PORTS;
use crate::hal::{MmioRegister, Register32};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ptr::{addr_of_mut, NonNull};

/// Iterações máximas esperando GHC.HR voltar a zero.
pub const HBA_RESET_POLL_LIMIT: u32 = 1_000_000;

/// Interface do controlador consumida pelo handler.
pub trait HostController: Send + Sync {
    /// Capacidades do HBA (registrador CAP).
    fn capabilities(&self) -> HbaCapabilities;

    /// Visão do IS restrita a `mask`. Falha se algum bit já tiver dono.
    fn claim_interrupt_status(&self, mask: PortMask) -> Result<MaskedBitField, AhciError>;

    /// Bloco de registradores da porta `index`.
    ///
    /// # Panics
    /// Se `index >= MAX_PORTS`.
    fn port_registers(&self, index: u8) -> PortRegisters;
}

/// HBA AHCI mapeado em memória.
pub struct AhciController {
    hba: NonNull<HbaMemory>,
    capabilities: HbaCapabilities,
    status: Arc<InterruptStatus>,
}

// SAFETY: só acessamos o HBA por MmioRegister (volatile); posse de bits do IS
// é controlada por InterruptStatus.
unsafe impl Send for AhciController {}
unsafe impl Sync for AhciController {}

macro_rules! host_register {
    ($($name:ident),* $(,)?) => {
        $(
            #[inline]
            fn $name(&self) -> MmioRegister {
                // SAFETY: contrato de `AhciController::new`
                unsafe {
                    let field = addr_of_mut!((*self.hba.as_ptr()).control.$name);
                    MmioRegister::new(NonNull::new_unchecked(field))
                }
            }
        )*
    };
}

impl AhciController {
    /// # Safety
    ///
    /// `hba` deve apontar para o ABAR mapeado (não cacheável) de um HBA, válido
    /// enquanto o controlador e qualquer handler criado por ele existirem.
    pub unsafe fn new(hba: NonNull<HbaMemory>) -> Arc<Self> {
        let is = MmioRegister::new(NonNull::new_unchecked(addr_of_mut!(
            (*hba.as_ptr()).control.is
        )));
        let mut controller = Self {
            hba,
            capabilities: HbaCapabilities::empty(),
            status: InterruptStatus::new(Arc::new(is)),
        };
        controller.capabilities = HbaCapabilities::from_bits_retain(controller.cap().read());

        crate::kinfo!("(AHCI) HBA em ", hba.as_ptr() as usize);
        crate::kdebug!("(AHCI) CAP=", controller.capabilities.bits());
        crate::kdebug!("(AHCI) Versão=", controller.version());
        Arc::new(controller)
    }

    host_register!(cap, ghc, pi, vs);

    /// Reset global do HBA (GHC.HR).
    ///
    /// Espera no máximo `HBA_RESET_POLL_LIMIT` leituras pelo fim do reset e
    /// religa o modo AHCI, que o reset desliga.
    pub fn reset(&self) -> Result<(), AhciError> {
        crate::kinfo!("(AHCI) Reset do HBA...");
        let ghc = self.ghc();
        ghc.set_bits(GlobalHostControl::AE.bits());
        ghc.set_bits(GlobalHostControl::HR.bits());

        let mut budget = HBA_RESET_POLL_LIMIT;
        while ghc.read() & GlobalHostControl::HR.bits() != 0 {
            if budget == 0 {
                crate::kfail!("(AHCI) HBA não saiu do reset");
                return Err(AhciError::HbaResetTimeout);
            }
            budget -= 1;
            core::hint::spin_loop();
        }

        self.enable_ahci_mode();
        crate::kok!("(AHCI) HBA resetado");
        Ok(())
    }

    /// Liga GHC.AE.
    pub fn enable_ahci_mode(&self) {
        self.ghc().set_bits(GlobalHostControl::AE.bits());
    }

    /// Portas implementadas (PI).
    pub fn implemented_ports(&self) -> PortMask {
        PortMask::new(self.pi().read())
    }

    /// Versão AHCI (VS): major nos 16 bits altos, minor nos baixos.
    pub fn version(&self) -> u32 {
        self.vs().read()
    }

    pub fn enable_interrupts(&self) {
        self.ghc().set_bits(GlobalHostControl::IE.bits());
        crate::kdebug!("(AHCI) GHC.IE ligado");
    }

    pub fn disable_interrupts(&self) {
        self.ghc().clear_bits(GlobalHostControl::IE.bits());
        crate::kdebug!("(AHCI) GHC.IE desligado");
    }

    /// Bits do IS atualmente entregues a handlers.
    pub fn claimed_ports(&self) -> PortMask {
        self.status.claimed()
    }

    /// Divide PI entre as linhas e cria um handler por subconjunto não vazio.
    ///
    /// Se qualquer handler falhar, os já criados são destruídos e o erro volta.
    /// GHC.IE só é ligado depois que todos estão prontos.
    pub fn attach_port_handlers(
        self: &Arc<Self>,
        irqs: &[u8],
        resources: &HandlerResources,
    ) -> Result<Vec<Arc<PortHandler>>, AhciError> {
        if irqs.is_empty() {
            crate::kerror!("(AHCI) Nenhuma linha de IRQ fornecida");
            return Err(AhciError::NoInterruptLines);
        }

        let implemented = self.implemented_ports();
        if implemented.is_empty() {
            crate::kwarn!("(AHCI) PI=0, nenhuma porta implementada");
            return Err(AhciError::NoImplementedPorts);
        }
        crate::kinfo!("(AHCI) Portas implementadas=", implemented.bits());

        let subsets = distribute_ports(implemented, irqs.len());
        let mut handlers = Vec::new();
        handlers
            .try_reserve_exact(irqs.len())
            .map_err(|_| AhciError::OutOfMemory)?;

        for (&irq, &mask) in irqs.iter().zip(subsets.iter()) {
            if mask.is_empty() {
                continue;
            }
            let controller: Arc<dyn HostController> = self.clone();
            handlers.push(PortHandler::create(controller, irq, mask, resources)?);
        }

        self.enable_interrupts();
        Ok(handlers)
    }
}

impl HostController for AhciController {
    fn capabilities(&self) -> HbaCapabilities {
        self.capabilities
    }

    fn claim_interrupt_status(&self, mask: PortMask) -> Result<MaskedBitField, AhciError> {
        self.status.claim(mask)
    }

    fn port_registers(&self, index: u8) -> PortRegisters {
        if index as usize >= MAX_PORTS {
            crate::kerror!("(AHCI) Índice de porta fora do HBA: ", index);
            panic!("port_registers: AHCI port index out of range");
        }
        // SAFETY: índice validado; o bloco vive tanto quanto o HBA
        unsafe {
            let block = addr_of_mut!((*self.hba.as_ptr()).ports[index as usize]);
            PortRegisters::new(NonNull::new_unchecked(block), index)
        }
    }
}

/// Reparte `ports` entre `lines` linhas em rodízio, por ordem de índice.
///
/// As máscaras devolvidas são disjuntas e sua união é `ports`. Linhas em
/// excesso recebem máscaras vazias.
pub fn distribute_ports(ports: PortMask, lines: usize) -> Vec<PortMask> {
    let mut subsets = alloc::vec![0u32; lines];
    if lines == 0 {
        return Vec::new();
    }
    for (n, index) in ports.indices().enumerate() {
        subsets[n % lines] |= 1 << index;
    }
    subsets.into_iter().map(PortMask::new).collect()
}
