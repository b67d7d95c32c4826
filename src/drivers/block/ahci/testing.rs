//! Dublês para os testes de host: IS write-1-to-clear simulado, controlador,
//! chip de IRQ e portas que registram o que aconteceu.

use super::bitfield::{InterruptStatus, MaskedBitField, PortMask};
use super::controller::HostController;
use super::error::AhciError;
use super::handler::{HandlerResources, PortHandler};
use super::port::{AhciPort, PortBinding, PortError, PortFactory};
use super::regs::{HbaCapabilities, HbaMemory, PortRegisters};
use super::{AhciResetMode, MAX_PORTS};
use crate::drivers::irq::{IrqChip, IrqError, IrqTable};
use crate::hal::Register32;
use crate::mm::{BitmapFrameAllocator, PhysAddr};
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ptr::{addr_of_mut, NonNull};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

/// IS com semântica de hardware: escrever 1 apaga o bit.
#[derive(Default)]
pub struct SimulatedStatusRegister {
    value: AtomicU32,
    writes: AtomicU32,
}

impl SimulatedStatusRegister {
    /// O "hardware" sinaliza interrupção nas portas de `ports`.
    pub fn raise(&self, ports: PortMask) {
        self.value.fetch_or(ports.bits(), Ordering::SeqCst);
    }

    pub fn value(&self) -> u32 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Register32 for SimulatedStatusRegister {
    fn read(&self) -> u32 {
        self.value.load(Ordering::SeqCst)
    }

    fn write(&self, value: u32) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.value.fetch_and(!value, Ordering::SeqCst);
    }
}

/// Controlador com IS simulado e blocos de porta em RAM.
pub struct MockController {
    status: Arc<InterruptStatus>,
    capabilities: HbaCapabilities,
    hba: NonNull<HbaMemory>,
}

unsafe impl Send for MockController {}
unsafe impl Sync for MockController {}

impl MockController {
    pub fn new(register: Arc<SimulatedStatusRegister>, capabilities: HbaCapabilities) -> Arc<Self> {
        let hba = NonNull::from(Box::leak(Box::new(HbaMemory::zeroed())));
        Arc::new(Self {
            status: InterruptStatus::new(register),
            capabilities,
            hba,
        })
    }

    pub fn claimed(&self) -> PortMask {
        self.status.claimed()
    }
}

impl Drop for MockController {
    fn drop(&mut self) {
        // SAFETY: veio de Box::leak em `new`
        unsafe { drop(Box::from_raw(self.hba.as_ptr())) };
    }
}

impl HostController for MockController {
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
        unsafe {
            let block = addr_of_mut!((*self.hba.as_ptr()).ports[index as usize]);
            PortRegisters::new(NonNull::new_unchecked(block), index)
        }
    }
}

#[derive(Default)]
pub struct MockIrqChip {
    unmasked: AtomicU64,
    refuse: AtomicBool,
}

impl MockIrqChip {
    pub fn is_unmasked(&self, irq: u8) -> bool {
        self.unmasked.load(Ordering::SeqCst) & (1 << irq) != 0
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl IrqChip for MockIrqChip {
    fn unmask(&self, irq: u8) -> Result<(), IrqError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(IrqError::LineUnavailable);
        }
        self.unmasked.fetch_or(1 << irq, Ordering::SeqCst);
        Ok(())
    }

    fn mask(&self, irq: u8) {
        self.unmasked.fetch_and(!(1 << irq), Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Reset(u8),
    InitWithoutReset(u8),
    Interrupt(u8),
}

type EventLog = Arc<Mutex<Vec<PortEvent>>>;

/// Porta que só anota as chamadas no log compartilhado.
pub struct RecordingPort {
    index: u8,
    log: EventLog,
    fail_bring_up: bool,
    raise_on_interrupt: Option<(PortMask, Arc<SimulatedStatusRegister>)>,
}

impl RecordingPort {
    fn bring_up(&self, event: PortEvent) -> Result<(), PortError> {
        self.log.lock().push(event);
        if self.fail_bring_up {
            Err(PortError::LinkDown)
        } else {
            Ok(())
        }
    }
}

impl AhciPort for RecordingPort {
    fn index(&self) -> u8 {
        self.index
    }

    fn reset(&self) -> Result<(), PortError> {
        self.bring_up(PortEvent::Reset(self.index))
    }

    fn initialize_without_reset(&self) -> Result<(), PortError> {
        self.bring_up(PortEvent::InitWithoutReset(self.index))
    }

    fn handle_interrupt(&self) {
        self.log.lock().push(PortEvent::Interrupt(self.index));
        if let Some((ports, register)) = &self.raise_on_interrupt {
            register.raise(*ports);
        }
    }
}

pub struct RecordingFactory {
    log: EventLog,
    status: Arc<SimulatedStatusRegister>,
    fail_create: AtomicU32,
    fail_bring_up: AtomicU32,
    raise_on_interrupt: Mutex<Option<(u8, PortMask)>>,
    bindings: Mutex<Vec<PortBinding>>,
}

impl RecordingFactory {
    pub fn new(status: Arc<SimulatedStatusRegister>) -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
            status,
            fail_create: AtomicU32::new(0),
            fail_bring_up: AtomicU32::new(0),
            raise_on_interrupt: Mutex::new(None),
            bindings: Mutex::new(Vec::new()),
        })
    }

    /// `create_port` falha (NoDevice) para estas portas.
    pub fn fail_create(&self, ports: PortMask) {
        self.fail_create.store(ports.bits(), Ordering::SeqCst);
    }

    /// reset/initialize_without_reset falham (LinkDown) para estas portas.
    pub fn fail_bring_up(&self, ports: PortMask) {
        self.fail_bring_up.store(ports.bits(), Ordering::SeqCst);
    }

    /// Ao atender `port`, o IS volta a sinalizar `raised`.
    pub fn raise_on_interrupt(&self, port: u8, raised: PortMask) {
        *self.raise_on_interrupt.lock() = Some((port, raised));
    }

    pub fn events(&self) -> Vec<PortEvent> {
        self.log.lock().clone()
    }

    pub fn clear_events(&self) {
        self.log.lock().clear();
    }

    pub fn bindings(&self) -> Vec<PortBinding> {
        self.bindings.lock().clone()
    }
}

impl PortFactory for RecordingFactory {
    fn create_port(&self, binding: PortBinding) -> Result<Arc<dyn AhciPort>, PortError> {
        let index = binding.index;
        if PortMask::new(self.fail_create.load(Ordering::SeqCst)).contains(index) {
            return Err(PortError::NoDevice);
        }

        let raise_on_interrupt = match *self.raise_on_interrupt.lock() {
            Some((port, raised)) if port == index => Some((raised, Arc::clone(&self.status))),
            _ => None,
        };
        self.bindings.lock().push(binding);

        Ok(Arc::new(RecordingPort {
            index,
            log: Arc::clone(&self.log),
            fail_bring_up: PortMask::new(self.fail_bring_up.load(Ordering::SeqCst))
                .contains(index),
            raise_on_interrupt,
        }))
    }
}

/// Tudo que um handler precisa, montado sobre os dublês.
pub struct Fixture {
    pub status: Arc<SimulatedStatusRegister>,
    pub controller: Arc<MockController>,
    pub chip: Arc<MockIrqChip>,
    pub irqs: Arc<IrqTable>,
    pub frames: Arc<Mutex<BitmapFrameAllocator>>,
    pub factory: Arc<RecordingFactory>,
    total_frames: usize,
}

/// Região física falsa: só endereços, nada é tocado.
const REGION_BASE: PhysAddr = PhysAddr::new(0x0010_0000);

impl Fixture {
    pub fn new() -> Self {
        Self::with_frames(16)
    }

    pub fn with_frames(total_frames: usize) -> Self {
        let status = Arc::new(SimulatedStatusRegister::default());
        // NP=31, NCS=31, S64A
        let capabilities = HbaCapabilities::from_bits_retain((1 << 31) | (31 << 8) | 31);
        let chip = Arc::new(MockIrqChip::default());
        let frames = BitmapFrameAllocator::new(REGION_BASE, total_frames)
            .expect("fake frame region");

        Self {
            controller: MockController::new(status.clone(), capabilities),
            irqs: IrqTable::new(chip.clone()),
            chip,
            frames: Arc::new(Mutex::new(frames)),
            factory: RecordingFactory::new(status.clone()),
            status,
            total_frames,
        }
    }

    pub fn resources(&self, policy: AhciResetMode) -> HandlerResources {
        HandlerResources {
            frames: self.frames.clone(),
            irqs: self.irqs.clone(),
            ports: self.factory.clone(),
            policy,
        }
    }

    pub fn create(
        &self,
        irq: u8,
        ports: PortMask,
        policy: AhciResetMode,
    ) -> Result<Arc<PortHandler>, AhciError> {
        PortHandler::create(self.controller.clone(), irq, ports, &self.resources(policy))
    }

    pub fn free_frames(&self) -> usize {
        self.frames.lock().free_frames()
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }
}
