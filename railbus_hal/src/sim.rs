/*
*   # Simulated backplane
*   Emulates the latch/decoder hardware sitting behind the
*   address/data/control lines, so the controller can run
*   without a Raspberry Pi:
*
*   * While ENABLE and READ are asserted, the data lines
*     present the byte stored at the latched address.
*   * When ENABLE is released after ENABLE and WRITE were
*     asserted, the byte on the data lines is stored at the
*     latched address.
*
*   Every completed cycle is recorded together with the time
*   of the first line change after the previous cycle and the
*   time ENABLE was released.
*   Protocol violations (address changes while strobed, driving
*   the data lines during a read) are counted as faults.
*/

use crate::gpio::{BusWiring, DigitalPins, Level, PinMode};
use std::{collections::{HashMap, VecDeque}, sync::{Arc, Mutex, MutexGuard}, time::Instant};

/// Only the most recent cycles are kept.
pub const CYCLE_HISTORY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind
{
    Read,
    Write
}

#[derive(Debug, Clone, Copy)]
pub struct BusCycle
{
    pub kind: CycleKind,
    pub address: u8,
    pub data: u8,
    pub started: Instant,
    pub finished: Instant
}

#[derive(Clone, Copy, PartialEq)]
enum Strobe
{
    Idle,
    Read,
    Write
}

struct Backplane
{
    wiring: BusWiring,
    modes: HashMap<u8, PinMode>,
    driven: HashMap<u8, Level>,
    external: HashMap<u8, Level>,
    memory: [u8; 256],
    strobe: Strobe,
    latched_address: u8,
    latched_data: u8,
    cycle_start: Option<Instant>,
    cycles: VecDeque<BusCycle>,
    faults: u32
}

impl Backplane
{
    fn asserted(&self, pin: u8) -> bool
    {
        let level = self.driven.get(&pin).copied().unwrap_or(self.wiring.drive_polarity.level(false));
        self.wiring.drive_polarity.is_asserted(level)
    }

    fn decode(&self, pins: &[u8; 8]) -> u8
    {
        pins.iter()
            .enumerate()
            .filter(|(_, p)| self.asserted(**p))
            .fold(0u8, |acc, (bit, _)| acc | (1 << bit))
    }

    fn data_driven(&self) -> bool
    {
        self.wiring.data.iter().any(|p| self.modes.get(p) == Some(&PinMode::Output))
    }

    fn on_level_change(&mut self, pin: u8)
    {
        if self.wiring.address.contains(&pin)
        {
            if self.strobe != Strobe::Idle
            {
                self.faults += 1;
            }
        }

        if self.cycle_start.is_none()
        {
            self.cycle_start = Some(Instant::now());
        }

        let enable = self.asserted(self.wiring.enable);
        let read = self.asserted(self.wiring.read);
        let write = self.asserted(self.wiring.write);

        match self.strobe
        {
            Strobe::Idle if enable && read && write => self.faults += 1,
            Strobe::Idle if enable && read =>
            {
                if self.data_driven()
                {
                    self.faults += 1;
                }
                self.latched_address = self.decode(&self.wiring.address);
                self.strobe = Strobe::Read;
            },
            Strobe::Idle if enable && write =>
            {
                self.latched_address = self.decode(&self.wiring.address);
                self.latched_data = self.decode(&self.wiring.data);
                self.strobe = Strobe::Write;
            },
            Strobe::Read | Strobe::Write if !enable => self.finish_cycle(),
            _ => {}
        }
    }

    fn finish_cycle(&mut self)
    {
        let now = Instant::now();
        let (kind, data) = match self.strobe
        {
            Strobe::Write =>
            {
                self.memory[self.latched_address as usize] = self.latched_data;
                (CycleKind::Write, self.latched_data)
            },
            _ => (CycleKind::Read, self.memory[self.latched_address as usize])
        };

        if self.cycles.len() == CYCLE_HISTORY
        {
            self.cycles.pop_front();
        }
        self.cycles.push_back(BusCycle {
            kind,
            address: self.latched_address,
            data,
            started: self.cycle_start.take().unwrap_or(now),
            finished: now
        });
        self.strobe = Strobe::Idle;
    }

    fn sample(&self, pin: u8) -> Level
    {
        if let Some(level) = self.external.get(&pin)
        {
            return *level;
        }

        if let Some(bit) = self.wiring.data.iter().position(|p| *p == pin)
        {
            if self.strobe == Strobe::Read && self.modes.get(&pin) != Some(&PinMode::Output)
            {
                let value = self.memory[self.latched_address as usize] & (1 << bit) != 0;
                return self.wiring.sense_polarity.level(value);
            }
        }

        self.driven.get(&pin).copied().unwrap_or(Level::Low)
    }
}

/// Cloneable handle to the simulated backplane. All
/// clones share the same hardware state, so a test can
/// keep one while the controller owns another.
#[derive(Clone)]
pub struct SimulatedBus
{
    inner: Arc<Mutex<Backplane>>
}

impl SimulatedBus
{
    pub fn new(wiring: BusWiring) -> Self
    {
        SimulatedBus
        {
            inner: Arc::new(Mutex::new(Backplane {
                wiring,
                modes: HashMap::new(),
                driven: HashMap::new(),
                external: HashMap::new(),
                memory: [0; 256],
                strobe: Strobe::Idle,
                latched_address: 0,
                latched_data: 0,
                cycle_start: None,
                cycles: VecDeque::new(),
                faults: 0
            }))
        }
    }

    fn lock(&self) -> MutexGuard<'_, Backplane>
    {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_byte(&self, address: u8, value: u8)
    {
        self.lock().memory[address as usize] = value;
    }

    pub fn byte(&self, address: u8) -> u8
    {
        self.lock().memory[address as usize]
    }

    /// Forces the level seen when `pin` is read, e.g.
    /// for the legacy diagnostic input.
    pub fn set_external_level(&self, pin: u8, level: Level)
    {
        self.lock().external.insert(pin, level);
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode>
    {
        self.lock().modes.get(&pin).copied()
    }

    pub fn driven_level(&self, pin: u8) -> Option<Level>
    {
        self.lock().driven.get(&pin).copied()
    }

    pub fn cycles(&self) -> Vec<BusCycle>
    {
        self.lock().cycles.iter().cloned().collect()
    }

    pub fn clear_cycles(&self)
    {
        self.lock().cycles.clear();
    }

    pub fn faults(&self) -> u32
    {
        self.lock().faults
    }
}

impl DigitalPins for SimulatedBus
{
    fn set_mode(&mut self, pin: u8, mode: PinMode)
    {
        let mut bp = self.lock();
        bp.modes.insert(pin, mode);
        if mode == PinMode::Output && bp.strobe == Strobe::Read && bp.wiring.data.contains(&pin)
        {
            bp.faults += 1;
        }
    }

    fn write(&mut self, pin: u8, level: Level)
    {
        let mut bp = self.lock();
        if bp.driven.insert(pin, level) != Some(level)
        {
            bp.on_level_change(pin);
        }
    }

    fn read(&mut self, pin: u8) -> Level
    {
        self.lock().sample(pin)
    }
}
