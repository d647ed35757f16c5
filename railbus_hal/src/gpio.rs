use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level
{
    Low,
    High
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode
{
    Input,
    Output
}

/// # Polarity
/// Describes which physical level counts as
/// a logical "1" (asserted) on a group of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity
{
    ActiveHigh,
    ActiveLow
}

impl Polarity
{
    pub fn level(self, asserted: bool) -> Level
    {
        match (self, asserted)
        {
            (Polarity::ActiveHigh, true) | (Polarity::ActiveLow, false) => Level::High,
            _ => Level::Low
        }
    }

    pub fn is_asserted(self, level: Level) -> bool
    {
        return self.level(true) == level;
    }
}

/// The physical transport for the bus. Implementations
/// talk to the actual GPIO block (or a simulation of it).
/// Pin numbers are whatever the platform uses, the
/// reference target uses BCM numbering.
pub trait DigitalPins
{
    fn set_mode(&mut self, pin: u8, mode: PinMode);
    fn write(&mut self, pin: u8, level: Level);
    fn read(&mut self, pin: u8) -> Level;
}

impl<T: DigitalPins + ?Sized> DigitalPins for Box<T>
{
    fn set_mode(&mut self, pin: u8, mode: PinMode)
    {
        (**self).set_mode(pin, mode)
    }

    fn write(&mut self, pin: u8, level: Level)
    {
        (**self).write(pin, level)
    }

    fn read(&mut self, pin: u8) -> Level
    {
        (**self).read(pin)
    }
}

/// # BusWiring
/// Assignment of the bus lines to physical pins.
/// * address: A0..A7, A0 carries the least significant bit
/// * data: D0..D7, D0 carries the least significant bit
/// * enable/read/write: the control lines
/// * legacy_input: optional single diagnostic input
/// * drive_polarity: applies to everything we drive (address,
///   outgoing data, control)
/// * sense_polarity: applies to sampled data lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusWiring
{
    pub address: [u8; 8],
    pub data: [u8; 8],
    pub enable: u8,
    pub read: u8,
    pub write: u8,
    pub legacy_input: Option<u8>,
    pub drive_polarity: Polarity,
    pub sense_polarity: Polarity
}

impl Default for BusWiring
{
    fn default() -> Self
    {
        BusWiring
        {
            address: [17, 18, 23, 24, 25, 8, 7, 12],
            data: [16, 20, 21, 5, 6, 13, 19, 26],
            enable: 2,
            read: 3,
            write: 4,
            legacy_input: Some(2),
            drive_polarity: Polarity::ActiveLow,
            sense_polarity: Polarity::ActiveHigh
        }
    }
}

impl BusWiring
{
    pub fn control_pins(&self) -> [u8; 3]
    {
        [self.enable, self.read, self.write]
    }

    /// All pins the bus itself occupies, the legacy
    /// input is not part of this list.
    pub fn bus_pins(&self) -> Vec<u8>
    {
        let mut pins = Vec::with_capacity(19);
        pins.extend_from_slice(&self.address);
        pins.extend_from_slice(&self.data);
        pins.extend_from_slice(&self.control_pins());
        pins
    }
}
