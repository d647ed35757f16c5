use railbus_hal::gpio::{BusWiring, DigitalPins, Level, PinMode};
use std::{thread, time::Duration};
use crate::{bus::Region, codec::{explode, Bits}, error::BusError};

/// # BusDriver
/// Sequences one bus transaction at a time on the pins.
///
/// Read:  address -> READ, ENABLE -> hold -> sample data -> release ENABLE, READ
/// Write: address -> data out -> WRITE, ENABLE -> hold -> release ENABLE, WRITE -> data in
///
/// The driver itself knows nothing about concurrency, see
/// `SharedBus` for that. It does check that reads only hit
/// the input region and writes only hit the output region.
pub struct BusDriver<P: DigitalPins>
{
    pins: P,
    wiring: BusWiring,
    strobe_hold: Duration
}

impl<P: DigitalPins> BusDriver<P>
{
    pub fn new(pins: P, wiring: BusWiring, strobe_hold: Duration) -> Self
    {
        BusDriver { pins, wiring, strobe_hold }
    }

    /// Puts the bus in its idle state: address and control
    /// lines driven with all control lines released, data
    /// lines floating.
    pub fn init(&mut self)
    {
        for pin in self.wiring.control_pins().iter()
        {
            self.pins.set_mode(*pin, PinMode::Output);
            self.pins.write(*pin, self.wiring.drive_polarity.level(false));
        }
        for pin in self.wiring.address.iter()
        {
            self.pins.set_mode(*pin, PinMode::Output);
        }
        self.drive_group(self.wiring.address, 0);
        self.release_data();
        if let Some(pin) = self.wiring.legacy_input
        {
            if !self.wiring.bus_pins().contains(&pin)
            {
                self.pins.set_mode(pin, PinMode::Input);
            }
        }
    }

    fn drive_group(&mut self, group: [u8; 8], value: u8)
    {
        let polarity = self.wiring.drive_polarity;
        for (pin, bit) in group.iter().zip(explode(value).iter())
        {
            self.pins.write(*pin, polarity.level(*bit));
        }
    }

    fn set_line(&mut self, pin: u8, asserted: bool)
    {
        let level = self.wiring.drive_polarity.level(asserted);
        self.pins.write(pin, level);
    }

    fn release_data(&mut self)
    {
        for pin in self.wiring.data.iter()
        {
            self.pins.set_mode(*pin, PinMode::Input);
        }
    }

    fn sample_data(&mut self) -> Bits
    {
        let mut bits = [false; 8];
        let polarity = self.wiring.sense_polarity;
        for (bit, pin) in bits.iter_mut().zip(self.wiring.data.iter())
        {
            *bit = polarity.is_asserted(self.pins.read(*pin));
        }
        bits
    }

    fn hold(&self)
    {
        if self.strobe_hold > Duration::from_micros(0)
        {
            thread::sleep(self.strobe_hold);
        }
    }

    fn check(address: u8, region: Region) -> Result<(), BusError>
    {
        if !region.contains(address)
        {
            return Err(BusError::InvalidAddress { address, region });
        }
        Ok(())
    }

    pub fn read_transaction(&mut self, address: u8) -> Result<Bits, BusError>
    {
        Self::check(address, Region::Input)?;

        self.drive_group(self.wiring.address, address);
        self.set_line(self.wiring.read, true);
        self.set_line(self.wiring.enable, true);
        self.hold();
        let bits = self.sample_data();
        self.set_line(self.wiring.enable, false);
        self.set_line(self.wiring.read, false);

        Ok(bits)
    }

    pub fn write_transaction(&mut self, address: u8, byte: u8) -> Result<(), BusError>
    {
        Self::check(address, Region::Output)?;

        self.drive_group(self.wiring.address, address);
        for pin in self.wiring.data.iter()
        {
            self.pins.set_mode(*pin, PinMode::Output);
        }
        self.drive_group(self.wiring.data, byte);
        self.set_line(self.wiring.write, true);
        self.set_line(self.wiring.enable, true);
        self.hold();
        self.set_line(self.wiring.enable, false);
        self.set_line(self.wiring.write, false);
        self.release_data();

        Ok(())
    }

    /// Raw level of the legacy diagnostic input, `None`
    /// if none is wired.
    pub fn read_legacy_input(&mut self) -> Option<bool>
    {
        let pin = self.wiring.legacy_input?;
        Some(self.pins.read(pin) == Level::High)
    }
}
