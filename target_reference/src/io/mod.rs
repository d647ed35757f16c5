use railbus_hal::gpio::{BusWiring, DigitalPins, Level, PinMode};
use rppal::gpio::{self, Gpio, IoPin, Mode};
use std::collections::HashMap;

fn to_mode(mode: PinMode) -> Mode
{
    match mode
    {
        PinMode::Input => Mode::Input,
        PinMode::Output => Mode::Output
    }
}

/// # RppalPins
/// The bus lines on the Raspberry Pi GPIO header. All
/// pins named by the wiring are claimed up front and kept
/// for the lifetime of the process; rppal resets a pin
/// once its handle is dropped.
pub struct RppalPins
{
    pins: HashMap<u8, IoPin>
}

impl RppalPins
{
    pub fn new(wiring: &BusWiring) -> Result<Self, gpio::Error>
    {
        let gpio = Gpio::new()?;
        let mut pins = HashMap::new();

        let mut numbers = wiring.bus_pins();
        if let Some(legacy) = wiring.legacy_input
        {
            numbers.push(legacy);
        }

        for n in numbers
        {
            if !pins.contains_key(&n)
            {
                pins.insert(n, gpio.get(n)?.into_io(Mode::Input));
            }
        }
        Ok(RppalPins { pins })
    }
}

impl DigitalPins for RppalPins
{
    fn set_mode(&mut self, pin: u8, mode: PinMode)
    {
        if let Some(p) = self.pins.get_mut(&pin)
        {
            p.set_mode(to_mode(mode));
        }
    }

    fn write(&mut self, pin: u8, level: Level)
    {
        if let Some(p) = self.pins.get_mut(&pin)
        {
            match level
            {
                Level::High => p.set_high(),
                Level::Low => p.set_low()
            }
        }
    }

    fn read(&mut self, pin: u8) -> Level
    {
        match self.pins.get(&pin).map(|p| p.read())
        {
            Some(gpio::Level::High) => Level::High,
            _ => Level::Low
        }
    }
}
