use parking_lot::{Mutex, MutexGuard};
use railbus_hal::gpio::DigitalPins;
use std::time::Duration;
use crate::{bus::driver::BusDriver, codec::Bits, error::BusError};

pub type BusGuard<'a, P> = MutexGuard<'a, BusDriver<P>>;

/// # SharedBus
/// Owns the driver and hands it out to one user at a time.
/// Acquiring gives up after `timeout` with `BusBusy`, so a
/// stuck holder cannot hang the poller and every request
/// behind it.
///
/// A caller that needs several transactions to be atomic
/// (read-modify-write) holds the guard from `acquire` for
/// the whole sequence; the single transaction helpers take
/// and release the lock per transaction.
pub struct SharedBus<P: DigitalPins>
{
    driver: Mutex<BusDriver<P>>,
    timeout: Duration
}

impl<P: DigitalPins> SharedBus<P>
{
    pub fn new(driver: BusDriver<P>, timeout: Duration) -> Self
    {
        SharedBus
        {
            driver: Mutex::new(driver),
            timeout
        }
    }

    pub fn acquire(&self) -> Result<BusGuard<'_, P>, BusError>
    {
        self.driver
            .try_lock_for(self.timeout)
            .ok_or(BusError::BusBusy { waited: self.timeout })
    }

    pub fn read(&self, address: u8) -> Result<Bits, BusError>
    {
        self.acquire()?.read_transaction(address)
    }

    pub fn write(&self, address: u8, byte: u8) -> Result<(), BusError>
    {
        self.acquire()?.write_transaction(address, byte)
    }

    pub fn read_legacy_input(&self) -> Result<Option<bool>, BusError>
    {
        Ok(self.acquire()?.read_legacy_input())
    }
}
