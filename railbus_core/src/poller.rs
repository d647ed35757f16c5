use railbus_hal::gpio::DigitalPins;
use std::{io, sync::Arc, thread, time::{Duration, Instant}};
use crate::{bus::{lock::SharedBus, Region, INPUT_BYTES, INPUT_COUNT},
            core::{broadcast_channel::GenericReceiver, channel_manager::ChannelManager, shareable::Shareable, SystemMessage},
            error::BusError,
            notifier::{ChangeNotification, ChangeNotifier},
            state::CachedState,
            trace::trace_helper::TraceHelper};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PollStats
{
    pub passes: u64,
    pub last_pass_us: u64
}

/// # InputPoller
/// Scans the whole input region once per pass. Each
/// address is read with its own bus transaction, so output
/// writes can slip in between two input bytes but never
/// into the middle of one.
///
/// The cache is only updated once a pass completed, a pass
/// that fails half way leaves the previous image in place.
pub struct InputPoller<P: DigitalPins>
{
    bus: Arc<SharedBus<P>>,
    state: Arc<CachedState>,
    notifier: Arc<ChangeNotifier>,
    tracer: TraceHelper,
    pass_lock: parking_lot::Mutex<()>,
    stats: Shareable<PollStats>,
    legacy_input: Shareable<Option<bool>>
}

impl<P: DigitalPins> InputPoller<P>
{
    pub fn new(bus: Arc<SharedBus<P>>, state: Arc<CachedState>, notifier: Arc<ChangeNotifier>, tracer: TraceHelper) -> Self
    {
        InputPoller
        {
            bus,
            state,
            notifier,
            tracer,
            pass_lock: parking_lot::Mutex::new(()),
            stats: Shareable::new(PollStats::default()),
            legacy_input: Shareable::new(None)
        }
    }

    /// Runs one full pass. Returns whether the inputs
    /// changed compared to the previous pass.
    pub fn scan_pass(&self) -> Result<bool, BusError>
    {
        let _pass = self.pass_lock.lock();
        let started = Instant::now();

        let mut scanned = Vec::with_capacity(INPUT_BYTES * 8);
        for offset in 0..INPUT_BYTES
        {
            if let Some(address) = Region::Input.address(offset)
            {
                scanned.extend_from_slice(&self.bus.read(address)?);
            }
        }
        self.sample_legacy_input()?;

        let snapshot = scanned[..INPUT_COUNT].to_vec();
        let changed = self.state.replace_inputs(scanned);

        {
            let mut stats = self.stats.lock();
            stats.passes += 1;
            stats.last_pass_us = started.elapsed().as_micros() as u64;
        }

        if changed
        {
            let delivered = self.notifier.publish(ChangeNotification::new(snapshot));
            self.tracer.debug(format!("Inputs changed, notified {} subscriber(s)", delivered));
        }
        Ok(changed)
    }

    fn sample_legacy_input(&self) -> Result<(), BusError>
    {
        let level = self.bus.read_legacy_input()?;
        let mut last = self.legacy_input.lock();
        if *last != level
        {
            if let Some(high) = level
            {
                self.tracer.trace(format!("Legacy input now {}", high as u8));
            }
            *last = level;
        }
        Ok(())
    }

    pub fn stats(&self) -> PollStats
    {
        self.stats.snapshot()
    }

    pub fn legacy_input(&self) -> Option<bool>
    {
        *self.legacy_input.lock()
    }
}

fn bits_to_string(bits: &[bool]) -> String
{
    bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
}

/// The poll loop: pass, yield (or sleep), pass, ...
/// Stops on SystemMessage::Shutdown.
pub struct PollLoop<P: DigitalPins>
{
    poller: Arc<InputPoller<P>>,
    state: Arc<CachedState>,
    system_events_rx: GenericReceiver<SystemMessage>,
    tracer: TraceHelper,
    interval: Duration,
    status_interval: Duration,
    last_status: Instant
}

impl<P: DigitalPins> PollLoop<P>
{
    pub fn new(poller: Arc<InputPoller<P>>, state: Arc<CachedState>, tracer: TraceHelper,
               chm: &mut ChannelManager, interval: Duration, status_interval: Duration) -> Self
    {
        PollLoop
        {
            poller,
            state,
            system_events_rx: chm.get_receiver(),
            tracer,
            interval,
            status_interval,
            last_status: Instant::now()
        }
    }

    pub fn run(&mut self) -> bool
    {
        if let Some(SystemMessage::Shutdown) = self.system_events_rx.try_receive()
        {
            self.tracer.trace_str("Shutdown, poller stops");
            return false;
        }

        if let Err(e) = self.poller.scan_pass()
        {
            self.tracer.warn(format!("Pass abandoned: {}", e));
        }

        if self.last_status.elapsed() >= self.status_interval
        {
            let stats = self.poller.stats();
            self.tracer.debug(format!("pass {} took {} us, inputs {}",
                                      stats.passes,
                                      stats.last_pass_us,
                                      bits_to_string(&self.state.inputs_snapshot())));
            self.last_status = Instant::now();
        }

        if self.interval > Duration::from_millis(0)
        {
            thread::sleep(self.interval);
        }
        else
        {
            thread::yield_now();
        }
        true
    }
}

pub fn launch<P>(mut poll_loop: PollLoop<P>) -> io::Result<thread::JoinHandle<()>>
    where P: DigitalPins + Send + 'static
{
    poll_loop.tracer.trace_str("Starting");
    thread::Builder::new()
        .name("Poller".to_string())
        .spawn(move || {
            loop
            {
                if !poll_loop.run()
                {
                    break;
                }
            }
        })
}
