use railbus_hal::gpio::DigitalPins;
use std::{io, sync::Arc, thread};
use crate::{bus::{driver::BusDriver, lock::SharedBus},
            cfg::BusConfig,
            core::channel_manager::ChannelManager,
            error::BusError,
            notifier::{ChangeNotifier, Subscription},
            output::OutputWriter,
            poller::{self, InputPoller, PollLoop, PollStats},
            state::CachedState,
            trace::trace_helper::TraceHelper,
            web};

/// What the outside world (the web surface) gets to
/// see of the bus.
pub trait IoBus: Send + Sync
{
    /// Wired inputs as of the last completed poll pass,
    /// never touches the bus.
    fn read_inputs_snapshot(&self) -> Vec<bool>;

    /// Returns once the bus write is done.
    fn set_output(&self, index: usize, value: bool) -> Result<(), BusError>;

    fn subscribe_once(&self) -> Result<Subscription, BusError>;

    fn stats(&self) -> PollStats;

    fn legacy_input(&self) -> Option<bool>;
}

/// # BusController
/// Wires driver, bus lock, cache, poller, notifier and
/// output writer together. One instance per physical bus,
/// tests simply build a fresh one.
pub struct BusController<P: DigitalPins>
{
    state: Arc<CachedState>,
    notifier: Arc<ChangeNotifier>,
    poller: Arc<InputPoller<P>>,
    writer: OutputWriter<P>
}

impl<P: DigitalPins> BusController<P>
{
    pub fn new(pins: P, cfg: &BusConfig, chm: &mut ChannelManager) -> Self
    {
        let mut driver = BusDriver::new(pins, cfg.wiring.clone(), cfg.strobe_hold());
        driver.init();

        let bus = Arc::new(SharedBus::new(driver, cfg.bus_timeout()));
        let state = Arc::new(CachedState::new());
        let notifier = Arc::new(ChangeNotifier::new(cfg.max_subscribers));
        let poller = Arc::new(InputPoller::new(bus.clone(),
                                               state.clone(),
                                               notifier.clone(),
                                               TraceHelper::new("BUS/Poller".to_string(), chm)));
        let writer = OutputWriter::new(bus,
                                       state.clone(),
                                       TraceHelper::new("BUS/Output".to_string(), chm));

        BusController { state, notifier, poller, writer }
    }

    /// Builds the poll loop for this bus, to be handed
    /// to `poller::launch`.
    pub fn poll_loop(&self, cfg: &BusConfig, chm: &mut ChannelManager) -> PollLoop<P>
    {
        let tracer = TraceHelper::new("BUS/PollLoop".to_string(), chm);
        PollLoop::new(self.poller.clone(),
                      self.state.clone(),
                      tracer,
                      chm,
                      cfg.poll_interval(),
                      cfg.status_interval())
    }

    pub fn scan_pass(&self) -> Result<bool, BusError>
    {
        self.poller.scan_pass()
    }

    pub fn reset_outputs(&self) -> Result<(), BusError>
    {
        self.writer.reset_all()
    }

    pub fn state(&self) -> &CachedState
    {
        &self.state
    }
}

impl<P: DigitalPins + Send> IoBus for BusController<P>
{
    fn read_inputs_snapshot(&self) -> Vec<bool>
    {
        self.state.inputs_snapshot()
    }

    fn set_output(&self, index: usize, value: bool) -> Result<(), BusError>
    {
        self.writer.set_output(index, value)
    }

    fn subscribe_once(&self) -> Result<Subscription, BusError>
    {
        self.notifier.subscribe_once()
    }

    fn stats(&self) -> PollStats
    {
        self.poller.stats()
    }

    fn legacy_input(&self) -> Option<bool>
    {
        self.poller.legacy_input()
    }
}

/// Brings up a complete bus on `pins`: driver init, all
/// outputs to 0, poller thread and web surface. Returns
/// the handles of the started threads.
pub fn launch<P>(pins: P, cfg: &BusConfig, chm: &mut ChannelManager) -> io::Result<Vec<thread::JoinHandle<()>>>
    where P: DigitalPins + Send + 'static
{
    let tracer = TraceHelper::new("BUS/Controller".to_string(), chm);
    let controller = Arc::new(BusController::new(pins, cfg, chm));

    if let Err(e) = controller.reset_outputs()
    {
        tracer.warn(format!("Outputs not reset: {}", e));
    }

    let poller = poller::launch(controller.poll_loop(cfg, chm))?;
    let web = web::launch(chm, controller, cfg)?;
    tracer.trace(format!("Bus up, web surface on {}", cfg.http_address));
    Ok(vec![poller, web])
}
