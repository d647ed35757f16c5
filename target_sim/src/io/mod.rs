use railbus_core::{bus::{INPUT_BASE, INPUT_COUNT},
                   core::{broadcast_channel::GenericReceiver, channel_manager::ChannelManager, SystemMessage},
                   trace::trace_helper::TraceHelper};
use railbus_hal::sim::SimulatedBus;
use std::{io, thread, time::Duration};

/// Plays "layout" on the simulated backplane: walks a
/// single occupied bit across the wired inputs, so the
/// poller and the /messages long poll have something to
/// report.
pub struct Stimulus
{
    bus: SimulatedBus,
    tracer: TraceHelper,
    system_events_rx: GenericReceiver<SystemMessage>,
    period: Duration,
    position: usize
}

impl Stimulus
{
    pub fn new(bus: SimulatedBus, chm: &mut ChannelManager, period: Duration) -> Self
    {
        Stimulus
        {
            bus,
            tracer: TraceHelper::new("Plattform/SimStimulus".to_string(), chm),
            system_events_rx: chm.get_receiver(),
            period,
            position: 0
        }
    }

    fn step(&mut self)
    {
        let total = INPUT_COUNT;
        let (old_byte, new_byte) = (self.position / 8, ((self.position + 1) % total) / 8);
        self.position = (self.position + 1) % total;

        self.bus.set_byte(INPUT_BASE + old_byte as u8, 0);
        self.bus.set_byte(INPUT_BASE + new_byte as u8, 1 << (self.position % 8));
        self.tracer.debug(format!("Input {} occupied", self.position));
    }

    pub fn run(&mut self) -> bool
    {
        if let Some(SystemMessage::Shutdown) = self.system_events_rx.receive_with_timeout(self.period.as_millis() as u64)
        {
            return false;
        }
        self.step();
        true
    }
}

pub fn launch(mut stimulus: Stimulus) -> io::Result<thread::JoinHandle<()>>
{
    thread::Builder::new()
        .name("Stimulus".to_string())
        .spawn(move || {
            while stimulus.run() {}
        })
}
