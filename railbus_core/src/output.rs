use railbus_hal::gpio::DigitalPins;
use std::sync::Arc;
use crate::{bus::{lock::SharedBus, Region, OUTPUT_BYTES, OUTPUT_COUNT},
            codec::implode,
            error::BusError,
            state::CachedState,
            trace::trace_helper::TraceHelper};

/// # OutputWriter
/// Switches single output points. An output byte on the
/// bus always carries eight points, so every switch is a
/// read-modify-write of the cached byte. The bus lock is
/// held for the whole sequence, two writers touching the
/// same byte cannot lose each other's bit.
pub struct OutputWriter<P: DigitalPins>
{
    bus: Arc<SharedBus<P>>,
    state: Arc<CachedState>,
    tracer: TraceHelper
}

impl<P: DigitalPins> OutputWriter<P>
{
    pub fn new(bus: Arc<SharedBus<P>>, state: Arc<CachedState>, tracer: TraceHelper) -> Self
    {
        OutputWriter { bus, state, tracer }
    }

    pub fn set_output(&self, index: usize, value: bool) -> Result<(), BusError>
    {
        if index >= OUTPUT_COUNT
        {
            self.tracer.warn(format!("Rejected switch of nonexistent output {}", index));
            return Err(BusError::InvalidOutput { index });
        }

        let offset = index >> 3;
        let address = Region::Output.address(offset).ok_or(BusError::InvalidOutput { index })?;

        let mut bus = self.bus.acquire().map_err(|e| {
            self.tracer.warn(format!("Output {} not switched: {}", index, e));
            e
        })?;
        let mut bits = self.state.output_bits(offset);
        bits[index & 7] = value;
        bus.write_transaction(address, implode(&bits))?;
        self.state.store_output_bits(offset, bits);
        drop(bus);

        self.tracer.trace(format!("Output {} -> {}", index, value as u8));
        Ok(())
    }

    /// Writes 0 to every output byte. Used after start, when
    /// the hardware state is unknown and the cache says 0.
    pub fn reset_all(&self) -> Result<(), BusError>
    {
        for offset in 0..OUTPUT_BYTES
        {
            if let Some(address) = Region::Output.address(offset)
            {
                let mut bus = self.bus.acquire()?;
                bus.write_transaction(address, 0)?;
                self.state.store_output_bits(offset, [false; 8]);
            }
        }
        self.tracer.trace_str("All outputs reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::output::*;
    use crate::bus::{driver::BusDriver, OUTPUT_BASE};
    use crate::core::channel_manager::ChannelManager;
    use railbus_hal::{gpio::BusWiring, sim::{CycleKind, SimulatedBus}};
    use std::{thread, time::Duration};

    fn make_writer() -> (Arc<OutputWriter<SimulatedBus>>, Arc<CachedState>, SimulatedBus)
    {
        let mut chm = ChannelManager::new();
        let sim = SimulatedBus::new(BusWiring::default());
        let mut drv = BusDriver::new(sim.clone(), BusWiring::default(), Duration::from_micros(0));
        drv.init();
        let bus = Arc::new(SharedBus::new(drv, Duration::from_millis(500)));
        let state = Arc::new(CachedState::new());
        let tracer = TraceHelper::new("BUS/Output".to_string(), &mut chm);
        (Arc::new(OutputWriter::new(bus, state.clone(), tracer)), state, sim)
    }

    #[test]
    fn set_output_preserves_other_bits_of_the_byte()
    {
        let (w, state, sim) = make_writer();
        w.set_output(3, true).unwrap();
        assert_eq!(0b0000_1000, sim.byte(OUTPUT_BASE));
        w.set_output(5, true).unwrap();
        assert_eq!(0b0010_1000, sim.byte(OUTPUT_BASE));
        assert_eq!(0b0010_1000, state.output_byte(0));
        w.set_output(3, false).unwrap();
        assert_eq!(0b0010_0000, sim.byte(OUTPUT_BASE));
    }

    #[test]
    fn set_output_twice_changes_nothing_the_second_time()
    {
        let (w, state, sim) = make_writer();
        w.set_output(100, true).unwrap();
        let before = state.outputs_snapshot();
        let hw_before = sim.byte(OUTPUT_BASE + 12);
        w.set_output(100, true).unwrap();
        assert_eq!(before, state.outputs_snapshot());
        assert_eq!(hw_before, sim.byte(OUTPUT_BASE + 12));
    }

    #[test]
    fn last_output_hits_last_address()
    {
        let (w, state, sim) = make_writer();
        w.set_output(1999, true).unwrap();
        assert_eq!(0x80, sim.byte(255));
        assert_eq!(Some(true), state.output(1999));
    }

    #[test]
    fn output_past_the_end_is_rejected()
    {
        let (w, state, sim) = make_writer();
        assert_eq!(Err(BusError::InvalidOutput { index: 2000 }), w.set_output(2000, true));
        assert!(sim.cycles().is_empty());
        assert!(state.outputs_snapshot().iter().all(|b| !b));
    }

    #[test]
    fn writes_never_target_the_input_region()
    {
        let (w, _, sim) = make_writer();
        for i in (0..OUTPUT_COUNT).step_by(7)
        {
            w.set_output(i, true).unwrap();
        }
        assert!(sim.cycles().iter().all(|c| c.kind == CycleKind::Write && c.address >= OUTPUT_BASE));
    }

    #[test]
    fn concurrent_writers_to_one_byte_keep_all_bits()
    {
        let (w, state, sim) = make_writer();
        let handles: Vec<_> = (0..8).map(|bit| {
            let w = w.clone();
            thread::spawn(move || w.set_output(40 + bit, true))
        }).collect();
        for h in handles
        {
            h.join().unwrap().unwrap();
        }
        assert_eq!(0xFF, state.output_byte(5));
        assert_eq!(0xFF, sim.byte(OUTPUT_BASE + 5));
    }

    #[test]
    fn reset_all_clears_hardware_and_cache()
    {
        let (w, state, sim) = make_writer();
        w.set_output(17, true).unwrap();
        sim.clear_cycles();
        w.reset_all().unwrap();
        assert_eq!(0, sim.byte(OUTPUT_BASE + 2));
        assert_eq!(Some(false), state.output(17));
        assert_eq!(OUTPUT_BYTES, sim.cycles().len());
    }
}
