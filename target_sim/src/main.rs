extern crate railbus_core;
extern crate railbus_hal;

use railbus_core::{cfg, controller, core::channel_manager::ChannelManager, trace};
use railbus_core::trace::trace_helper::TraceHelper;
use railbus_hal::sim::SimulatedBus;
use std::{env, process, time::Duration};

mod io;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut chm = ChannelManager::new();
    if let Err(e) = trace::launch(&mut chm)
    {
        log::error!("Cannot start trace thread: {}", e);
        process::exit(1);
    }
    let tracer = TraceHelper::new("Plattform/Sim".to_string(), &mut chm);

    let path = env::args().nth(1).unwrap_or_else(|| "railbus.json".to_string());
    let config = match cfg::load_or_default(&path, &tracer)
    {
        Ok(c) => c,
        Err(e) =>
        {
            log::error!("{}: {}", path, e);
            process::exit(1);
        }
    };

    let bus = SimulatedBus::new(config.wiring.clone());
    let stimulus = io::Stimulus::new(bus.clone(), &mut chm, Duration::from_millis(500));

    let started = io::launch(stimulus)
        .and_then(|s| controller::launch(bus, &config, &mut chm).map(|mut t| { t.push(s); t }));
    match started
    {
        Ok(threads) =>
        {
            tracer.trace_str("Simulated bus running");
            for t in threads
            {
                let _ = t.join();
            }
        },
        Err(e) =>
        {
            log::error!("Cannot start bus: {}", e);
            process::exit(1);
        }
    }
}
