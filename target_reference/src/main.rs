extern crate railbus_core;
extern crate railbus_hal;
extern crate rppal;

use railbus_core::{cfg, controller, core::channel_manager::ChannelManager, trace};
use railbus_core::trace::trace_helper::TraceHelper;
use std::{env, process};

mod io;
use io::RppalPins;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut chm = ChannelManager::new();
    let trace_thread = match trace::launch(&mut chm)
    {
        Ok(t) => t,
        Err(e) =>
        {
            log::error!("Cannot start trace thread: {}", e);
            process::exit(1);
        }
    };
    let tracer = TraceHelper::new("Plattform/Reference".to_string(), &mut chm);

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

    let pins = match RppalPins::new(&config.wiring)
    {
        Ok(p) => p,
        Err(e) =>
        {
            log::error!("Cannot claim GPIO pins: {}", e);
            process::exit(1);
        }
    };

    match controller::launch(pins, &config, &mut chm)
    {
        Ok(threads) =>
        {
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
    let _ = trace_thread.join();
}
