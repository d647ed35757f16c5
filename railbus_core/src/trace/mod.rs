use crate::core::{channel_manager::ChannelManager, SystemMessage};
use std::{io, thread};

pub mod trace_helper;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceLevel
{
    Debug,
    Info,
    Warn,
    Error
}

#[derive(Clone, Debug)]
pub struct TraceMessage
{
    pub level: TraceLevel,
    pub msg: String
}

impl TraceMessage
{
    pub fn new(level: TraceLevel, msg: String) -> Self
    {
        TraceMessage { level, msg }
    }
}

fn emit(message: &TraceMessage)
{
    match message.level
    {
        TraceLevel::Debug => log::debug!("{}", message.msg),
        TraceLevel::Info => log::info!("{}", message.msg),
        TraceLevel::Warn => log::warn!("{}", message.msg),
        TraceLevel::Error => log::error!("{}", message.msg)
    }
}

/// Starts the trace sink: a thread forwarding every
/// TraceMessage to the `log` facade. The thread ends
/// when a Shutdown system message is seen, after draining
/// whatever is still queued.
pub fn launch(chm: &mut ChannelManager) -> io::Result<thread::JoinHandle<()>>
{
    let trace_rx = chm.get_receiver::<TraceMessage>();
    let sys_rx = chm.get_receiver::<SystemMessage>();

    thread::Builder::new()
        .name("Trace".to_string())
        .spawn(move || {
            loop
            {
                if let Some(message) = trace_rx.receive_with_timeout(100)
                {
                    emit(&message);
                }

                if let Some(SystemMessage::Shutdown) = sys_rx.try_receive()
                {
                    while let Some(message) = trace_rx.try_receive()
                    {
                        emit(&message);
                    }
                    break;
                }
            }
        })
}
