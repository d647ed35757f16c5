use crate::core::{broadcast_channel::GenericSender, channel_manager::ChannelManager};
use crate::trace::{TraceLevel, TraceMessage};

/// Prefixes every message with the name of the
/// component it came from and puts it on the trace
/// channel.
#[derive(Clone)]
pub struct TraceHelper
{
    source_mod: String,
    trace_tx: GenericSender<TraceMessage>
}

impl TraceHelper
{
    pub fn new(module_name: String, channel_manager: &mut ChannelManager) -> Self
    {
        TraceHelper
        {
            source_mod: module_name,
            trace_tx: channel_manager.get_sender::<TraceMessage>()
        }
    }

    fn send(&self, level: TraceLevel, message: &str)
    {
        let msg = format!("{}: {}", self.source_mod, message);
        self.trace_tx.send(TraceMessage::new(level, msg));
    }

    pub fn trace(&self, message: String)
    {
        self.send(TraceLevel::Info, &message);
    }

    pub fn trace_str(&self, message: &str)
    {
        self.send(TraceLevel::Info, message);
    }

    pub fn debug(&self, message: String)
    {
        self.send(TraceLevel::Debug, &message);
    }

    pub fn warn(&self, message: String)
    {
        self.send(TraceLevel::Warn, &message);
    }

    pub fn error(&self, message: String)
    {
        self.send(TraceLevel::Error, &message);
    }
}

#[cfg(test)]
mod tests {
    use crate::trace::trace_helper::*;

    #[test]
    fn messages_carry_module_prefix_and_level()
    {
        let mut chm = ChannelManager::new();
        let rx = chm.get_receiver::<TraceMessage>();
        let tracer = TraceHelper::new("BUS/Test".to_string(), &mut chm);
        tracer.warn(format!("busy for {} ms", 3));
        let msg = rx.receive_with_timeout(10).unwrap();
        assert_eq!("BUS/Test: busy for 3 ms", msg.msg);
        assert_eq!(TraceLevel::Warn, msg.level);
    }
}
