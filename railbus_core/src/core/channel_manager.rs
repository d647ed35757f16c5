use crate::core::broadcast_channel::*;
use crate::core::shareable::Shareable;
use anymap::any::Any;
use std::sync::Arc;

type ChannelMap = anymap::Map<dyn Any + Send>;

/// # ChannelManager
/// Registry of broadcast channels, one per message type.
/// Components ask for a sender or receiver of the message
/// type they care about and the channel is created on first
/// use.
pub struct ChannelManager
{
    channels: Shareable<ChannelMap>
}

impl ChannelManager
{
    pub fn new() -> Self
    {
        ChannelManager
        {
            channels: Shareable::new(ChannelMap::new())
        }
    }

    fn channel<T: 'static + Clone + Send>(&self) -> Arc<ChannelImpl<T>>
    {
        let mut channels = self.channels.lock();
        if let Some(chan) = channels.get::<Arc<ChannelImpl<T>>>()
        {
            return chan.clone();
        }
        let chan = Arc::new(ChannelImpl::<T>::new());
        channels.insert(chan.clone());
        chan
    }

    pub fn get_receiver<T: 'static + Clone + Send>(&mut self) -> GenericReceiver<T>
    {
        make_receiver(&self.channel::<T>())
    }

    pub fn get_sender<T: 'static + Clone + Send>(&mut self) -> GenericSender<T>
    {
        make_sender(&self.channel::<T>())
    }
}

impl Clone for ChannelManager
{
    fn clone(&self) -> Self
    {
        Self
        {
            channels: self.channels.clone()
        }
    }
}
