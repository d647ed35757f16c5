use std::sync::{Arc, Weak};
use std::time::Duration;
use super::{atomic_queue::AtomicQueue, shareable::Shareable};

const GARBAGE_THRESHOLD: usize = 10;

/// The shared part of a channel: the list of receiver
/// queues. Receivers are held weakly, a dropped receiver
/// simply stops getting messages.
pub struct ChannelImpl<T: Clone>
{
    receiver_queues: Shareable<Vec<Weak<AtomicQueue<T>>>>
}

impl<T: Clone> ChannelImpl<T>
{
    pub fn new() -> Self
    {
        ChannelImpl
        {
            receiver_queues: Shareable::new(Vec::new())
        }
    }

    fn push_message(&self, data: T)
    {
        let mut queues = self.receiver_queues.lock();
        let mut garbage = 0;
        for q in queues.iter()
        {
            match q.upgrade()
            {
                Some(queue) => queue.push(data.clone()),
                None => garbage += 1
            }
        }

        if garbage > GARBAGE_THRESHOLD
        {
            queues.retain(|q| q.strong_count() > 0);
        }
    }

    fn add_receiver(&self, queue: Weak<AtomicQueue<T>>)
    {
        self.receiver_queues.lock().push(queue)
    }
}

pub fn make_receiver<T: Clone>(owner: &Arc<ChannelImpl<T>>) -> GenericReceiver<T>
{
    let queue = Arc::new(AtomicQueue::new());
    owner.add_receiver(Arc::downgrade(&queue));
    GenericReceiver
    {
        owner: owner.clone(),
        queue
    }
}

pub fn make_sender<T: Clone>(owner: &Arc<ChannelImpl<T>>) -> GenericSender<T>
{
    GenericSender
    {
        source: owner.clone()
    }
}

pub struct GenericReceiver<T: Clone>
{
    owner: Arc<ChannelImpl<T>>,
    queue: Arc<AtomicQueue<T>>
}

impl<T: Clone> GenericReceiver<T>
{
    /// A new receiver on the same channel. It only sees
    /// messages sent after it was created.
    pub fn clone_receiver(&self) -> Self
    {
        make_receiver(&self.owner)
    }

    pub fn receive(&self) -> T
    {
        self.queue.pop_blocking()
    }

    pub fn try_receive(&self) -> Option<T>
    {
        self.queue.pop()
    }

    pub fn receive_with_timeout(&self, milliseconds: u64) -> Option<T>
    {
        self.queue.pop_timeout(Duration::from_millis(milliseconds))
    }
}

pub struct GenericSender<T: Clone>
{
    source: Arc<ChannelImpl<T>>
}

impl<T: Clone> GenericSender<T>
{
    pub fn send(&self, data: T)
    {
        self.source.push_message(data);
    }
}

impl<T: Clone> Clone for GenericSender<T>
{
    fn clone(&self) -> Self
    {
        make_sender(&self.source)
    }
}
