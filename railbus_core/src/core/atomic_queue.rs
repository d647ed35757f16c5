use std::{collections::VecDeque, sync::Mutex, time::{Duration, Instant}};
use super::event::Event;

/// Thread safe FIFO with a single consumer. The
/// producer signals every push, the consumer can block
/// on the signal with or without timeout.
pub struct AtomicQueue<T>
{
    data: Mutex<VecDeque<T>>,
    evt: Event
}

impl<T> AtomicQueue<T>
{
    pub fn new() -> Self
    {
        Self
        {
            data: Mutex::new(VecDeque::new()),
            evt: Event::new()
        }
    }

    pub fn push(&self, value: T)
    {
        self.data
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(value);
        self.evt.trigger();
    }

    pub fn pop(&self) -> Option<T>
    {
        self.data
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
    }

    pub fn pop_blocking(&self) -> T
    {
        loop
        {
            if let Some(value) = self.pop()
            {
                return value;
            }
            self.evt.wait();
        }
    }

    pub fn pop_timeout(&self, timeout: Duration) -> Option<T>
    {
        let deadline = Instant::now() + timeout;
        loop
        {
            if let Some(value) = self.pop()
            {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline || !self.evt.wait_timeout(deadline - now)
            {
                return self.pop();
            }
        }
    }
}
