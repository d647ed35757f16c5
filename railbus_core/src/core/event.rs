use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T>
{
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Auto-resetting event: a trigger releases exactly
/// one wait. Triggers are not counted, triggering twice
/// before a wait still releases only one wait.
pub struct Event
{
    signalled: Mutex<bool>,
    cond: Condvar
}

impl Event
{
    pub fn new() -> Self
    {
        Event
        {
            signalled: Mutex::new(false),
            cond: Condvar::new()
        }
    }

    pub fn trigger(&self)
    {
        *relock(&self.signalled) = true;
        self.cond.notify_one();
    }

    pub fn wait(&self)
    {
        let mut signalled = relock(&self.signalled);
        while !*signalled
        {
            signalled = self.cond.wait(signalled).unwrap_or_else(|p| p.into_inner());
        }
        *signalled = false;
    }

    /// Returns false if the timeout elapsed without a trigger.
    pub fn wait_timeout(&self, timeout: Duration) -> bool
    {
        let deadline = Instant::now() + timeout;
        let mut signalled = relock(&self.signalled);
        while !*signalled
        {
            let now = Instant::now();
            if now >= deadline
            {
                return false;
            }
            signalled = self.cond
                            .wait_timeout(signalled, deadline - now)
                            .unwrap_or_else(|p| p.into_inner())
                            .0;
        }
        *signalled = false;
        true
    }
}

/// # DataEvent
/// A single-assignment slot: `trigger` stores a value
/// and wakes all waiters, every waiter gets a copy of the
/// stored value. Later triggers are ignored.
pub struct DataEvent<T: Clone>
{
    data: Mutex<Option<T>>,
    cond: Condvar
}

impl<T: Clone> DataEvent<T>
{
    pub fn new() -> Self
    {
        DataEvent
        {
            data: Mutex::new(None),
            cond: Condvar::new()
        }
    }

    /// Returns false if the slot was already filled.
    pub fn trigger(&self, value: T) -> bool
    {
        let mut data = relock(&self.data);
        if data.is_some()
        {
            return false;
        }
        *data = Some(value);
        self.cond.notify_all();
        true
    }

    pub fn peek(&self) -> Option<T>
    {
        relock(&self.data).clone()
    }

    pub fn wait(&self) -> T
    {
        let mut data = relock(&self.data);
        loop
        {
            if let Some(value) = data.as_ref()
            {
                return value.clone();
            }
            data = self.cond.wait(data).unwrap_or_else(|p| p.into_inner());
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<T>
    {
        let deadline = Instant::now() + timeout;
        let mut data = relock(&self.data);
        loop
        {
            if let Some(value) = data.as_ref()
            {
                return Some(value.clone());
            }
            let now = Instant::now();
            if now >= deadline
            {
                return None;
            }
            data = self.cond
                       .wait_timeout(data, deadline - now)
                       .unwrap_or_else(|p| p.into_inner())
                       .0;
        }
    }
}

#[cfg(test)]
mod tests {
     use crate::core::event::*;
     use std::{sync::Arc, thread};

     #[test]
     fn event_resets_after_wait()
     {
         let e = Event::new();
         e.trigger();
         assert!(e.wait_timeout(Duration::from_millis(50)));
         assert!(!e.wait_timeout(Duration::from_millis(10)));
     }

     #[test]
     fn event_times_out_without_trigger()
     {
         let e = Event::new();
         let now = Instant::now();
         assert!(!e.wait_timeout(Duration::from_millis(20)));
         assert!(now.elapsed() >= Duration::from_millis(20));
     }

     #[test]
     fn trigger_from_other_thread_releases_wait()
     {
         let e = Arc::new(Event::new());
         let e2 = e.clone();
         let t = thread::spawn(move || e2.wait());
         thread::sleep(Duration::from_millis(10));
         e.trigger();
         t.join().unwrap();
     }

     #[test]
     fn data_event_keeps_first_value()
     {
         let e = DataEvent::new();
         assert!(e.trigger(1048));
         assert!(!e.trigger(7));
         assert_eq!(1048, e.wait());
         assert_eq!(Some(1048), e.wait_timeout(Duration::from_millis(1)));
     }

     #[test]
     fn data_event_wait_timeout_yields_none()
     {
         let e = DataEvent::<u32>::new();
         assert_eq!(None, e.wait_timeout(Duration::from_millis(10)));
         assert_eq!(None, e.peek());
     }
}
