use std::sync::{Arc, Mutex, MutexGuard};

/// # A piece of shareable state
/// Wraps the common Arc<Mutex<Data>> pattern. Locking
/// never fails: a poisoned mutex is taken over as is,
/// since every writer in this crate stores whole values.
pub struct Shareable<T>
{
    data: Arc<Mutex<T>>
}

impl<T> Shareable<T>
{
    pub fn new(data: T) -> Self
    {
        Shareable
        {
            data: Arc::new(Mutex::new(data))
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T>
    {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Shareable<T>
{
    pub fn snapshot(&self) -> T
    {
        self.lock().clone()
    }
}

impl<T> Clone for Shareable<T>
{
    fn clone(&self) -> Self
    {
        Shareable
        {
            data: self.data.clone()
        }
    }
}
