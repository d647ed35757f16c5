/*

The core services module contains the plumbing shared by
all bus components, most notably

* shared state with poison recovery
* condvar based events
* the broadcast channel and the channel manager, which
  carry trace output and system messages between threads

*/

pub mod shareable;
pub mod event;
pub mod atomic_queue;
pub mod broadcast_channel;
pub mod channel_manager;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SystemMessage
{
    Shutdown
}
