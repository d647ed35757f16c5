use chrono::{DateTime, Utc};
use std::{sync::{Arc, Weak}, time::Duration};
use crate::{core::{event::DataEvent, shareable::Shareable}, error::BusError};

/// Emitted by the poller when a pass saw different inputs
/// than the pass before. Carries the full input image, not
/// a diff.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeNotification
{
    pub timestamp: DateTime<Utc>,
    pub inputs: Vec<bool>
}

impl ChangeNotification
{
    pub fn new(inputs: Vec<bool>) -> Self
    {
        ChangeNotification
        {
            timestamp: Utc::now(),
            inputs
        }
    }
}

type Slot = DataEvent<ChangeNotification>;

/// Handle for one pending "next change" subscription. It
/// resolves with the first notification published after it
/// was created. Dropping the handle cancels the
/// subscription and frees its slot.
pub struct Subscription
{
    slot: Arc<Slot>
}

impl Subscription
{
    pub fn wait(&self) -> ChangeNotification
    {
        self.slot.wait()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<ChangeNotification>
    {
        self.slot.wait_timeout(timeout)
    }

    pub fn try_take(&self) -> Option<ChangeNotification>
    {
        self.slot.peek()
    }
}

/// # ChangeNotifier
/// One-shot publish/subscribe. Every publish resolves all
/// subscriptions registered so far and empties the list,
/// later subscribers wait for the next publish. Nothing is
/// retained for replay.
///
/// The number of live subscriptions is capped. Slots are
/// held weakly, so a subscriber that went away (dropped its
/// handle) does not count against the cap.
pub struct ChangeNotifier
{
    slots: Shareable<Vec<Weak<Slot>>>,
    limit: usize
}

impl ChangeNotifier
{
    pub fn new(limit: usize) -> Self
    {
        ChangeNotifier
        {
            slots: Shareable::new(Vec::new()),
            limit
        }
    }

    pub fn subscribe_once(&self) -> Result<Subscription, BusError>
    {
        let mut slots = self.slots.lock();
        slots.retain(|s| s.strong_count() > 0);
        if slots.len() >= self.limit
        {
            return Err(BusError::SubscriberLimit { limit: self.limit });
        }

        let slot = Arc::new(Slot::new());
        slots.push(Arc::downgrade(&slot));
        Ok(Subscription { slot })
    }

    /// Hands `notification` to every live subscriber.
    /// Returns how many received it.
    pub fn publish(&self, notification: ChangeNotification) -> usize
    {
        let pending = std::mem::take(&mut *self.slots.lock());
        pending.iter()
               .filter_map(Weak::upgrade)
               .filter(|slot| slot.trigger(notification.clone()))
               .count()
    }

    pub fn pending(&self) -> usize
    {
        self.slots
            .lock()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }
}
