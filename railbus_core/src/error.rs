use crate::bus::Region;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while talking to the bus.
/// All of these are recoverable, the caller decides whether
/// to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusError
{
    #[error("output {index} does not exist")]
    InvalidOutput { index: usize },

    #[error("address {address} is not part of the {region} region")]
    InvalidAddress { address: u8, region: Region },

    #[error("bus still busy after {waited:?}")]
    BusBusy { waited: Duration },

    #[error("too many pending subscriptions (limit is {limit})")]
    SubscriberLimit { limit: usize }
}
