extern crate serde;

pub mod gpio;
pub mod sim;
