#[macro_use]
extern crate rouille;

extern crate serde;

extern crate railbus_hal;

pub mod core;
pub mod trace;
pub mod cfg;

pub mod codec;
pub mod error;
pub mod bus;
pub mod state;
pub mod notifier;
pub mod output;
pub mod poller;
pub mod controller;
pub mod web;
