//! # ds1621-sim
//!
//! A software DS1621 digital thermometer that answers I2C traffic byte for
//! byte the way the silicon does, so drivers and test suites can run without
//! the part.
//!
//! - [`codec`]: native and extended resolution temperature encodings
//! - [`device`]: the register engine and its command state machine
//! - [`bus`]: slave event interface and an in-process bus master
//! - [`client`]: host-side driver used by harnesses
//! - [`web`]: HTTP attribute interface (ambient injection, pin inspection)

pub mod bus;
pub mod client;
pub mod codec;
pub mod config;
pub mod device;
pub mod server;
pub mod sim;
pub mod web;
