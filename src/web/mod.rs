//! The web module for the HTTP attribute interface.
//! This file declares the other files in this directory as sub-modules.

pub mod api;
pub mod bus_channel;
pub mod models;
