//! OxyTrack document server library.

pub mod server;
