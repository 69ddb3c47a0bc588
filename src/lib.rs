#![cfg_attr(not(test), no_std)]
pub mod bus;
pub mod card;
pub mod command_arguments;
pub mod command_flags;
pub mod command_responses;
pub mod commands;
pub mod config;
pub mod controller;
pub mod detect;
pub mod error;
pub mod registers;
pub mod registry;
pub mod status;

#[cfg(test)]
mod test;

pub use bus::Transport;
pub use controller::{Completion, Controller, Degraded, InitError, InitState, TransferReady};
pub use error::{Error, TransportError};
pub use registry::CommandRegistry;
