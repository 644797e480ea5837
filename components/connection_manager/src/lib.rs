#![crate_type = "lib"]
#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception,
    clippy::new_without_default
)]

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod config;
mod events;
mod join;
mod ledger;
mod manager;
mod partners;
mod report;
mod settle;
mod strategy;


pub use self::config::{ConfigError, ConnectionManagerConfig};
pub use self::events::{connection_manager_loop, spawn_connection_manager_loop};
pub use self::join::JoinOutcome;
pub use self::ledger::{ChannelActions, LedgerView, SettlementWaiter};
pub use self::manager::{ConnectionManager, ConnectError, InvalidAmount, LeaveError};
pub use self::partners::select_new_partners;
pub use self::report::ConnectionManagerReport;
pub use self::settle::PollSettlementWaiter;
pub use self::strategy::StrategyParams;
