//! Chat Host - the core of the desktop chat client
//!
//! This crate keeps the UI responsive and consistent:
//! - `balance_monitor` polls the account balance in the background and
//!   raises one low-balance alert per excursion below the threshold
//! - `request_bridge` runs chat requests off the UI thread and applies each
//!   result to the transcript exactly once
//!
//! Nothing here depends on a GUI toolkit; the front end implements
//! [`ChatSurface`] and drains the display channel each frame.

pub mod balance_monitor;
pub mod request_bridge;

pub use balance_monitor::{
    BalanceDisplay, BalanceMonitor, BalancePhase, BalanceState, BalanceTier,
};
pub use request_bridge::{BridgeOutcome, ChatSurface, InputState, PendingRequest, RequestBridge};
