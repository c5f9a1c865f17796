// src/result/mod.rs

//! Result delivery for finalized commands.

pub mod sender;

pub use sender::send_result;
