#![deny(unused_imports)]
#![deny(unused_variables)]

pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod retry;
pub mod traits;
pub mod types;
