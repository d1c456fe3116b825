#![allow(missing_docs)]

pub mod bridge;
pub mod cli;
pub mod locale;
pub mod logging;
