//! Domain logic for the headless script manager: name validation, shared
//! error types, built-in example scripts, and the execution harness.

pub mod error;
pub mod examples;
pub mod naming;
pub mod scripting;
pub mod types;
