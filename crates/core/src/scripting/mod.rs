//! Script execution inside the headless host process.
//!
//! [`harness::BlenderHarness`] is the entry point. It writes the script body
//! and the fixed [`envelope`] into a [`scratch::ScratchSet`], launches the
//! host through [`subprocess::run_command`] with a timeout, and turns every
//! outcome into result text.

pub mod envelope;
pub mod executor;
pub mod harness;
pub mod host;
pub mod scratch;
pub mod subprocess;
