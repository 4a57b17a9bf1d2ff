//! The register-machine executor: the `VThread`
//! register file and value stack, the `VmConfig` construction-time knobs,
//! and the `Vm` instruction-dispatch loop itself.

mod config;
mod exec;
mod vthread;

pub use config::VmConfig;
pub use exec::Vm;
pub use vthread::{VThread, VmRegs, VmStack};
