//! Instruction pool plus global/platform-proc tables (component C4).
//!
//! [`vmexp::VCode`] is the flat, append-only pool of CPS instruction
//! records the compiler (C6) emits into and the VM (C7) steps through.
//! [`gdef::GlobalTable`] and [`pinvoke::PlatformProcTable`] are owned
//! alongside it, per the design

pub mod gdef;
pub mod pinvoke;
pub mod subr;
pub mod vmexp;

pub use gdef::{GDefId, GlobalDef, GlobalTable};
pub use pinvoke::{ArgView, PlatformProcCb, PlatformProcId, PlatformProcMetadata, PlatformProcTable};
pub use subr::VSubr;
pub use vmexp::{VCode, VmExp, VmExpId};
