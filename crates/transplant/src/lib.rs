//! Captures a directory subtree into a self-describing, depth-tagged byte
//! stream and reconstructs it elsewhere. Carries file identity, type,
//! permission bits, size, and byte-exact contents; no ownership, timestamps,
//! links, devices, or compression. See `SPEC_FULL.md` for the full design.

pub mod context;
pub mod deserialize;
pub mod error;
pub mod fsops;
pub mod path_buffer;
pub mod record;
pub mod serialize;

pub use context::RunContext;
pub use deserialize::deserialize;
pub use error::{Result, TransplantError};
pub use path_buffer::{PathBuffer, NAME_MAX, PATH_MAX};
pub use serialize::serialize;
