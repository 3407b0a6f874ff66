use crate::error::Result;
use crate::path_buffer::PathBuffer;

/// Process-wide mutable state for a single serialize or deserialize run:
/// the current filesystem location and the clobber flag (`spec.md` §5,
/// "Shared resources"). Gathered into one value with a single owner instead
/// of module-scope globals, per `spec.md` §9's reimplementation guidance.
#[derive(Debug)]
pub struct RunContext {
    pub path: PathBuffer,
    pub clobber: bool,
}

impl RunContext {
    /// `base` is the directory the whole run is rooted at: the tree being
    /// serialized, or the (already-existing) directory deserialization
    /// reconstructs into.
    pub fn new(base: &[u8], clobber: bool) -> Result<Self> {
        Ok(RunContext {
            path: PathBuffer::init(base)?,
            clobber,
        })
    }
}
