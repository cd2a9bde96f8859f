// # Config Store Implementations
//
// Two ConfigStore implementations ship with the core crate:
// - `MemoryConfigStore`: in-memory, for tests and ephemeral deployments
// - `FileConfigStore`: JSON file with atomic writes and backup recovery

mod file;
mod memory;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
