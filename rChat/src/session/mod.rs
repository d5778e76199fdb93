//! Session persistence.

mod file;
mod memory;
mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::{SessionProvider, SessionStore};
