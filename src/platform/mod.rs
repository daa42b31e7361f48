mod directory;

pub use directory::{FsLockDirectory, LockDirectory};
