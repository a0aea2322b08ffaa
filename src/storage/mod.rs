pub mod atomic;
pub mod jobs;

pub use atomic::AtomicFile;
pub use jobs::{JobStore, LocalJobStore, StoredJob};
