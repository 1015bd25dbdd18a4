/// Progress update interval (refresh the spinner every N pages)
pub const PROGRESS_INTERVAL: u64 = 100;

/// Default lower bound for a word's count to be written to the output
pub const DEFAULT_MIN_FREQ: u64 = 2;

/// Buffer size for the decompressing input reader
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Buffer size for the frequency list writer
pub const WRITE_BUFFER_SIZE: usize = 128 * 1024;

/// Pages handed to the worker pool at once when running with more than one thread
pub const PAGE_BATCH_SIZE: usize = 512;

/// Namespace names rewritten to plain links by the category rule
pub const DEFAULT_CATEGORY_PREFIXES: &[&str] = &["Kategori"];

/// Namespace names whose links mark a line as user-page noise
pub const DEFAULT_USER_PREFIXES: &[&str] = &["Användar"];
