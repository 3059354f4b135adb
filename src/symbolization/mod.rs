//! Module-level symbolication, deferred off the measurement path.
//!
//! Captured stacks are raw instruction pointers. Turning them into
//! something a human (or a backend) can attribute requires knowing which
//! loaded image each address belongs to, without touching the foreground
//! thread that is busy keeping frames on schedule.
//!
//! - **`module_table`**: the one-time map from image load address to
//!   module name, consulted via "greatest base ≤ address" lookup.
//! - **`resolver`**: the serial worker that owns the table, formats
//!   `module:address` stacks, and delivers them to the sink together with
//!   the host binary's slide.

pub mod module_table;
pub mod resolver;

pub use module_table::{ModuleTable, UNKNOWN_MODULE};
pub use resolver::StackResolver;
