//! Prelude module for convenient imports.
//!
//! ```rust
//! use mcpmount::prelude::*;
//!
//! let server = Server::new("docs");
//! server.prompt(Prompt::new("summary"), |_args, _ctx| async {
//!     Ok(GetPromptResult::user("Summarize the page."))
//! });
//! assert_eq!(server.components(ComponentKind::Prompt).len(), 1);
//! ```
//!
//! Brings in the component types and errors from `mcpmount-core`, the
//! server with its import/mount options and lifespan trait, and the
//! transport trait.

// Core types
pub use mcpmount_core::prelude::*;

// Server types
pub use mcpmount_server::prelude::*;
pub use mcpmount_server::MountId;

// Transport types
pub use mcpmount_transport::{MemoryTransport, Transport};
