//! MCP component types: tools, resources, resource templates, prompts.
//!
//! These are the four kinds of component a server exposes and that
//! composition prefixes, copies and forwards.

pub mod content;
pub mod prompt;
pub mod resource;
pub mod tool;

pub use content::*;
pub use prompt::*;
pub use resource::*;
pub use tool::*;
