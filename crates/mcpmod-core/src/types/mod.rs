//! MCP payload types for tools, prompts, resources and content.

pub mod content;
pub mod logging;
pub mod prompt;
pub mod resource;
pub mod tool;

pub use content::*;
pub use logging::*;
pub use prompt::*;
pub use resource::*;
pub use tool::*;
