/*!
# Shader Forge

Backend-agnostic core of the shader program composition layer.

Given the reflection records of the shader stages used together in one pipeline,
Shader Forge derives the complete resource-binding contract (binding list, push
constant range, update template layout) so no descriptor layout is written by hand.

## Architecture

- **ShaderReflection**: per-stage metadata (stage, 32-slot binding table, work-group size, push constants)
- **ProgramLayout**: the merged binding contract, built by `ProgramLayout::synthesize`
- **GraphicsState**: fixed-function state consumed by backend pipeline factories
- **Forge**: logging front-end

Backends (see `shader_forge_vulkan`) reflect binaries into `ShaderReflection` and turn
a `ProgramLayout` into live API objects.
*/

mod error;
mod config;
mod engine;
pub mod log;
pub mod program;

#[cfg(test)]
mod test_logger;

// Main namespace module
pub mod forge {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{Config, DescriptorUpdateMode};

    // Logging front-end
    pub use crate::engine::Forge;

    // Logging sub-module (types only; macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Program sub-module with reflection, synthesis and pipeline state types
    pub mod program {
        pub use crate::program::*;
    }
}
