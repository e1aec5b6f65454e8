//! Program module - reflection records and binding-contract synthesis

pub mod shader;
pub mod binding_table;
pub mod reflection;
pub mod program_layout;
pub mod pipeline_state;

pub use shader::*;
pub use binding_table::*;
pub use reflection::*;
pub use program_layout::*;
pub use pipeline_state::*;
