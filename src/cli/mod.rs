mod commands;
mod handlers;
mod repl;

pub use commands::{Cli, Commands};
pub use handlers::{
    handle_archive, handle_describe, handle_generate, handle_list, handle_new, handle_preview,
    handle_prompt, handle_revise, handle_studio, handle_validate, load_config,
};
pub use repl::Repl;
