mod actions;
mod check;
mod deps;
mod info;
mod load;
mod plan;
mod variants;

pub use actions::cmd_actions;
pub use check::cmd_check;
pub use deps::cmd_deps;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use variants::cmd_variants;
