//! CLI command implementations

pub mod config;
pub mod env;
pub mod exec;
pub mod fetch;
pub mod info;
pub mod install;
pub mod status;

pub use config::execute as config;
pub use env::execute as env;
pub use exec::execute as exec;
pub use fetch::execute as fetch;
pub use info::execute as info;
pub use install::execute as install;
pub use status::execute as status;
