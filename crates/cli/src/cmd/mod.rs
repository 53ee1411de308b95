mod generate;
mod install;
mod log;
mod push;
mod release;
mod stage;
mod status;

pub use generate::cmd_generate;
pub use install::cmd_install;
pub use log::cmd_log;
pub use push::cmd_push;
pub use release::cmd_release;
pub use stage::cmd_stage;
pub use status::cmd_status;
