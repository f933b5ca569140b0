pub mod io;

pub use io::{init_env_logger, LOG_PREFIX_INFO};
