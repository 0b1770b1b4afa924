pub use crate::log::init_log;
