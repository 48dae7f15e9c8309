pub mod nics;

pub use nics::{NicInfo, guess_local_ip, list_interfaces};
