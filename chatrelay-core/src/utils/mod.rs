pub mod ids;
pub mod time;

pub use self::ids::new_session_id;
pub use self::time::{format_timestamp, now_local, now_local_timestamp, parse_timestamp};
