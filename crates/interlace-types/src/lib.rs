pub mod error;
pub mod timer;
pub mod wid;

pub use error::{AsyncError, ErrorTag, cancel_exn};
pub use timer::{TimerCallback, TimerHost, TimerId};
pub use wid::{Wid, WidAllocator};
