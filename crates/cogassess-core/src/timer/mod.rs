mod clock;
mod countdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use clock::datetime_from_ms;
pub use countdown::{Countdown, CountdownEvent, CountdownTimer, TimerState};
