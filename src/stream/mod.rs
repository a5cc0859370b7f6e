//! Stream combinators for loop packet subscriptions

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
