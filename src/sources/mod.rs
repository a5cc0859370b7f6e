//! Byte source implementations
//!
//! - [`ReaderSource`] wraps any `std::io::Read`, including an opened serial
//!   device node
//! - [`ReplaySource`] plays back a recorded capture file

pub mod device;
pub mod replay;

pub use device::{ReaderSource, ZeroRead};
pub use replay::ReplaySource;
