
pub mod io;
pub mod machine;
pub mod operations;

pub use io::{Display, FrameSink, Interrupt, NullDisplay, TextDisplay};
pub use machine::{Machine, RuntimeError};
