pub mod workout;

pub use workout::*;
