pub mod revision;
pub mod turn;

pub use revision::*;
pub use turn::*;
