pub mod client;
pub mod prompts;

pub use client::*;
pub use prompts::*;

#[cfg(test)]
pub(crate) mod mock;
