pub mod config;
pub mod error;
pub mod ftree;
pub mod subnet;
pub mod topo;

pub use error::{FtreeError, Result};

#[cfg(test)]
mod test;
