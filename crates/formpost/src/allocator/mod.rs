mod counter;
mod interface;
mod read_max;
mod strategy;
#[cfg(test)]
mod tests;

pub use counter::*;
pub use interface::*;
pub use read_max::*;
pub use strategy::*;
