mod format;
mod interface;
mod memory;

pub use format::*;
pub use interface::*;
pub use memory::*;
