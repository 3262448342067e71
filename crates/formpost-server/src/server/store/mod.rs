mod sheets;

pub use sheets::*;
