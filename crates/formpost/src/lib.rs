#![doc = include_str!("../README.md")]

mod allocator;
mod config;
mod error;
mod extract;
mod handler;
mod layout;
mod media;
mod notify;
mod post;
mod store;
mod target;
mod time;

pub use crate::allocator::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::extract::*;
pub use crate::handler::*;
pub use crate::layout::*;
pub use crate::media::*;
pub use crate::notify::*;
pub use crate::post::*;
pub use crate::store::*;
pub use crate::target::*;
pub use crate::time::*;
