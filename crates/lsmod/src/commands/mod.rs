mod check;
mod config;
mod entries;
mod extract;
mod info;
mod mods;
mod order;

pub use check::*;
pub use config::*;
pub use entries::*;
pub use extract::*;
pub use info::*;
pub use order::*;
