pub use self::{error::*, helpers::*, structs_and_traits::*};

mod error;
pub mod helpers;
mod io;
mod structs_and_traits;
mod sumstats;
#[cfg(test)]
pub mod simulate;
