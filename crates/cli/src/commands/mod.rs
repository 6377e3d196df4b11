//! Command implementations.

mod check;
mod info;
mod simulate;
mod validate;

pub use check::run_check;
pub use info::run_info;
pub use simulate::run_simulate;
pub use validate::run_validate;
