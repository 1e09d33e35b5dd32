//! Command handlers, one module per subcommand.

pub mod countries;
pub mod generate;
pub mod grid;
pub mod restore;
pub mod serve;
