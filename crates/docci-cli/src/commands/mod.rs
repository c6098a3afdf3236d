//! Command implementations, one module per subcommand.

pub mod run;
pub mod tags;
pub mod update;
pub mod validate;
pub mod version;
