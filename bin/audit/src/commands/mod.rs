//! Subcommands of the CLI.

mod verify;
pub use verify::{SeverityThreshold, VerifyCommand};

mod find_rollups;
pub use find_rollups::FindRollupsCommand;
