mod error;
pub use error::ExecError;

mod cli;
pub use cli::cli_options;

mod init_lapw;
pub use init_lapw::{InitLapw, register_wien2k_plugins};
pub use init_lapw::{CASE_DIR, CASE_STRUCT, INIT_LAPW_STDOUT, RETRIEVE_CASE_INPUTS};

#[cfg(feature = "local")]
pub mod local;
