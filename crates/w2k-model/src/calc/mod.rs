mod info;
pub use info::{CalcInfo, CodeInfo, LocalCopy, RemoteCopy};

mod exit;
pub use exit::{EXIT_MISSING_OUTPUT_FILES, ExitCode, LABEL_MISSING_OUTPUT_FILES};
