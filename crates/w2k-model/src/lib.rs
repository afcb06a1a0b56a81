mod domain;
pub use domain::{ENTRY_POINT_EOS, ENTRY_POINT_INIT_LAPW, EXTRA_CONFIGURATION, EXTRA_ELEMENT};
pub use domain::{Extras, NodeId, Param, ParamValue, Parameters};

mod error;
pub use error::{ModelError, ModelResult};

mod calc;
pub use calc::{CalcInfo, CodeInfo, ExitCode, LocalCopy, RemoteCopy};
pub use calc::{EXIT_MISSING_OUTPUT_FILES, LABEL_MISSING_OUTPUT_FILES};

mod node;
pub use node::{Code, Computer, RemoteFolder, SinglefileData};

mod resources;
pub use resources::Resources;

mod state;
pub use state::{JobHandle, ProcessState};

mod structure;
pub use structure::{Site, Structure};

mod workflow;
pub use workflow::{EosCodes, EosInputs};

mod submission;
pub use submission::{CalcInputs, Submission};
