mod param;
pub use param::ParamValue;

mod params;
pub use params::{Param, Parameters};

mod extras;
pub use extras::Extras;

mod constants;
pub use constants::{ENTRY_POINT_EOS, ENTRY_POINT_INIT_LAPW, EXTRA_CONFIGURATION, EXTRA_ELEMENT};

/// Identifier of a node known to the workflow engine (code, computer, file, job).
pub type NodeId = uuid::Uuid;
