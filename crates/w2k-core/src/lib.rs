pub mod calcjob;
pub mod engine;
pub mod error;
pub mod folder;
pub mod registry;
pub mod throttle;

pub use calcjob::{CalcJob, CalcJobError};
pub use engine::{Engine, EngineError};
pub use error::CoreError;
pub use folder::Folder;
pub use registry::CalcJobRegistry;
pub use throttle::Throttle;

pub mod prelude {
    pub use crate::calcjob::{CalcJob, CalcJobError};
    pub use crate::engine::{Engine, EngineError};
    pub use crate::error::CoreError;
    pub use crate::folder::Folder;
    pub use crate::registry::CalcJobRegistry;
    pub use crate::throttle::Throttle;
}
