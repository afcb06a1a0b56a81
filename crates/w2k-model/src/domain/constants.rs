//! Well-known string keys shared by the plugin, the engine and the driver.

/// Entry point of the `init_lapw` calculation plugin.
pub const ENTRY_POINT_INIT_LAPW: &str = "wien2k.init_lapw";

/// Entry point of the equation-of-state workflow.
///
/// The driver throttles on the number of active processes with this entry point.
pub const ENTRY_POINT_EOS: &str = "wien2k.eos_wf";

/// Extras key holding the chemical element `X` of an oxide structure.
pub const EXTRA_ELEMENT: &str = "element";

/// Extras key holding the oxide configuration (`X2O`, `XO2`, ...).
pub const EXTRA_CONFIGURATION: &str = "configuration";
