//! Output module: mode detection and build reporters.
//!
//! 1. **Detection** (`detection`): styled, plain or JSON, based on flags,
//!    config, environment and whether stdout is a terminal.
//! 2. **Reporters** (`reporter`): receive pipeline events and render them in
//!    the selected mode.
//! 3. **Robot envelopes** (`robot`): the JSON shape used for both results and
//!    fatal errors in robot mode.

pub mod detection;
pub mod reporter;
pub mod robot;

pub use detection::{
    OutputDecision, OutputDecisionReason, OutputDetector, OutputEnvironment, OutputMode,
    OutputRequest,
};
pub use reporter::{reporter_for, HumanReporter, JsonReporter, NullReporter, Reporter};
pub use robot::{emit_json, robot_error, robot_ok, RobotResponse, RobotStatus};
