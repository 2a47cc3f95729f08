//! Output mode detection.
//!
//! Robot mode always produces JSON, and anything not attached to a terminal
//! stays plain unless styling is forced.
//!
//! All detection decisions are traced:
//! - `TRACE`: individual environment variable checks
//! - `DEBUG`: detection inputs
//! - `INFO`: final decision with reason

use std::io::IsTerminal;

use serde::Serialize;
use tracing::{debug, info, trace};

/// How reporter output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Styled,
    Plain,
    Json,
}

/// Why the output mode was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputDecisionReason {
    /// `--robot` was set.
    RobotMode,
    /// `--plain` or `--color never`.
    PlainFlag,
    /// `--color always`.
    ColorAlways,
    /// NO_COLOR disables all styling.
    EnvNoColor,
    /// REPOGEN_PLAIN_OUTPUT forces plain output.
    EnvPlainOutput,
    /// `output.styled = false` in the config.
    ConfigPlain,
    /// REPOGEN_FORCE_STYLED forces styled output.
    ForcedStyled,
    /// Output is not a terminal (piped/redirected).
    NotTerminal,
    /// Default: human output on a terminal.
    HumanDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputDecision {
    pub mode: OutputMode,
    pub reason: OutputDecisionReason,
}

impl OutputDecision {
    const fn new(mode: OutputMode, reason: OutputDecisionReason) -> Self {
        Self { mode, reason }
    }

    #[must_use]
    pub const fn is_styled(&self) -> bool {
        matches!(self.mode, OutputMode::Styled)
    }
}

/// Environment snapshot used for output detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputEnvironment {
    pub no_color: bool,
    pub plain_output: bool,
    pub force_styled: bool,
    pub stdout_is_terminal: bool,
}

impl OutputEnvironment {
    /// Capture output-related environment flags and terminal state.
    #[must_use]
    pub fn from_env() -> Self {
        let env = Self {
            no_color: env_flag("NO_COLOR"),
            plain_output: env_flag("REPOGEN_PLAIN_OUTPUT"),
            force_styled: env_flag("REPOGEN_FORCE_STYLED"),
            stdout_is_terminal: std::io::stdout().is_terminal(),
        };
        trace!(
            no_color = env.no_color,
            plain_output = env.plain_output,
            force_styled = env.force_styled,
            stdout_is_terminal = env.stdout_is_terminal,
            "Captured output environment"
        );
        env
    }
}

/// What the command line and config asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRequest {
    pub robot: bool,
    pub force_plain: bool,
    pub force_styled: bool,
    /// `output.styled` from the config.
    pub config_styled: bool,
}

impl Default for OutputRequest {
    fn default() -> Self {
        Self {
            robot: false,
            force_plain: false,
            force_styled: false,
            config_styled: true,
        }
    }
}

/// Decides between styled, plain and JSON output.
pub struct OutputDetector {
    request: OutputRequest,
    env: OutputEnvironment,
}

impl OutputDetector {
    /// Create a detector from the current environment.
    #[must_use]
    pub fn new(request: OutputRequest) -> Self {
        Self::with_env(request, OutputEnvironment::from_env())
    }

    /// Create a detector with an explicit environment snapshot.
    #[must_use]
    pub const fn with_env(request: OutputRequest, env: OutputEnvironment) -> Self {
        Self { request, env }
    }

    #[must_use]
    pub fn decide(&self) -> OutputDecision {
        debug!(request = ?self.request, env = ?self.env, "Starting output detection");

        let decision = self.evaluate();
        info!(mode = ?decision.mode, reason = ?decision.reason, "Output mode selected");
        decision
    }

    const fn evaluate(&self) -> OutputDecision {
        use OutputDecisionReason as Reason;
        use OutputMode::{Json, Plain, Styled};

        if self.request.robot {
            return OutputDecision::new(Json, Reason::RobotMode);
        }
        // CLI flags beat environment and config.
        if self.request.force_plain {
            return OutputDecision::new(Plain, Reason::PlainFlag);
        }
        if self.request.force_styled {
            return OutputDecision::new(Styled, Reason::ColorAlways);
        }
        if self.env.no_color {
            return OutputDecision::new(Plain, Reason::EnvNoColor);
        }
        if self.env.plain_output {
            return OutputDecision::new(Plain, Reason::EnvPlainOutput);
        }
        if !self.request.config_styled {
            return OutputDecision::new(Plain, Reason::ConfigPlain);
        }
        if self.env.force_styled {
            return OutputDecision::new(Styled, Reason::ForcedStyled);
        }
        if !self.env.stdout_is_terminal {
            return OutputDecision::new(Plain, Reason::NotTerminal);
        }
        OutputDecision::new(Styled, Reason::HumanDefault)
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var_os(key).is_some_and(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERMINAL: OutputEnvironment = OutputEnvironment {
        no_color: false,
        plain_output: false,
        force_styled: false,
        stdout_is_terminal: true,
    };

    fn decide(request: OutputRequest, env: OutputEnvironment) -> OutputDecision {
        OutputDetector::with_env(request, env).decide()
    }

    #[test]
    fn terminal_defaults_to_styled() {
        let decision = decide(OutputRequest::default(), TERMINAL);
        assert_eq!(decision.mode, OutputMode::Styled);
        assert_eq!(decision.reason, OutputDecisionReason::HumanDefault);
    }

    #[test]
    fn robot_wins_over_everything() {
        let request = OutputRequest {
            robot: true,
            force_styled: true,
            ..OutputRequest::default()
        };
        assert_eq!(decide(request, TERMINAL).mode, OutputMode::Json);
    }

    #[test]
    fn pipes_are_plain_unless_forced() {
        let piped = OutputEnvironment {
            stdout_is_terminal: false,
            ..TERMINAL
        };
        assert_eq!(
            decide(OutputRequest::default(), piped).reason,
            OutputDecisionReason::NotTerminal
        );

        let forced = OutputEnvironment {
            force_styled: true,
            ..piped
        };
        assert!(decide(OutputRequest::default(), forced).is_styled());
    }

    #[test]
    fn no_color_and_config_disable_styling() {
        let env = OutputEnvironment {
            no_color: true,
            ..TERMINAL
        };
        assert_eq!(
            decide(OutputRequest::default(), env).reason,
            OutputDecisionReason::EnvNoColor
        );

        let request = OutputRequest {
            config_styled: false,
            ..OutputRequest::default()
        };
        assert_eq!(
            decide(request, TERMINAL).reason,
            OutputDecisionReason::ConfigPlain
        );
    }

    #[test]
    fn cli_flags_beat_environment() {
        let env = OutputEnvironment {
            no_color: true,
            ..TERMINAL
        };
        let request = OutputRequest {
            force_styled: true,
            ..OutputRequest::default()
        };
        assert!(decide(request, env).is_styled());

        let request = OutputRequest {
            force_plain: true,
            force_styled: true,
            ..OutputRequest::default()
        };
        assert_eq!(decide(request, env).reason, OutputDecisionReason::PlainFlag);
    }
}
