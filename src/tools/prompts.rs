//! Prompt templates for agents driving a mixing session.
//!
//! | Prompt | Arguments |
//! |--------|-----------|
//! | `setup_mixing_session` | `num_tracks` (default 8) |
//! | `create_track_template` | `track_type` (required), `genre` |
//! | `optimize_track_settings` | `track_type` (required), `problem` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Prompt
// ============================================================================

/// A known prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Balanced mix template with sends, monitoring and a mastering chain.
    SetupMixingSession,
    /// Devices and settings for one kind of track.
    CreateTrackTemplate,
    /// Fixing a sound problem on one kind of track.
    OptimizeTrackSettings,
}

impl Prompt {
    /// Every prompt, in listing order.
    pub const ALL: [Self; 3] = [
        Self::SetupMixingSession,
        Self::CreateTrackTemplate,
        Self::OptimizeTrackSettings,
    ];

    /// Looks a prompt up by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown name.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|prompt| prompt.name() == name)
            .ok_or_else(|| Error::invalid_argument(format!("Unknown prompt: {name}")))
    }

    /// Wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SetupMixingSession => "setup_mixing_session",
            Self::CreateTrackTemplate => "create_track_template",
            Self::OptimizeTrackSettings => "optimize_track_settings",
        }
    }

    /// Listing entry.
    #[must_use]
    pub fn info(self) -> PromptInfo {
        let (description, arguments) = match self {
            Self::SetupMixingSession => (
                "Set up a new mixing session with default settings",
                vec![argument("num_tracks", "Number of tracks to create", false)],
            ),
            Self::CreateTrackTemplate => (
                "Create a track template with specific devices and settings",
                vec![
                    argument("track_type", "Type of track (e.g., drums, bass, vocals)", true),
                    argument("genre", "Musical genre for optimizing presets", false),
                ],
            ),
            Self::OptimizeTrackSettings => (
                "Get recommendations for optimizing track settings",
                vec![
                    argument("track_type", "Type of track (e.g., drums, bass, vocals)", true),
                    argument(
                        "problem",
                        "Specific problem to address (e.g., muddy, harsh, thin)",
                        false,
                    ),
                ],
            ),
        };

        PromptInfo {
            name: self.name(),
            description,
            arguments,
        }
    }

    /// Fills the template with `arguments`, a JSON object or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `arguments` is not an object or
    /// a required argument is missing.
    pub fn render(self, arguments: &Value) -> Result<PromptMessage> {
        let empty = Map::new();
        let arguments = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_argument(format!(
                    "{}: arguments must be an object, got {other}",
                    self.name()
                )));
            }
        };

        for required in self.info().arguments.iter().filter(|a| a.required) {
            if !arguments.contains_key(required.name) {
                return Err(Error::invalid_argument(format!(
                    "{}: missing argument {}",
                    self.name(),
                    required.name
                )));
            }
        }

        let get = |name: &str, default: &str| {
            arguments.get(name).map_or_else(
                || default.to_string(),
                |value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                },
            )
        };

        let text = match self {
            Self::SetupMixingSession => format!(
                "I want to set up a new mixing session in Bitwig Studio.\n\n\
                 Here's what I need help with:\n\
                 1. Creating a balanced mix template with {} tracks\n\
                 2. Setting up appropriate sends for reverb and delay\n\
                 3. Configuring monitor output and gain staging\n\
                 4. Setting up basic mastering chain on the master track\n\n\
                 Can you help me set this up step by step?",
                get("num_tracks", "8")
            ),
            Self::CreateTrackTemplate => format!(
                "I need to create a template for a {} track in Bitwig Studio for {} music.\n\n\
                 Please help me with:\n\
                 1. What devices should I add to this track type?\n\
                 2. What settings and parameters would work well for this type of track?\n\
                 3. How should I set up the routing and monitoring?\n\
                 4. Are there any specific EQ or compression settings that would work well?\n\n\
                 Can you provide detailed step-by-step guidance?",
                get("track_type", ""),
                get("genre", "general")
            ),
            Self::OptimizeTrackSettings => format!(
                "I'm having issues with my {} track in Bitwig Studio. \
                 The specific problem is that it sounds {}.\n\n\
                 Can you help me:\n\
                 1. Identify common causes for this issue with this type of track\n\
                 2. Suggest parameter adjustments for EQ, compression, and other processing\n\
                 3. Recommend specific Bitwig devices and settings to address the problem\n\
                 4. Propose a step-by-step approach to fix the issue\n\n\
                 Please give me detailed settings I can try.",
                get("track_type", ""),
                get("problem", "general balance")
            ),
        };

        Ok(PromptMessage { role: "user", text })
    }
}

// ============================================================================
// Listing And Rendering Types
// ============================================================================

/// One declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Rendering fails without it.
    pub required: bool,
}

/// Listing entry for one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptInfo {
    /// Wire name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Declared arguments.
    pub arguments: Vec<PromptArgument>,
}

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// Always `user`.
    pub role: &'static str,
    /// Filled-in text.
    pub text: String,
}

const fn argument(
    name: &'static str,
    description: &'static str,
    required: bool,
) -> PromptArgument {
    PromptArgument {
        name,
        description,
        required,
    }
}

/// Lists every prompt.
#[must_use]
pub fn list_prompts() -> Vec<PromptInfo> {
    Prompt::ALL.into_iter().map(Prompt::info).collect()
}

/// Looks up `name` and renders it with `arguments`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an unknown prompt or bad
/// arguments.
pub fn render_prompt(name: &str, arguments: &Value) -> Result<PromptMessage> {
    Prompt::parse(name)?.render(arguments)
}

// ============================================================================
// Tests
// ============================================================================
