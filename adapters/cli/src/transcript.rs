#![allow(clippy::missing_errors_doc)]

//! Single-line round transcripts for sharing and replaying finished rounds.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use trailgrid_core::{AgentId, CellCoord, Direction, GameMode, RoundOutcome};

const TRANSCRIPT_DOMAIN: &str = "trail";
const TRANSCRIPT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded transcript payload.
pub(crate) const TRANSCRIPT_HEADER: &str = "trail:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Complete record of a round: configuration, per-tick intents, and outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct RoundTranscript {
    /// Number of grid columns the round was played on.
    pub columns: u32,
    /// Number of grid rows the round was played on.
    pub rows: u32,
    /// Ruleset the round used.
    pub mode: GameMode,
    /// Starvation frame budget, when forage mode enforced one.
    pub max_frames: Option<u32>,
    /// Seed that drove the food spawner.
    pub rng_seed: u64,
    /// Starting cell and heading for every agent, in identifier order.
    pub agents: Vec<TranscriptAgent>,
    /// Heading intents delivered before each tick, in tick order.
    pub ticks: Vec<TickIntents>,
    /// Terminal classification, absent when the run hit its tick cap.
    pub outcome: Option<RoundOutcome>,
}

impl RoundTranscript {
    /// Encodes the transcript into a single-line string.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableTranscript {
            mode: self.mode,
            max_frames: self.max_frames,
            rng_seed: self.rng_seed,
            agents: self.agents.clone(),
            ticks: self.ticks.clone(),
            outcome: self.outcome.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("transcript serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{TRANSCRIPT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a transcript from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, TranscriptError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TranscriptError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(TranscriptError::MissingPrefix)?;
        let version = parts.next().ok_or(TranscriptError::MissingVersion)?;
        let dimensions = parts.next().ok_or(TranscriptError::MissingDimensions)?;
        let payload = parts.next().ok_or(TranscriptError::MissingPayload)?;
        if parts.next().is_some() {
            return Err(TranscriptError::TrailingData);
        }

        if domain != TRANSCRIPT_DOMAIN {
            return Err(TranscriptError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(TranscriptError::InvalidEncoding)?;
        let decoded: SerializableTranscript =
            serde_json::from_slice(&bytes).map_err(TranscriptError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            mode: decoded.mode,
            max_frames: decoded.max_frames,
            rng_seed: decoded.rng_seed,
            agents: decoded.agents,
            ticks: decoded.ticks,
            outcome: decoded.outcome,
        })
    }
}

/// Starting state captured for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TranscriptAgent {
    /// Cell the agent occupied when the round opened.
    pub cell: CellCoord,
    /// Heading the agent held on the first tick.
    pub heading: Direction,
}

/// Heading intents delivered before a single tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TickIntents {
    /// Agent/direction pairs, at most one entry per agent.
    pub intents: Vec<(AgentId, Direction)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableTranscript {
    mode: GameMode,
    max_frames: Option<u32>,
    rng_seed: u64,
    agents: Vec<TranscriptAgent>,
    ticks: Vec<TickIntents>,
    outcome: Option<RoundOutcome>,
}

/// Errors that can occur while decoding transcript strings.
#[derive(Debug)]
pub(crate) enum TranscriptError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded transcript.
    MissingPrefix,
    /// The encoded transcript did not contain a version segment.
    MissingVersion,
    /// The encoded transcript did not include grid dimensions.
    MissingDimensions,
    /// The encoded transcript did not include the payload segment.
    MissingPayload,
    /// The encoded transcript carried segments after the payload.
    TrailingData,
    /// The encoded transcript used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded transcript used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded transcript.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "transcript string was empty"),
            Self::MissingPrefix => write!(f, "transcript string is missing the prefix"),
            Self::MissingVersion => write!(f, "transcript string is missing the version"),
            Self::MissingDimensions => {
                write!(f, "transcript string is missing the grid dimensions")
            }
            Self::MissingPayload => write!(f, "transcript string is missing the payload"),
            Self::TrailingData => {
                write!(f, "transcript string carries data after the payload")
            }
            Self::InvalidPrefix(prefix) => {
                write!(f, "transcript prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "transcript version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode transcript payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse transcript payload: {error}")
            }
        }
    }
}

impl Error for TranscriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), TranscriptError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| TranscriptError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| TranscriptError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| TranscriptError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(TranscriptError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((columns, rows))
}
