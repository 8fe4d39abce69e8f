// growth-path-core/src/core/path.rs
// ============================================================================
// Module: Growth Path Specification
// Description: Raw path configuration and compiled path/station specs.
// Purpose: Compile host-parsed content blocks into validated, typed specs.
// Dependencies: crate::core::{condition, identifiers, rewards},
// growth-path-logic, serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Hosts assemble a [`PathConfig`] from nested content blocks at render time:
//! raw attribute strings, exactly as authored. [`PathSpec::compile`] turns
//! that into a validated specification with every string-encoded
//! mini-language (unlock clauses, reward pairs, actor lists) parsed exactly
//! once. Compiled specs are plain data; the runtime never mutates them.
//!
//! Path definitions have no durable identity across requests, so the compiled
//! spec carries a canonical content hash as its render-instance identifier:
//! the same content always compiles to the same instance identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use growth_path_logic::Condition;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::condition::ConditionParseError;
use crate::core::condition::ConditionRelation;
use crate::core::condition::UnlockClause;
use crate::core::condition::compile_expression;
use crate::core::identifiers::FlagName;
use crate::core::identifiers::NodeId;
use crate::core::identifiers::PathInstanceId;
use crate::core::rewards::RewardAction;
use crate::core::rewards::RewardParseError;
use crate::core::rewards::compile_rewards_spec;

// ============================================================================
// SECTION: Mission Kind
// ============================================================================

/// Activity type tag routed to the external mission renderer.
///
/// Opaque to the engine beyond routing, with one exception: the legacy kinds
/// [`MissionKind::Flag`] and [`MissionKind::Mission`] accept a set flag named
/// by the mission target as completion evidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MissionKind {
    /// Simple acknowledge button.
    ButtonClick,
    /// Embedded form activity.
    Form,
    /// Quiz activity.
    Quiz,
    /// Legacy flag-evidence activity.
    Flag,
    /// Legacy generic mission with flag evidence.
    Mission,
    /// Any other activity type, passed through to the renderer untouched.
    Other(String),
}

impl MissionKind {
    /// Returns the stable string tag for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ButtonClick => "button_click",
            Self::Form => "gform",
            Self::Quiz => "quiz",
            Self::Flag => "flag",
            Self::Mission => "mission",
            Self::Other(tag) => tag,
        }
    }

    /// Returns `true` when a set flag named by the mission target counts as
    /// completion evidence for this kind.
    #[must_use]
    pub const fn uses_flag_evidence(&self) -> bool {
        matches!(self, Self::Flag | Self::Mission)
    }
}

impl From<String> for MissionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "button_click" => Self::ButtonClick,
            "gform" => Self::Form,
            "quiz" => Self::Quiz,
            "flag" => Self::Flag,
            "mission" => Self::Mission,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for MissionKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<MissionKind> for String {
    fn from(kind: MissionKind) -> Self {
        kind.as_str().to_string()
    }
}

// ============================================================================
// SECTION: Unlock Trigger
// ============================================================================

/// Station unlock trigger policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockTrigger {
    /// Unlocks when the previous sequential station is completed.
    Sequential,
    /// Unlocks independently of the surrounding sequence.
    Independent,
}

impl UnlockTrigger {
    /// Parses a trigger attribute string; empty means sequential.
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError::UnknownUnlockTrigger`] for any other value.
    fn parse(value: &str) -> Result<Self, PathSpecError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "sequential" => Ok(Self::Sequential),
            "independent" => Ok(Self::Independent),
            other => Err(PathSpecError::UnknownUnlockTrigger(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Display Mode
// ============================================================================

/// Presentation mode for a rendered path.
///
/// Purely presentational; the engine carries it through to the presentation
/// layer without interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Vertical timeline rendering.
    Timeline,
    /// Card grid rendering.
    Grid,
    /// Compact list rendering.
    List,
}

impl DisplayMode {
    /// Parses a display-mode attribute string; empty means timeline.
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError::UnknownDisplayMode`] for any other value.
    fn parse(value: &str) -> Result<Self, PathSpecError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "timeline" => Ok(Self::Timeline),
            "grid" => Ok(Self::Grid),
            "list" => Ok(Self::List),
            other => Err(PathSpecError::UnknownDisplayMode(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Actor Classes
// ============================================================================

/// Class of acting identity permitted to submit a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClass {
    /// The target user acting for themselves.
    #[serde(rename = "self")]
    TargetSelf,
    /// The target's assigned coach.
    Coach,
    /// Any other authenticated user.
    Users,
    /// Anonymous visitors.
    Guests,
}

impl ActorClass {
    /// Parses a single actor-class token.
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError::UnknownActorClass`] for any other value.
    fn parse(value: &str) -> Result<Self, PathSpecError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self" => Ok(Self::TargetSelf),
            "coach" => Ok(Self::Coach),
            "users" => Ok(Self::Users),
            "guests" => Ok(Self::Guests),
            other => Err(PathSpecError::UnknownActorClass(other.to_string())),
        }
    }

    /// Parses a comma-separated actor whitelist; empty means `self` only.
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError::UnknownActorClass`] when a token is not
    /// recognized.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, PathSpecError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(vec![Self::TargetSelf]);
        }
        let mut classes = Vec::new();
        for token in trimmed.split(',') {
            let class = Self::parse(token)?;
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        Ok(classes)
    }
}

// ============================================================================
// SECTION: Raw Configuration
// ============================================================================

/// Raw path configuration as parsed from nested content blocks.
///
/// Attribute values are carried verbatim; compilation parses and validates
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Display title for the path.
    #[serde(default)]
    pub title: String,
    /// Raw display-mode attribute (`timeline` / `grid` / `list`).
    #[serde(default)]
    pub display_mode: String,
    /// Raw station configurations in authored order.
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

/// Raw station configuration as parsed from one content block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Explicit station identifier attribute, if authored.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Display title for the station.
    #[serde(default)]
    pub title: String,
    /// Optional icon reference.
    #[serde(default)]
    pub icon: Option<String>,
    /// Raw unlock-trigger attribute (`sequential` / `independent`).
    #[serde(default)]
    pub unlock_trigger: String,
    /// Raw mission-type tag.
    #[serde(default)]
    pub mission_kind: String,
    /// Raw mission target payload for the activity renderer.
    #[serde(default)]
    pub mission_target: Option<String>,
    /// Raw rewards-spec string (`type:value` pairs joined by `|`).
    #[serde(default)]
    pub rewards: String,
    /// Flag set when this station completes, if any.
    #[serde(default)]
    pub sets_flag: Option<String>,
    /// Raw unlock-condition expression.
    #[serde(default)]
    pub unlock_condition: String,
    /// Raw relation attribute combining condition clauses (`and` / `or`).
    #[serde(default)]
    pub unlock_relation: String,
    /// Companion value for `user_meta_key` clauses.
    #[serde(default)]
    pub unlock_meta_value: Option<String>,
    /// Flag gating whether the station is shown at all.
    #[serde(default)]
    pub visibility_flag: Option<String>,
    /// Raw comma-separated actor whitelist.
    #[serde(default)]
    pub allowed_actors: String,
    /// Quorum of accepted submissions required to fulfil the mission.
    #[serde(default)]
    pub required_submissions: Option<u32>,
    /// Whether fulfilment waits for explicit coach approval.
    #[serde(default)]
    pub requires_approval: bool,
}

// ============================================================================
// SECTION: Compiled Specification
// ============================================================================

/// Compiled, validated path specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSpec {
    /// Render-instance identifier derived from the content hash.
    pub instance_id: PathInstanceId,
    /// Display title for the path.
    pub title: String,
    /// Presentation mode.
    pub display_mode: DisplayMode,
    /// Compiled stations in authored order.
    pub stations: Vec<StationSpec>,
}

/// Compiled, validated station specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSpec {
    /// Stable station identifier.
    pub node_id: NodeId,
    /// Display title for the station.
    pub title: String,
    /// Optional icon reference.
    pub icon: Option<String>,
    /// Unlock trigger policy.
    pub unlock_trigger: UnlockTrigger,
    /// Activity type tag.
    pub mission_kind: MissionKind,
    /// Mission target payload for the activity renderer.
    pub mission_target: Option<String>,
    /// Reward actions dispatched on completion.
    pub rewards: Vec<RewardAction>,
    /// Flag set when this station completes, if any.
    pub sets_flag: Option<FlagName>,
    /// Compiled unlock condition; the empty tree means no gating.
    pub unlock_condition: Condition<UnlockClause>,
    /// Flag gating whether the station is shown at all.
    pub visibility_flag: Option<FlagName>,
    /// Actor classes permitted to submit this station's mission.
    pub allowed_actors: Vec<ActorClass>,
    /// Quorum of accepted submissions required to fulfil the mission.
    pub required_submissions: u32,
    /// Whether fulfilment waits for explicit coach approval.
    pub requires_approval: bool,
}

impl StationSpec {
    /// Returns the flag that serves as legacy completion evidence, if this
    /// station's mission kind uses flag evidence and a target is present.
    #[must_use]
    pub fn evidence_flag(&self) -> Option<FlagName> {
        if self.mission_kind.uses_flag_evidence() {
            self.mission_target.as_deref().map(FlagName::from)
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Path compilation and validation errors.
#[derive(Debug, Error)]
pub enum PathSpecError {
    /// Path configuration contains no stations.
    #[error("path must define at least one station")]
    MissingStations,
    /// Duplicate station identifiers detected.
    #[error("duplicate station identifier: {0}")]
    DuplicateNodeId(String),
    /// Unlock trigger attribute is not recognized.
    #[error("unknown unlock trigger: {0:?}")]
    UnknownUnlockTrigger(String),
    /// Display mode attribute is not recognized.
    #[error("unknown display mode: {0:?}")]
    UnknownDisplayMode(String),
    /// Actor class token is not recognized.
    #[error("unknown actor class: {0:?}")]
    UnknownActorClass(String),
    /// Required submissions must be at least one.
    #[error("station {0} requires a submission quorum of at least 1")]
    InvalidQuorum(String),
    /// A flag-evidence mission kind has no mission target.
    #[error("station {0} uses flag evidence but has no mission target")]
    MissingEvidenceTarget(String),
    /// Unlock condition failed to compile.
    #[error(transparent)]
    Condition(#[from] ConditionParseError),
    /// Rewards spec failed to compile.
    #[error(transparent)]
    Rewards(#[from] RewardParseError),
    /// The compiled content could not be canonicalized for identity.
    #[error("failed to derive path instance identity: {0}")]
    InstanceIdentity(String),
}

// ============================================================================
// SECTION: Compilation
// ============================================================================

/// Serializable identity view over compiled path content.
///
/// Everything that affects gating or rendering participates in the identity;
/// transient request state never does.
#[derive(Serialize)]
struct IdentityView<'a> {
    /// Display title for the path.
    title: &'a str,
    /// Presentation mode.
    display_mode: DisplayMode,
    /// Compiled stations.
    stations: &'a [StationSpec],
}

impl PathSpec {
    /// Compiles a raw path configuration into a validated specification.
    ///
    /// Every string-encoded mini-language is parsed here, exactly once.
    /// Stations without an explicit identifier receive a deterministic
    /// index-based fallback.
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError`] when the configuration is empty, contains
    /// duplicate station identifiers, or any attribute fails to parse.
    pub fn compile(config: &PathConfig) -> Result<Self, PathSpecError> {
        if config.stations.is_empty() {
            return Err(PathSpecError::MissingStations);
        }

        let display_mode = DisplayMode::parse(&config.display_mode)?;
        let mut stations = Vec::with_capacity(config.stations.len());
        for (index, station) in config.stations.iter().enumerate() {
            stations.push(compile_station(station, index)?);
        }
        ensure_unique_node_ids(&stations)?;

        let title = config.title.trim().to_string();
        let instance_id = derive_instance_id(&title, display_mode, &stations)?;

        Ok(Self {
            instance_id,
            title,
            display_mode,
            stations,
        })
    }

    /// Validates invariants of a specification built outside of
    /// [`PathSpec::compile`].
    ///
    /// # Errors
    ///
    /// Returns [`PathSpecError`] when stations are missing, identifiers
    /// collide, or a quorum is zero.
    pub fn validate(&self) -> Result<(), PathSpecError> {
        if self.stations.is_empty() {
            return Err(PathSpecError::MissingStations);
        }
        ensure_unique_node_ids(&self.stations)?;
        for station in &self.stations {
            if station.required_submissions == 0 {
                return Err(PathSpecError::InvalidQuorum(station.node_id.to_string()));
            }
        }
        Ok(())
    }
}

/// Derives the render-instance identifier from compiled path content.
///
/// Paths are reassembled from authored content on every render and have no
/// persisted identity of their own, so the identifier is the content itself:
/// the compiled path is serialized to canonical (RFC 8785) JSON and folded
/// through SHA-256. Identical content therefore resolves to an identical
/// instance across requests and hosts; any change to a station changes the
/// identity.
fn derive_instance_id(
    title: &str,
    display_mode: DisplayMode,
    stations: &[StationSpec],
) -> Result<PathInstanceId, PathSpecError> {
    let view = IdentityView {
        title,
        display_mode,
        stations,
    };
    let canonical = serde_jcs::to_vec(&view)
        .map_err(|err| PathSpecError::InstanceIdentity(err.to_string()))?;
    let digest = Sha256::digest(&canonical);
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(PathInstanceId::new(hex))
}

/// Compiles one raw station configuration.
fn compile_station(config: &StationConfig, index: usize) -> Result<StationSpec, PathSpecError> {
    let node_id = config
        .node_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| NodeId::new(format!("station-{}", index + 1)), NodeId::from);

    let mission_kind = MissionKind::from(config.mission_kind.trim());
    let mission_kind = if mission_kind.as_str().is_empty() {
        MissionKind::ButtonClick
    } else {
        mission_kind
    };
    let mission_target =
        config.mission_target.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(String::from);
    if mission_kind.uses_flag_evidence() && mission_target.is_none() {
        return Err(PathSpecError::MissingEvidenceTarget(node_id.to_string()));
    }

    let relation = ConditionRelation::parse(&config.unlock_relation)?;
    let unlock_condition = compile_expression(
        &config.unlock_condition,
        relation,
        config.unlock_meta_value.as_deref(),
    )?;

    let required_submissions = config.required_submissions.unwrap_or(1);
    if required_submissions == 0 {
        return Err(PathSpecError::InvalidQuorum(node_id.to_string()));
    }

    Ok(StationSpec {
        node_id,
        title: config.title.trim().to_string(),
        icon: config.icon.as_deref().map(str::trim).filter(|i| !i.is_empty()).map(String::from),
        unlock_trigger: UnlockTrigger::parse(&config.unlock_trigger)?,
        mission_kind,
        mission_target,
        rewards: compile_rewards_spec(&config.rewards)?,
        sets_flag: trimmed_flag(config.sets_flag.as_deref()),
        unlock_condition,
        visibility_flag: trimmed_flag(config.visibility_flag.as_deref()),
        allowed_actors: ActorClass::parse_list(&config.allowed_actors)?,
        required_submissions,
        requires_approval: config.requires_approval,
    })
}

/// Trims an optional flag attribute, discarding empty values.
fn trimmed_flag(value: Option<&str>) -> Option<FlagName> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(FlagName::from)
}

/// Ensures station identifiers are unique within the path.
fn ensure_unique_node_ids(stations: &[StationSpec]) -> Result<(), PathSpecError> {
    for (index, station) in stations.iter().enumerate() {
        if stations.iter().skip(index + 1).any(|other| other.node_id == station.node_id) {
            return Err(PathSpecError::DuplicateNodeId(station.node_id.to_string()));
        }
    }
    Ok(())
}
