//! Wire and domain types shared by the dispatcher, the HTTP layer and the
//! task client.
//!
//! Inbound tasks arrive as a [`TaskMessage`], a loose shape where every field
//! is optional. Converting it into a [`TaskDescription`] is the single
//! validation point: a description is either complete and consistent, or it
//! does not exist.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{EnoError, EnoResult};

/// The five checker lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMethod {
    PutFlag,
    GetFlag,
    PutNoise,
    GetNoise,
    Havoc,
}

impl TaskMethod {
    pub const ALL: [TaskMethod; 5] = [
        TaskMethod::PutFlag,
        TaskMethod::GetFlag,
        TaskMethod::PutNoise,
        TaskMethod::GetNoise,
        TaskMethod::Havoc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskMethod::PutFlag => "putflag",
            TaskMethod::GetFlag => "getflag",
            TaskMethod::PutNoise => "putnoise",
            TaskMethod::GetNoise => "getnoise",
            TaskMethod::Havoc => "havoc",
        }
    }

    /// The chain kind binding a put operation to its later get
    pub fn chain_kind(&self) -> ChainKind {
        match self {
            TaskMethod::PutFlag | TaskMethod::GetFlag => ChainKind::Flag,
            TaskMethod::PutNoise | TaskMethod::GetNoise => ChainKind::Noise,
            TaskMethod::Havoc => ChainKind::Havoc,
        }
    }

    pub fn requires_flag(&self) -> bool {
        matches!(self, TaskMethod::PutFlag | TaskMethod::GetFlag)
    }
}

impl fmt::Display for TaskMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskMethod {
    type Err = EnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EnoError::validation("method", format!("unknown method '{}'", s)))
    }
}

/// Kind component of a task chain id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
    Flag,
    Noise,
    Havoc,
}

impl ChainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Flag => "flag",
            ChainKind::Noise => "noise",
            ChainKind::Havoc => "havoc",
        }
    }
}

/// Correlation key binding a put task and its later get task
///
/// Rendered as `{kind}_s{serviceId}_r{relatedRoundId}_t{teamId}_i{variantId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskChainId {
    pub kind: ChainKind,
    pub service_id: u64,
    pub related_round_id: u64,
    pub team_id: u64,
    pub variant_id: u64,
}

impl TaskChainId {
    pub fn new(
        kind: ChainKind,
        service_id: u64,
        related_round_id: u64,
        team_id: u64,
        variant_id: u64,
    ) -> Self {
        Self {
            kind,
            service_id,
            related_round_id,
            team_id,
            variant_id,
        }
    }
}

impl fmt::Display for TaskChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_s{}_r{}_t{}_i{}",
            self.kind.as_str(),
            self.service_id,
            self.related_round_id,
            self.team_id,
            self.variant_id
        )
    }
}

impl FromStr for TaskChainId {
    type Err = EnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || EnoError::validation("taskChainId", format!("malformed task chain id '{}'", s));

        let (kind, rest) = s.split_once('_').ok_or_else(invalid)?;
        let kind = match kind {
            "flag" => ChainKind::Flag,
            "noise" => ChainKind::Noise,
            "havoc" => ChainKind::Havoc,
            _ => return Err(invalid()),
        };

        let parts: Vec<&str> = rest.split('_').collect();
        let [service, round, team, variant] = parts.as_slice() else {
            return Err(invalid());
        };
        let component = |part: &str, prefix: char| -> EnoResult<u64> {
            part.strip_prefix(prefix)
                .and_then(|digits| digits.parse().ok())
                .ok_or_else(invalid)
        };

        Ok(Self {
            kind,
            service_id: component(*service, 's')?,
            related_round_id: component(*round, 'r')?,
            team_id: component(*team, 't')?,
            variant_id: component(*variant, 'i')?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

/// Task description as it appears on the wire
///
/// Every field is optional here so that a missing field surfaces as a
/// validation error naming the field instead of an opaque decode error.
/// Durations are integer milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    pub task_id: Option<u64>,
    pub method: Option<TaskMethod>,
    pub address: Option<String>,
    pub team_id: Option<u64>,
    pub team_name: Option<String>,
    pub current_round_id: Option<u64>,
    pub related_round_id: Option<u64>,
    pub flag: Option<String>,
    pub variant_id: Option<u64>,
    pub timeout: Option<u64>,
    pub round_length: Option<u64>,
    pub task_chain_id: Option<String>,
}

/// A validated, immutable task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescription {
    task_id: u64,
    method: TaskMethod,
    address: String,
    team: Team,
    current_round_id: u64,
    related_round_id: u64,
    flag: Option<String>,
    variant_id: u64,
    timeout: Duration,
    round_length: Duration,
    task_chain_id: TaskChainId,
}

impl TaskDescription {
    pub fn builder(method: TaskMethod, address: impl Into<String>) -> TaskDescriptionBuilder {
        TaskDescriptionBuilder::new(method, address)
    }

    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    pub fn method(&self) -> TaskMethod {
        self.method
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn current_round_id(&self) -> u64 {
        self.current_round_id
    }

    pub fn related_round_id(&self) -> u64 {
        self.related_round_id
    }

    /// The flag to store or expect; always present for putflag/getflag
    pub fn flag(&self) -> Option<&str> {
        self.flag.as_deref()
    }

    pub fn variant_id(&self) -> u64 {
        self.variant_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn round_length(&self) -> Duration {
        self.round_length
    }

    pub fn task_chain_id(&self) -> &TaskChainId {
        &self.task_chain_id
    }
}

fn required<T>(value: Option<T>, field: &str) -> EnoResult<T> {
    value.ok_or_else(|| EnoError::validation(field, "missing required field"))
}

impl TryFrom<TaskMessage> for TaskDescription {
    type Error = EnoError;

    fn try_from(msg: TaskMessage) -> Result<Self, Self::Error> {
        let task_id = required(msg.task_id, "taskId")?;
        let method = required(msg.method, "method")?;
        let address = required(msg.address, "address")?;
        let team_id = required(msg.team_id, "teamId")?;
        let team_name = required(msg.team_name, "teamName")?;
        let current_round_id = required(msg.current_round_id, "currentRoundId")?;
        let related_round_id = required(msg.related_round_id, "relatedRoundId")?;
        let variant_id = required(msg.variant_id, "variantId")?;
        let timeout = required(msg.timeout, "timeout")?;
        let round_length = required(msg.round_length, "roundLength")?;
        let task_chain_id: TaskChainId = required(msg.task_chain_id, "taskChainId")?.parse()?;

        if address.trim().is_empty() {
            return Err(EnoError::validation("address", "must not be empty"));
        }
        if related_round_id > current_round_id {
            return Err(EnoError::validation(
                "relatedRoundId",
                format!(
                    "related round {} is after current round {}",
                    related_round_id, current_round_id
                ),
            ));
        }
        if method.requires_flag() && msg.flag.as_deref().map_or(true, str::is_empty) {
            return Err(EnoError::validation(
                "flag",
                format!("required for {}", method),
            ));
        }
        if timeout == 0 {
            return Err(EnoError::validation("timeout", "must be positive"));
        }

        if task_chain_id.kind != method.chain_kind() {
            return Err(EnoError::validation(
                "taskChainId",
                format!("kind '{}' does not match method {}", task_chain_id.kind.as_str(), method),
            ));
        }
        if task_chain_id.related_round_id != related_round_id {
            return Err(EnoError::validation(
                "taskChainId",
                format!(
                    "round {} does not match relatedRoundId {}",
                    task_chain_id.related_round_id, related_round_id
                ),
            ));
        }
        if task_chain_id.team_id != team_id {
            return Err(EnoError::validation(
                "taskChainId",
                format!("team {} does not match teamId {}", task_chain_id.team_id, team_id),
            ));
        }

        Ok(Self {
            task_id,
            method,
            address,
            team: Team {
                id: team_id,
                name: team_name,
            },
            current_round_id,
            related_round_id,
            flag: msg.flag,
            variant_id,
            timeout: Duration::from_millis(timeout),
            round_length: Duration::from_millis(round_length),
            task_chain_id,
        })
    }
}

impl From<&TaskDescription> for TaskMessage {
    fn from(task: &TaskDescription) -> Self {
        Self {
            task_id: Some(task.task_id),
            method: Some(task.method),
            address: Some(task.address.clone()),
            team_id: Some(task.team.id),
            team_name: Some(task.team.name.clone()),
            current_round_id: Some(task.current_round_id),
            related_round_id: Some(task.related_round_id),
            flag: task.flag.clone(),
            variant_id: Some(task.variant_id),
            timeout: Some(task.timeout.as_millis() as u64),
            round_length: Some(task.round_length.as_millis() as u64),
            task_chain_id: Some(task.task_chain_id.to_string()),
        }
    }
}

/// Builder for TaskDescription
///
/// Computes the task chain id from its parts and validates through the same
/// path as inbound wire messages.
pub struct TaskDescriptionBuilder {
    message: TaskMessage,
    service_id: u64,
}

impl TaskDescriptionBuilder {
    pub fn new(method: TaskMethod, address: impl Into<String>) -> Self {
        Self {
            message: TaskMessage {
                task_id: Some(0),
                method: Some(method),
                address: Some(address.into()),
                team_id: Some(0),
                team_name: Some(String::new()),
                current_round_id: Some(0),
                related_round_id: Some(0),
                flag: None,
                variant_id: Some(0),
                timeout: Some(10_000),
                round_length: Some(60_000),
                task_chain_id: None,
            },
            service_id: 0,
        }
    }

    pub fn task_id(mut self, id: u64) -> Self {
        self.message.task_id = Some(id);
        self
    }

    pub fn team(mut self, id: u64, name: impl Into<String>) -> Self {
        self.message.team_id = Some(id);
        self.message.team_name = Some(name.into());
        self
    }

    pub fn service_id(mut self, id: u64) -> Self {
        self.service_id = id;
        self
    }

    /// Set current and related round; `related` must not exceed `current`
    pub fn rounds(mut self, current: u64, related: u64) -> Self {
        self.message.current_round_id = Some(current);
        self.message.related_round_id = Some(related);
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.message.flag = Some(flag.into());
        self
    }

    pub fn variant_id(mut self, id: u64) -> Self {
        self.message.variant_id = Some(id);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.message.timeout = Some(timeout.as_millis() as u64);
        self
    }

    pub fn round_length(mut self, round_length: Duration) -> Self {
        self.message.round_length = Some(round_length.as_millis() as u64);
        self
    }

    pub fn build(mut self) -> EnoResult<TaskDescription> {
        let method = required(self.message.method, "method")?;
        let chain = TaskChainId::new(
            method.chain_kind(),
            self.service_id,
            self.message.related_round_id.unwrap_or_default(),
            self.message.team_id.unwrap_or_default(),
            self.message.variant_id.unwrap_or_default(),
        );
        self.message.task_chain_id = Some(chain.to_string());
        TaskDescription::try_from(self.message)
    }
}

/// Result vocabulary reported to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckerResult {
    Ok,
    Mumble,
    Offline,
    InternalError,
}

impl fmt::Display for CheckerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckerResult::Ok => "OK",
            CheckerResult::Mumble => "MUMBLE",
            CheckerResult::Offline => "OFFLINE",
            CheckerResult::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(s)
    }
}

/// One result per task invocation
///
/// `message` is scoreboard-visible and only set for MUMBLE/OFFLINE.
/// `attack_info` is only set on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    pub result: CheckerResult,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attack_info: Option<String>,
}

impl ResultMessage {
    pub fn ok(attack_info: Option<String>) -> Self {
        Self {
            result: CheckerResult::Ok,
            message: None,
            attack_info,
        }
    }

    pub fn mumble(message: impl Into<String>) -> Self {
        Self {
            result: CheckerResult::Mumble,
            message: Some(message.into()),
            attack_info: None,
        }
    }

    pub fn offline(message: Option<String>) -> Self {
        Self {
            result: CheckerResult::Offline,
            message,
            attack_info: None,
        }
    }

    pub fn internal_error() -> Self {
        Self {
            result: CheckerResult::InternalError,
            message: None,
            attack_info: None,
        }
    }
}

/// Static description of a checker, queried once at service registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoMessage {
    pub service_name: String,
    pub flag_variants: u32,
    pub noise_variants: u32,
    pub havoc_variants: u32,
}

impl InfoMessage {
    pub fn new(
        service_name: impl Into<String>,
        flag_variants: u32,
        noise_variants: u32,
        havoc_variants: u32,
    ) -> EnoResult<Self> {
        let info = Self {
            service_name: service_name.into(),
            flag_variants,
            noise_variants,
            havoc_variants,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> EnoResult<()> {
        if self.service_name.is_empty() {
            return Err(EnoError::validation("serviceName", "must not be empty"));
        }
        for (field, count) in [
            ("flagVariants", self.flag_variants),
            ("noiseVariants", self.noise_variants),
            ("havocVariants", self.havoc_variants),
        ] {
            if count == 0 {
                return Err(EnoError::validation(field, "must be at least 1"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn putflag_message() -> TaskMessage {
        TaskMessage {
            task_id: Some(17),
            method: Some(TaskMethod::PutFlag),
            address: Some("10.1.3.1".to_string()),
            team_id: Some(3),
            team_name: Some("teamone".to_string()),
            current_round_id: Some(12),
            related_round_id: Some(12),
            flag: Some("FLAG{abc}".to_string()),
            variant_id: Some(0),
            timeout: Some(5000),
            round_length: Some(60000),
            task_chain_id: Some("flag_s1_r12_t3_i0".to_string()),
        }
    }

    #[test]
    fn test_task_message_uses_camel_case_keys() {
        let json = serde_json::to_value(putflag_message()).unwrap();
        assert_eq!(json["taskId"], 17);
        assert_eq!(json["method"], "putflag");
        assert_eq!(json["relatedRoundId"], 12);
        assert_eq!(json["taskChainId"], "flag_s1_r12_t3_i0");
    }

    #[test]
    fn test_valid_message_converts() {
        let task = TaskDescription::try_from(putflag_message()).unwrap();
        assert_eq!(task.task_id(), 17);
        assert_eq!(task.method(), TaskMethod::PutFlag);
        assert_eq!(task.team().name, "teamone");
        assert_eq!(task.flag(), Some("FLAG{abc}"));
        assert_eq!(task.timeout(), Duration::from_secs(5));
        assert_eq!(task.task_chain_id().service_id, 1);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut msg = putflag_message();
        msg.team_name = None;
        match TaskDescription::try_from(msg) {
            Err(EnoError::Validation { field, .. }) => assert_eq!(field, "teamName"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_flag_optional_for_noise() {
        let mut msg = putflag_message();
        msg.method = Some(TaskMethod::PutNoise);
        msg.flag = None;
        msg.task_chain_id = Some("noise_s1_r12_t3_i0".to_string());
        assert!(TaskDescription::try_from(msg).is_ok());
    }

    #[test]
    fn test_flag_required_for_getflag() {
        let mut msg = putflag_message();
        msg.method = Some(TaskMethod::GetFlag);
        msg.flag = None;
        assert!(TaskDescription::try_from(msg).is_err());
    }

    #[test]
    fn test_related_round_after_current_rejected() {
        let mut msg = putflag_message();
        msg.related_round_id = Some(13);
        msg.task_chain_id = Some("flag_s1_r13_t3_i0".to_string());
        assert!(TaskDescription::try_from(msg).is_err());
    }

    #[test]
    fn test_inconsistent_chain_id_rejected() {
        let mut wrong_kind = putflag_message();
        wrong_kind.task_chain_id = Some("noise_s1_r12_t3_i0".to_string());
        assert!(TaskDescription::try_from(wrong_kind).is_err());

        let mut wrong_team = putflag_message();
        wrong_team.task_chain_id = Some("flag_s1_r12_t4_i0".to_string());
        assert!(TaskDescription::try_from(wrong_team).is_err());
    }

    #[test]
    fn test_chain_id_roundtrip_and_malformed() {
        let chain: TaskChainId = "havoc_s2_r7_t9_i1".parse().unwrap();
        assert_eq!(chain, TaskChainId::new(ChainKind::Havoc, 2, 7, 9, 1));
        assert_eq!(chain.to_string(), "havoc_s2_r7_t9_i1");

        for bad in [
            "",
            "flag",
            "flag_s1_r2_t3",
            "flag_1_r2_t3_i4",
            "beer_s1_r2_t3_i4",
            "flag_s1_r2_t3_ix",
        ] {
            assert!(bad.parse::<TaskChainId>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_builder_computes_chain_id() {
        let task = TaskDescription::builder(TaskMethod::GetNoise, "10.0.0.5")
            .task_id(4)
            .team(8, "eight")
            .service_id(3)
            .rounds(20, 18)
            .variant_id(2)
            .build()
            .unwrap();
        assert_eq!(task.task_chain_id().to_string(), "noise_s3_r18_t8_i2");
        assert_eq!(TaskMessage::from(&task).task_chain_id.as_deref(), Some("noise_s3_r18_t8_i2"));
    }

    #[test]
    fn test_result_message_wire_shape() {
        let json = serde_json::to_value(ResultMessage::offline(None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"result": "OFFLINE", "message": null, "attackInfo": null})
        );
        let json = serde_json::to_value(ResultMessage::internal_error()).unwrap();
        assert_eq!(json["result"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_info_message_requires_variants() {
        assert!(InfoMessage::new("Sample", 1, 1, 1).is_ok());
        assert!(InfoMessage::new("Sample", 0, 1, 1).is_err());
        assert!(InfoMessage::new("", 1, 1, 1).is_err());
        let json = serde_json::to_value(InfoMessage::new("Sample", 2, 1, 1).unwrap()).unwrap();
        assert_eq!(json["flagVariants"], 2);
        assert_eq!(json["serviceName"], "Sample");
    }
}
