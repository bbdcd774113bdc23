//! Galera Saved State
//!
//! Codecs for the `grastate.dat` file each member keeps in its data directory
//! and for the position reported by `mariadbd --wsrep-recover`, plus the
//! choice of which member should seed a new cluster after a full outage.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crd::GaleraRecoveryStatus;
use crate::error::{Error, Result};
use crate::statefulset;

/// Name of the saved state file inside the data directory
pub const GRASTATE_FILE_NAME: &str = "grastate.dat";

const GRASTATE_HEADER: &str = "# GALERA saved state";
const RECOVERED_POSITION_MARKER: &str = "WSREP: Recovered position:";

/// Contents of `grastate.dat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GaleraState {
    pub version: String,
    pub uuid: String,
    /// `-1` when the member did not shut down cleanly
    pub seqno: i64,
    pub safe_to_bootstrap: bool,
}

impl GaleraState {
    pub fn marshal(&self) -> String {
        format!(
            "{}\nversion: {}\nuuid:    {}\nseqno:   {}\nsafe_to_bootstrap: {}\n",
            GRASTATE_HEADER,
            self.version,
            self.uuid,
            self.seqno,
            u8::from(self.safe_to_bootstrap)
        )
    }

    /// Parse `grastate.dat`. Comments, blank lines and unknown keys are ignored.
    pub fn unmarshal(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Parse("empty input".to_string()));
        }

        let mut version = None;
        let mut uuid = None;
        let mut seqno = None;
        let mut safe_to_bootstrap = None;

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| Error::Parse(format!("invalid grastate line '{}'", line)))?;
            let value = value.trim();

            match key.trim() {
                "version" => version = Some(value.to_string()),
                "uuid" => uuid = Some(value.to_string()),
                "seqno" => {
                    seqno = Some(value.parse::<i64>().map_err(|e| {
                        Error::Parse(format!("invalid seqno '{}': {}", value, e))
                    })?)
                }
                "safe_to_bootstrap" => {
                    safe_to_bootstrap = Some(match value {
                        "1" => true,
                        "0" => false,
                        other => {
                            return Err(Error::Parse(format!(
                                "invalid safe_to_bootstrap '{}'",
                                other
                            )))
                        }
                    })
                }
                _ => {}
            }
        }

        Ok(Self {
            version: version.ok_or_else(|| missing("version"))?,
            uuid: uuid.ok_or_else(|| missing("uuid"))?,
            seqno: seqno.ok_or_else(|| missing("seqno"))?,
            safe_to_bootstrap: safe_to_bootstrap.ok_or_else(|| missing("safe_to_bootstrap"))?,
        })
    }
}

fn missing(field: &str) -> Error {
    Error::Parse(format!("missing field '{}'", field))
}

/// Position reported by `--wsrep-recover`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredPosition {
    pub uuid: String,
    pub seqno: i64,
}

impl RecoveredPosition {
    /// Extract the position from recovery log output. The last reported
    /// position wins.
    pub fn unmarshal(log: &str) -> Result<Self> {
        let position = log
            .lines()
            .filter_map(|line| {
                line.find(RECOVERED_POSITION_MARKER)
                    .map(|i| line[i + RECOVERED_POSITION_MARKER.len()..].trim())
            })
            .last()
            .ok_or_else(|| Error::Parse("no recovered position found".to_string()))?;

        let (uuid, seqno) = position
            .rsplit_once(':')
            .ok_or_else(|| Error::Parse(format!("invalid recovered position '{}'", position)))?;
        let seqno = seqno
            .parse::<i64>()
            .map_err(|e| Error::Parse(format!("invalid seqno '{}': {}", seqno, e)))?;

        Ok(Self {
            uuid: uuid.to_string(),
            seqno,
        })
    }
}

impl fmt::Display for RecoveredPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uuid, self.seqno)
    }
}

// =============================================================================
// Bootstrap Source Selection
// =============================================================================

/// What is known about one member after an outage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberState {
    pub saved: Option<GaleraState>,
    pub recovered: Option<RecoveredPosition>,
}

impl MemberState {
    /// Most reliable sequence number: recovered first, then a clean saved one
    fn seqno(&self) -> Option<i64> {
        self.recovered
            .as_ref()
            .map(|r| r.seqno)
            .or_else(|| self.saved.as_ref().map(|s| s.seqno).filter(|s| *s >= 0))
    }

    fn safe_to_bootstrap(&self) -> bool {
        self.saved
            .as_ref()
            .map(|s| s.safe_to_bootstrap)
            .unwrap_or(false)
    }
}

/// Why a member was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapReason {
    SafeToBootstrap,
    HighestSeqno,
}

/// Member chosen to seed the new cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSource {
    pub pod_name: String,
    pub seqno: Option<i64>,
    pub reason: BootstrapReason,
}

/// Choose the member to bootstrap from.
///
/// A member flagged `safe_to_bootstrap` wins outright. Otherwise the member
/// with the highest sequence number is chosen. Ties go to the lowest ordinal.
/// Returns `None` when no member has a usable position.
pub fn select_bootstrap_source(members: &BTreeMap<String, MemberState>) -> Option<BootstrapSource> {
    let mut ordered: Vec<(u32, &String, &MemberState)> = members
        .iter()
        .filter_map(|(pod, state)| match statefulset::pod_index(pod) {
            Ok(ordinal) => Some((ordinal, pod, state)),
            Err(e) => {
                warn!(pod = %pod, error = %e, "Ignoring member without ordinal");
                None
            }
        })
        .collect();
    ordered.sort_by_key(|(ordinal, _, _)| *ordinal);

    if let Some((_, pod, state)) = ordered.iter().find(|(_, _, s)| s.safe_to_bootstrap()) {
        debug!(pod = %pod, "Member is safe to bootstrap");
        return Some(BootstrapSource {
            pod_name: pod.to_string(),
            seqno: state.seqno(),
            reason: BootstrapReason::SafeToBootstrap,
        });
    }

    let mut best: Option<(&String, i64)> = None;
    for (_, pod, state) in &ordered {
        if let Some(seqno) = state.seqno() {
            if best.map(|(_, s)| seqno > s).unwrap_or(true) {
                best = Some((*pod, seqno));
            }
        }
    }

    best.map(|(pod, seqno)| {
        debug!(pod = %pod, seqno = seqno, "Member has the highest seqno");
        BootstrapSource {
            pod_name: pod.to_string(),
            seqno: Some(seqno),
            reason: BootstrapReason::HighestSeqno,
        }
    })
}

/// Collect per-member state from a recovery status
pub fn member_states(status: &GaleraRecoveryStatus) -> BTreeMap<String, MemberState> {
    let mut members: BTreeMap<String, MemberState> = BTreeMap::new();
    for (pod, saved) in &status.state {
        members.entry(pod.clone()).or_default().saved = Some(saved.clone());
    }
    for (pod, recovered) in &status.recovered {
        members.entry(pod.clone()).or_default().recovered = Some(recovered.clone());
    }
    members
}
