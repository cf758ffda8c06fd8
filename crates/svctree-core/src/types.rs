//! Domain types shared across the svctree workspace.
//!
//! A service node carries a six-level severity status. Its weight table says
//! how much the node contributes to its parent's aggregate, conditioned on the
//! node's own status; its threshold table maps an aggregate child weight back
//! to a status. Both tables are serialized to/from JSON with the portable
//! document field names (`normal` .. `critical`).

use serde::{Deserialize, Serialize};

/// Opaque numeric-string identifier of a service node.
///
/// Globally ordered; the leading digits encode the partition prefix of the
/// originating deployment.
pub type ServiceId = String;

/// Severity ladder of a service node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ServiceStatus {
    Normal = 0,
    Information = 1,
    Alert = 2,
    Average = 3,
    Major = 4,
    Critical = 5,
}

impl ServiceStatus {
    /// All statuses, index position = numeric severity.
    pub const ALL: [ServiceStatus; 6] = [
        ServiceStatus::Normal,
        ServiceStatus::Information,
        ServiceStatus::Alert,
        ServiceStatus::Average,
        ServiceStatus::Major,
        ServiceStatus::Critical,
    ];
}

impl From<ServiceStatus> for u8 {
    fn from(status: ServiceStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for ServiceStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ServiceStatus::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("invalid service status {value}, expected 0..=5"))
    }
}

/// Per-node contribution weights, one per status the node itself can be in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightTable {
    pub normal: f64,
    pub information: f64,
    pub alert: f64,
    pub average: f64,
    pub major: f64,
    pub critical: f64,
}

impl WeightTable {
    /// The weight this node reports upward when it has the given status.
    pub fn for_status(&self, status: ServiceStatus) -> f64 {
        self.values()[status as usize]
    }

    fn values(&self) -> [f64; 6] {
        [
            self.normal,
            self.information,
            self.alert,
            self.average,
            self.major,
            self.critical,
        ]
    }
}

/// Per-node severity boundaries, slots 1..=6 (slot 1 = normal boundary,
/// slot 6 = critical boundary). Consulted only for nodes with children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdTable {
    pub normal: f64,
    pub information: f64,
    pub alert: f64,
    pub average: f64,
    pub major: f64,
    pub critical: f64,
}

impl ThresholdTable {
    /// Classify an aggregate child weight into a status.
    ///
    /// Scans slots 1..=6 in ascending order and keeps the LAST slot whose
    /// boundary is satisfied (`sum_weight >= boundary`), yielding status
    /// `slot - 1`; status 0 when no slot is satisfied. Last-match-wins holds
    /// even when the boundaries are not monotonically increasing — existing
    /// threshold tables rely on that, so the scan must never sort or
    /// break on the first match.
    pub fn classify(&self, sum_weight: f64) -> ServiceStatus {
        let mut status = ServiceStatus::Normal;
        for (index, boundary) in self.slots().into_iter().enumerate() {
            if sum_weight >= boundary {
                status = ServiceStatus::ALL[index];
            }
        }
        status
    }

    fn slots(&self) -> [f64; 6] {
        [
            self.normal,
            self.information,
            self.alert,
            self.average,
            self.major,
            self.critical,
        ]
    }
}
