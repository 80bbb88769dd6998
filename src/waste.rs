//! Waste
//!
//! Waste types accepted by the pickup scheduler and the requests built from it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a recycling request from scheduler input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Waste type did not match any accepted type.
    #[error("unknown waste type: {0}")]
    UnknownWasteType(String),

    /// Pickups must weigh at least one kilogram.
    #[error("weight must be at least 1 kg, got {0}")]
    WeightTooLow(u32),
}

/// Accepted waste types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    /// Unsorted household waste
    Mixed,

    /// Paper and cardboard
    Paper,

    /// Plastics
    Plastic,

    /// Glass
    Glass,

    /// Metals and cans
    Metal,

    /// Electronic waste
    EWaste,
}

impl WasteType {
    /// Every waste type, in scheduler display order.
    pub const ALL: [WasteType; 6] = [
        WasteType::Mixed,
        WasteType::Paper,
        WasteType::Plastic,
        WasteType::Glass,
        WasteType::Metal,
        WasteType::EWaste,
    ];

    /// Stable identifier used in stored documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            WasteType::Mixed => "mixed",
            WasteType::Paper => "paper",
            WasteType::Plastic => "plastic",
            WasteType::Glass => "glass",
            WasteType::Metal => "metal",
            WasteType::EWaste => "ewaste",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();

        WasteType::ALL
            .into_iter()
            .find(|waste_type| waste_type.as_str() == normalized)
            .ok_or_else(|| RequestError::UnknownWasteType(s.to_string()))
    }
}

/// Lifecycle of a scheduled pickup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupStatus {
    /// Submitted, awaiting confirmation
    Pending,

    /// Confirmed with a collection slot
    Scheduled,

    /// Collected; points have been credited
    Completed,

    /// Withdrawn before collection
    Cancelled,
}

impl PickupStatus {
    /// Stable identifier used in stored documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Scheduled => "scheduled",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PickupStatus::Pending),
            "scheduled" => Some(PickupStatus::Scheduled),
            "completed" => Some(PickupStatus::Completed),
            "cancelled" => Some(PickupStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a pickup in this status may move to `next`.
    pub const fn can_transition_to(self, next: PickupStatus) -> bool {
        matches!(
            (self, next),
            (PickupStatus::Pending, PickupStatus::Scheduled | PickupStatus::Cancelled)
                | (
                    PickupStatus::Pending | PickupStatus::Scheduled,
                    PickupStatus::Completed
                )
                | (PickupStatus::Scheduled, PickupStatus::Cancelled)
        )
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pickup request submitted from the scheduler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecyclingRequest {
    #[serde(rename = "type")]
    waste_type: WasteType,
    weight_kg: u32,
    distance_km: u32,
    is_member: bool,
}

impl RecyclingRequest {
    /// Create a new request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::WeightTooLow`] if `weight_kg` is zero.
    pub fn new(
        waste_type: WasteType,
        weight_kg: u32,
        distance_km: u32,
        is_member: bool,
    ) -> Result<Self, RequestError> {
        if weight_kg == 0 {
            return Err(RequestError::WeightTooLow(weight_kg));
        }

        Ok(Self {
            waste_type,
            weight_kg,
            distance_km,
            is_member,
        })
    }

    /// Waste type being collected
    pub fn waste_type(&self) -> WasteType {
        self.waste_type
    }

    /// Declared weight in kilograms
    pub fn weight_kg(&self) -> u32 {
        self.weight_kg
    }

    /// Distance from the depot in kilometres
    pub fn distance_km(&self) -> u32 {
        self.distance_km
    }

    /// Whether the requester holds an active membership
    pub fn is_member(&self) -> bool {
        self.is_member
    }

    /// The same request with the membership flag replaced.
    #[must_use]
    pub fn with_member(self, is_member: bool) -> Self {
        Self { is_member, ..self }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn waste_type_parses_case_insensitively() -> TestResult {
        assert_eq!("EWaste".parse::<WasteType>()?, WasteType::EWaste);
        assert_eq!(" paper ".parse::<WasteType>()?, WasteType::Paper);

        Ok(())
    }

    #[test]
    fn waste_type_rejects_unknown() {
        let result = "styrofoam".parse::<WasteType>();

        assert_eq!(
            result,
            Err(RequestError::UnknownWasteType("styrofoam".to_string()))
        );
    }

    #[test]
    fn request_rejects_zero_weight() {
        let result = RecyclingRequest::new(WasteType::Glass, 0, 3, false);

        assert_eq!(result, Err(RequestError::WeightTooLow(0)));
    }

    #[test]
    fn request_allows_zero_distance() -> TestResult {
        let request = RecyclingRequest::new(WasteType::Metal, 1, 0, true)?;

        assert_eq!(request.distance_km(), 0);
        assert!(request.is_member());

        Ok(())
    }

    #[test]
    fn completed_pickups_cannot_transition() {
        for next in [
            PickupStatus::Pending,
            PickupStatus::Scheduled,
            PickupStatus::Completed,
            PickupStatus::Cancelled,
        ] {
            assert!(!PickupStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn pending_pickups_can_complete_or_cancel() {
        assert!(PickupStatus::Pending.can_transition_to(PickupStatus::Completed));
        assert!(PickupStatus::Pending.can_transition_to(PickupStatus::Cancelled));
        assert!(PickupStatus::Scheduled.can_transition_to(PickupStatus::Cancelled));
        assert!(!PickupStatus::Cancelled.can_transition_to(PickupStatus::Completed));
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!(
            PickupStatus::parse(PickupStatus::Scheduled.as_str()),
            Some(PickupStatus::Scheduled)
        );
        assert_eq!(PickupStatus::parse("lost"), None);
    }
}
