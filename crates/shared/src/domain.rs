use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(SessionId);
id_newtype!(CourtId);
id_newtype!(SlotId);

impl SessionId {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
}

/// One bookable hour on a court, as produced by the court-listing source.
/// `session_id` is present only for bookings that recorded a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub time: String,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub is_past: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_hour: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtSummary {
    pub id: CourtId,
    pub name: String,
    pub time_slots: Vec<TimeSlot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_treats_whitespace_as_empty() {
        assert!(SessionId::new("").is_empty());
        assert!(SessionId::new("   ").is_empty());
        assert!(!SessionId::new("sess_xyz").is_empty());
    }

    #[test]
    fn time_slot_omits_absent_optional_fields() {
        let slot = TimeSlot {
            id: SlotId::new("slot_c1_12pm"),
            time: "12:00".to_string(),
            status: SlotStatus::Available,
            session_id: None,
            is_past: false,
            booked_by: None,
            cost: None,
            start_hour: None,
        };

        let json = serde_json::to_value(&slot).expect("serialize");
        assert!(json.get("session_id").is_none());
        assert!(json.get("booked_by").is_none());
        assert_eq!(json["status"], "available");
    }
}
