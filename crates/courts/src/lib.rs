use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{CourtId, CourtSummary, SessionId, SlotId, SlotStatus, TimeSlot};

/// Read-only source of courts and their time slots. The workflow side
/// never mutates this data; it only consumes session ids from past
/// booked slots.
#[async_trait]
pub trait CourtDirectory: Send + Sync {
    async fn list_courts(&self) -> Result<Vec<CourtSummary>>;
}

pub struct MissingCourtDirectory;

#[async_trait]
impl CourtDirectory for MissingCourtDirectory {
    async fn list_courts(&self) -> Result<Vec<CourtSummary>> {
        Err(anyhow!("court directory is unavailable"))
    }
}

/// In-memory directory seeded with the development fixture: two courts,
/// a handful of slots, some of them past bookings with recorded sessions.
pub struct MockCourtDirectory {
    courts: Vec<CourtSummary>,
}

impl MockCourtDirectory {
    pub fn with_courts(courts: Vec<CourtSummary>) -> Self {
        Self { courts }
    }

    pub fn seeded() -> Self {
        Self::with_courts(vec![
            CourtSummary {
                id: CourtId::new("court_1"),
                name: "Court 1".to_string(),
                time_slots: vec![
                    available_slot("slot_c1_8am", "08:00", 8),
                    booked_slot(
                        "slot_c1_9am",
                        "09:00",
                        9,
                        true,
                        Some("sess_xyz_mock_court1_9am"),
                        "John Doe",
                    ),
                    booked_slot(
                        "slot_c1_10am",
                        "10:00",
                        10,
                        true,
                        Some("sess_abc_mock_court1_10am"),
                        "Jane Smith",
                    ),
                    booked_slot(
                        "slot_c1_11am",
                        "11:00",
                        11,
                        false,
                        Some("sess_def_mock_court1_11am"),
                        "Alice King",
                    ),
                    available_slot("slot_c1_12pm", "12:00", 12),
                ],
            },
            CourtSummary {
                id: CourtId::new("court_2"),
                name: "Court 2".to_string(),
                time_slots: vec![
                    booked_slot(
                        "slot_c2_9am",
                        "09:00",
                        9,
                        true,
                        Some("sess_ghi_mock_court2_9am"),
                        "Bob Lee",
                    ),
                    available_slot("slot_c2_10am", "10:00", 10),
                ],
            },
        ])
    }
}

impl Default for MockCourtDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl CourtDirectory for MockCourtDirectory {
    async fn list_courts(&self) -> Result<Vec<CourtSummary>> {
        Ok(self.courts.clone())
    }
}

fn available_slot(id: &str, time: &str, start_hour: u8) -> TimeSlot {
    TimeSlot {
        id: SlotId::new(id),
        time: time.to_string(),
        status: SlotStatus::Available,
        session_id: None,
        is_past: false,
        booked_by: None,
        cost: None,
        start_hour: Some(start_hour),
    }
}

fn booked_slot(
    id: &str,
    time: &str,
    start_hour: u8,
    is_past: bool,
    session_id: Option<&str>,
    booked_by: &str,
) -> TimeSlot {
    TimeSlot {
        id: SlotId::new(id),
        time: time.to_string(),
        status: SlotStatus::Booked,
        session_id: session_id.map(SessionId::new),
        is_past,
        booked_by: Some(booked_by.to_string()),
        cost: Some(10.0),
        start_hour: Some(start_hour),
    }
}

/// One past booking that recorded a video and can be sent for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzableBooking {
    pub court_id: CourtId,
    pub court_name: String,
    pub slot_id: SlotId,
    pub time: String,
    pub booked_by: Option<String>,
    pub session_id: SessionId,
}

/// Filters courts down to the bookings the admin view offers analysis
/// for: booked, already elapsed, and carrying a session id. Slots are
/// ordered by start hour within each court.
pub fn analyzable_bookings(courts: &[CourtSummary]) -> Vec<AnalyzableBooking> {
    let mut bookings = Vec::new();
    for court in courts {
        let mut slots: Vec<&TimeSlot> = court.time_slots.iter().collect();
        slots.sort_by_key(|slot| slot.start_hour);
        for slot in slots {
            if slot.status != SlotStatus::Booked || !slot.is_past {
                continue;
            }
            let Some(session_id) = slot.session_id.clone() else {
                continue;
            };
            bookings.push(AnalyzableBooking {
                court_id: court.id.clone(),
                court_name: court.name.clone(),
                slot_id: slot.id.clone(),
                time: slot.time.clone(),
                booked_by: slot.booked_by.clone(),
                session_id,
            });
        }
    }
    bookings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_directory_lists_both_courts() {
        let courts = MockCourtDirectory::seeded()
            .list_courts()
            .await
            .expect("list");
        assert_eq!(courts.len(), 2);
        assert_eq!(courts[0].name, "Court 1");
        assert_eq!(courts[1].time_slots.len(), 2);
    }

    #[tokio::test]
    async fn missing_directory_errors() {
        assert!(MissingCourtDirectory.list_courts().await.is_err());
    }

    #[test]
    fn only_past_booked_slots_with_sessions_are_analyzable() {
        let courts = MockCourtDirectory::seeded().courts;
        let bookings = analyzable_bookings(&courts);

        let sessions: Vec<&str> = bookings
            .iter()
            .map(|booking| booking.session_id.as_str())
            .collect();
        assert_eq!(
            sessions,
            vec![
                "sess_xyz_mock_court1_9am",
                "sess_abc_mock_court1_10am",
                "sess_ghi_mock_court2_9am",
            ]
        );
        // The 11:00 booking has a session but has not elapsed yet.
        assert!(!sessions.contains(&"sess_def_mock_court1_11am"));
    }

    #[test]
    fn slots_are_ordered_by_start_hour_within_a_court() {
        let mut courts = MockCourtDirectory::seeded().courts;
        courts[0].time_slots.reverse();
        let bookings = analyzable_bookings(&courts);

        let court_1_times: Vec<&str> = bookings
            .iter()
            .filter(|booking| booking.court_id == CourtId::new("court_1"))
            .map(|booking| booking.time.as_str())
            .collect();
        assert_eq!(court_1_times, vec!["09:00", "10:00"]);
    }
}
