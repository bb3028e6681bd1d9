//! Allocation events
//!
//! Defines all event types that can be broadcasted to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lot::LotStatus;
use crate::domain::reservation::ReservationStatus;
use crate::domain::spot::SpotStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    LotCreated(LotCreatedEvent),
    LotStatusChanged(LotStatusChangedEvent),
    SpotStatusChanged(SpotStatusChangedEvent),
    ReservationCreated(ReservationCreatedEvent),
    ReservationStatusChanged(ReservationStatusChangedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::LotCreated(_) => "lot_created",
            Event::LotStatusChanged(_) => "lot_status_changed",
            Event::SpotStatusChanged(_) => "spot_status_changed",
            Event::ReservationCreated(_) => "reservation_created",
            Event::ReservationStatusChanged(_) => "reservation_status_changed",
        }
    }

    pub fn lot_id(&self) -> i32 {
        match self {
            Event::LotCreated(e) => e.lot_id,
            Event::LotStatusChanged(e) => e.lot_id,
            Event::SpotStatusChanged(e) => e.lot_id,
            Event::ReservationCreated(e) => e.lot_id,
            Event::ReservationStatusChanged(e) => e.lot_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotCreatedEvent {
    pub lot_id: i32,
    pub name: String,
    pub total_spots: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotStatusChangedEvent {
    pub lot_id: i32,
    pub from: LotStatus,
    pub to: LotStatus,
    pub available_spots: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotStatusChangedEvent {
    pub spot_id: i32,
    pub lot_id: i32,
    pub from: SpotStatus,
    pub to: SpotStatus,
    pub available_spots: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub status: ReservationStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusChangedEvent {
    pub reservation_id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub from: ReservationStatus,
    pub to: ReservationStatus,
    pub timestamp: DateTime<Utc>,
}

/// Event with its bus sequence number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(sequence: u64, event: Event) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    /// Wire form for external subscribers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
