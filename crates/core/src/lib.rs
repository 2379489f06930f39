//! Matchday Core Library
//!
//! Domain models, schedule calculation, match voting state, orchestration,
//! and storage for the Matchday coordinator.

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod invariants;
pub mod models;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{Coordinator, MatchOutcome, PlayerAppearances, SeasonStats};
pub use error::{Error, Result};
pub use events::{ConfirmationEvent, MatchSnapshot};
pub use models::*;
pub use storage::{
    ConfirmationLog, Database, DedupRepository, MatchRepository, MatchStore, Storage,
    TeamRepository, TeamStore,
};
