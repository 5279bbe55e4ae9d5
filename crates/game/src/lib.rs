//! Retail floor simulation: a store associate helps customers on an
//! isometric shop floor before the countdown runs out.

pub mod app;

pub use app::gameplay::{
    Customer, CustomerState, Difficulty, GameSession, SessionError, SessionSnapshot,
    SessionStatus, SessionTuning, Simulation, TickInput,
};
