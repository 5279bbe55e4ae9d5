use super::config::ScoringTuning;
use super::customer::{Customer, CustomerState};

pub fn points_for(state: CustomerState, tuning: &ScoringTuning) -> i32 {
    match state {
        CustomerState::Satisfied => tuning.satisfied_points,
        CustomerState::Angry => tuning.angry_points,
        _ => 0,
    }
}

/// Standing value of a crowd: satisfied customers earn, angry ones cost.
pub fn score_of(customers: &[Customer], tuning: &ScoringTuning) -> i32 {
    customers
        .iter()
        .map(|customer| points_for(customer.state, tuning))
        .fold(0i32, i32::saturating_add)
}

/// Score earned between two snapshots of the same crowd, paired by index.
///
/// Entering a scoring state books its points once. Leaving one books nothing,
/// so a satisfied customer drifting back to browsing keeps what it earned.
pub fn score_delta(before: &[Customer], after: &[Customer], tuning: &ScoringTuning) -> i32 {
    before
        .iter()
        .zip(after)
        .filter(|(old, new)| old.state != new.state)
        .map(|(_, new)| points_for(new.state, tuning))
        .fold(0i32, i32::saturating_add)
}
