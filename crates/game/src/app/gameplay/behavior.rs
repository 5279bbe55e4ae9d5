use retail_engine::{move_toward, RandomSource, Vec2, MOVE_ARRIVAL_THRESHOLD};
use tracing::debug;

use super::config::BehaviorTuning;
use super::customer::{Customer, CustomerState};
use super::layout::StoreLayout;
use super::pathing::PathStrategy;

/// Everything a customer reacts to during one tick.
pub struct BehaviorContext<'a> {
    /// Avatar position after this tick's avatar movement.
    pub avatar_position: Vec2,
    pub interaction_radius: f64,
    /// Simulation clock before this tick advances it.
    pub clock_ms: u64,
    pub layout: &'a StoreLayout,
    pub tuning: &'a BehaviorTuning,
    pub pathing: &'a dyn PathStrategy,
}

/// Advances one customer by a tick and returns its next state.
///
/// Proximity is measured from where the customer stood before moving. State
/// rules read the previous snapshot, while exit routing and backing away use
/// the position reached this tick.
pub fn update_customer(
    customer: &Customer,
    ctx: &BehaviorContext<'_>,
    rng: &mut dyn RandomSource,
) -> Customer {
    let distance = customer.position.distance(ctx.avatar_position);
    let in_range = distance < ctx.interaction_radius;
    let too_close = distance < ctx.interaction_radius * ctx.tuning.too_close_factor;

    let mut next = customer.clone();
    step_movement(&mut next, ctx, rng);
    apply_state_rules(customer, &mut next, in_range, too_close, ctx, rng);
    next.patience = next.patience.clamp(0.0, ctx.tuning.max_patience);

    if next.state != customer.state {
        debug!(
            customer_id = customer.id,
            from = %customer.state,
            to = %next.state,
            patience = next.patience,
            clock_ms = ctx.clock_ms,
            "customer_state_changed"
        );
    }
    next
}

/// Entrance tile closest to `position` by Euclidean distance. Ties keep the
/// first entrance in row-major order.
pub fn nearest_exit(position: Vec2, layout: &StoreLayout) -> Option<Vec2> {
    let mut best: Option<(Vec2, f64)> = None;
    for entrance in layout.entrances() {
        let candidate = entrance.position();
        let distance = position.distance(candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(exit, _)| exit)
}

fn step_movement(next: &mut Customer, ctx: &BehaviorContext<'_>, rng: &mut dyn RandomSource) {
    let Some(target) = next.target else {
        next.moving = false;
        if rng.next_float() < ctx.tuning.wander_chance {
            let x = (rng.next_float() * ctx.layout.cols() as f64).floor();
            let y = (rng.next_float() * ctx.layout.rows() as f64).floor();
            let destination = Vec2::new(x, y);
            if ctx.layout.is_walkable(destination) {
                set_destination(next, destination, ctx);
            }
        }
        return;
    };

    let waypoint = next.path.first().copied().unwrap_or(target);
    let step = move_toward(next.position, waypoint, next.speed, ctx.layout);
    next.position = step.position;
    next.facing = step.facing;
    next.moving = step.moving;

    if next.position.distance(target) < MOVE_ARRIVAL_THRESHOLD {
        next.target = None;
        next.path.clear();
    } else if !next.path.is_empty() && next.position.distance(waypoint) < MOVE_ARRIVAL_THRESHOLD {
        next.path.remove(0);
    }
}

fn apply_state_rules(
    prev: &Customer,
    next: &mut Customer,
    in_range: bool,
    too_close: bool,
    ctx: &BehaviorContext<'_>,
    rng: &mut dyn RandomSource,
) {
    let tuning = ctx.tuning;
    let since_interaction = ctx.clock_ms.saturating_sub(prev.last_interaction_ms);

    match prev.state {
        CustomerState::Browsing => {
            if !prev.needs_help {
                return;
            }
            if too_close {
                next.approach_attempts = prev.approach_attempts.saturating_add(1);
                next.patience = (prev.patience - tuning.approach_patience_penalty).max(0.0);
                if next.approach_attempts >= tuning.approach_limit {
                    become_angry(next, ctx);
                } else {
                    let away = next.position
                        + (next.position - ctx.avatar_position) * tuning.repulsion_factor;
                    if ctx.layout.is_walkable(away) {
                        set_destination(next, away, ctx);
                    }
                }
            } else if in_range && since_interaction >= tuning.notice_cooldown_ms {
                if rng.next_float() < tuning.notice_chance {
                    next.state = CustomerState::Waiting;
                    next.last_interaction_ms = ctx.clock_ms;
                }
            } else {
                next.patience = (prev.patience - tuning.browsing_patience_decay).max(0.0);
                if next.patience <= 0.0 {
                    become_angry(next, ctx);
                }
            }
        }
        CustomerState::Waiting => {
            if in_range {
                next.state = CustomerState::Helped;
                next.interaction_time = 0;
            } else {
                next.patience = (prev.patience - tuning.waiting_patience_decay).max(0.0);
                if next.patience <= 0.0 {
                    become_angry(next, ctx);
                } else if since_interaction >= tuning.waiting_timeout_ms {
                    next.state = CustomerState::Browsing;
                }
            }
        }
        CustomerState::Helped => {
            if in_range {
                next.interaction_time = prev.interaction_time.saturating_add(1);
                if next.interaction_time >= tuning.help_ticks_required {
                    next.state = CustomerState::Satisfied;
                    next.needs_help = false;
                    next.last_interaction_ms = ctx.clock_ms;
                }
            } else {
                next.state = CustomerState::Waiting;
                next.patience = (prev.patience - tuning.abandoned_help_penalty).max(0.0);
            }
        }
        CustomerState::Satisfied => {
            if rng.next_float() < tuning.reengage_chance {
                next.needs_help = rng.next_float() < tuning.reengage_needs_help_chance;
                next.state = CustomerState::Browsing;
                next.patience = tuning.max_patience;
            }
        }
        CustomerState::Angry | CustomerState::Leaving => {
            if prev.target.is_none() {
                route_to_exit(next, ctx);
            }
        }
    }
}

fn become_angry(next: &mut Customer, ctx: &BehaviorContext<'_>) {
    next.state = CustomerState::Angry;
    route_to_exit(next, ctx);
}

fn route_to_exit(next: &mut Customer, ctx: &BehaviorContext<'_>) {
    match nearest_exit(next.position, ctx.layout) {
        Some(exit) => set_destination(next, exit, ctx),
        None => {
            debug!(customer_id = next.id, "exit_unavailable");
            next.target = None;
            next.path.clear();
        }
    }
}

fn set_destination(next: &mut Customer, destination: Vec2, ctx: &BehaviorContext<'_>) {
    next.target = Some(destination);
    next.path = ctx.pathing.plan(next.position, destination, ctx.layout);
}
