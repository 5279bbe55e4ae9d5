use retail_engine::RandomSource;
use tracing::info;

use super::session::{GameSession, SessionError, TickInput};

type CompletionCallback = Box<dyn FnMut(i32)>;

/// Owns the current session together with its random source and notifies the
/// host once when the countdown ends a session.
pub struct Simulation<R> {
    session: GameSession,
    rng: R,
    on_complete: Option<CompletionCallback>,
    completion_reported: bool,
}

impl<R: RandomSource> Simulation<R> {
    pub fn new(session: GameSession, rng: R) -> Self {
        Self {
            session,
            rng,
            on_complete: None,
            completion_reported: false,
        }
    }

    /// Called with the final score the first time the session reaches game over.
    pub fn set_completion_callback(&mut self, callback: impl FnMut(i32) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub fn assets_ready(&mut self) {
        self.session = self.session.assets_ready();
    }

    pub fn start(&mut self) {
        self.session = self.session.start();
    }

    pub fn pause(&mut self) {
        self.session = self.session.pause();
    }

    pub fn resume(&mut self) {
        self.session = self.session.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.session = self.session.toggle_pause();
    }

    pub fn advance_tick(&mut self, input: &TickInput) -> &GameSession {
        self.session = self.session.tick(input, &mut self.rng);
        &self.session
    }

    pub fn advance_second(&mut self) -> &GameSession {
        self.session = self.session.countdown_second();
        if self.session.is_over() && !self.completion_reported {
            self.completion_reported = true;
            let score = self.session.score();
            info!(score, "completion_reported");
            if let Some(callback) = self.on_complete.as_mut() {
                callback(score);
            }
        }
        &self.session
    }

    /// Replaces the session with a fresh playing one; the callback stays armed.
    pub fn restart(&mut self) -> Result<&GameSession, SessionError> {
        self.session = self.session.restarted()?;
        self.completion_reported = false;
        info!(difficulty = %self.session.difficulty(), "session_restarted");
        Ok(&self.session)
    }
}
