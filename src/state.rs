//! Application state: the scoring ledger, config, OpenAI client, and the
//! noise monitor.
//!
//! The roster is the only shared mutable store; it is guarded by a single
//! RwLock and mutated exclusively from the synchronous answer/adjustment
//! paths. Quiz sessions are per-connection and live in the WS handler.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::{load_app_config_from_env, NoiseTuning, Prompts, QuizTuning};
use crate::noise::NoiseMonitor;
use crate::openai::OpenAI;
use crate::roster::Roster;

#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<RwLock<Roster>>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    pub quiz: QuizTuning,
    pub noise: NoiseMonitor,
    /// Rng used for student creation and question generation outside tests.
    pub rng: Arc<std::sync::Mutex<StdRng>>,
}

impl AppState {
    /// Build state from env: load config, init OpenAI, spawn the noise loop.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env().unwrap_or_default();
        let NoiseTuning { default_sensitivity } = cfg.noise;

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "mathmaster_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled for theory questions.");
        } else {
            info!(target: "mathmaster_backend", "OpenAI disabled (no OPENAI_API_KEY). Theory falls back to integer questions.");
        }

        info!(
            target: "mathmaster_backend",
            correct_points = cfg.quiz.correct_points,
            wrong_points = cfg.quiz.wrong_points,
            advance_ms = cfg.quiz.advance_ms,
            default_sensitivity,
            "Quiz tuning loaded"
        );

        Self {
            roster: Arc::new(RwLock::new(Roster::new())),
            openai,
            prompts: cfg.prompts,
            quiz: cfg.quiz,
            noise: NoiseMonitor::spawn(default_sensitivity),
            rng: Arc::new(std::sync::Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Run `f` with the shared Rng. Kept small so lock scope stays tight.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}
