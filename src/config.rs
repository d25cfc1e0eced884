//! Loading application configuration (prompts + quiz/noise tuning) from TOML.
//!
//! Every field has a default, so the server always starts even without a
//! config file. See `AppConfig`, `Prompts`, `QuizTuning`, `NoiseTuning`.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub quiz: QuizTuning,
  #[serde(default)]
  pub noise: NoiseTuning,
}

/// Prompts used by the OpenAI client. Defaults target seventh-grade math
/// theory in Spanish. Override them in TOML to tune tone/topics.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub theory_system: String,
  pub theory_user_template: String,
  /// Fills `{nivel}` in the user template.
  pub grade_level: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      theory_system:
        "Eres un generador de preguntas de matemáticas para diagnóstico escolar. Responde SOLO con JSON estricto.".into(),
      theory_user_template:
        "Genera una pregunta de selección múltiple para estudiantes de {nivel} de matemáticas.\n\
         El tema debe ser TEÓRICO y CONCEPTUAL sobre: Uso de signos (ley de signos), propiedades de la igualdad, o normas operativas básicas (jerarquía de operaciones).\n\
         La pregunta debe evaluar la comprensión del concepto, no solo calcular.\n\
         El idioma debe ser Español.\n\
         Devuelve JSON con campos: text (string), options (array de 4 strings), correctIndex (entero 0-3).".into(),
      grade_level: "séptimo grado (12-13 años)".into(),
    }
  }
}

/// Point values and the feedback window before auto-advance.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct QuizTuning {
  pub correct_points: i64,
  pub wrong_points: i64,
  pub advance_ms: u64,
}

impl Default for QuizTuning {
  fn default() -> Self {
    Self { correct_points: 10, wrong_points: -2, advance_ms: 2000 }
  }
}

/// Noise monitor defaults. Sensitivity is clamped to [1, 95] at runtime.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NoiseTuning {
  pub default_sensitivity: u8,
}

impl Default for NoiseTuning {
  fn default() -> Self {
    Self { default_sensitivity: 65 }
  }
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "mathmaster_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathmaster_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathmaster_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
