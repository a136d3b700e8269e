use std::env;

use serde::{Deserialize, Serialize};

use crate::error::TickerError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_opt<F>(lookup: &F, profile: &str, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed) {
            return Some(v);
        }
    }
    lookup(key)
}

fn profiled_u64<F>(lookup: &F, profile: &str, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    profiled_opt(lookup, profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_i64<F>(lookup: &F, profile: &str, key: &str, default: i64) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    profiled_opt(lookup, profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn default_tick_millis() -> u64 { 50 }
fn default_task_delay() -> u64 { 0 }
fn default_task_interval() -> i64 { 20 }
fn default_run_ticks() -> u64 { 200 }

/// Host tick loop and demo task settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    /// Wall-clock length of one tick. 50ms = 20 ticks per second.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Ticks before the task first runs.
    #[serde(default = "default_task_delay")]
    pub task_delay: u64,
    /// Ticks between runs, -1 for a one-shot task.
    #[serde(default = "default_task_interval")]
    pub task_interval: i64,
    /// How many ticks the host loop delivers before exiting.
    #[serde(default = "default_run_ticks")]
    pub run_ticks: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            tick_millis: default_tick_millis(),
            task_delay: default_task_delay(),
            task_interval: default_task_interval(),
            run_ticks: default_run_ticks(),
        }
    }
}

impl TickerConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TICKWORK_PROFILE`. When set (e.g. `FAST`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("TICKWORK_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config from environment variables for a named profile
    /// (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, env_opt)
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(profile: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            tick_millis: profiled_u64(&lookup, p, "TICK_MILLIS", default_tick_millis()),
            task_delay: profiled_u64(&lookup, p, "TASK_DELAY", default_task_delay()),
            task_interval: profiled_i64(&lookup, p, "TASK_INTERVAL", default_task_interval()),
            run_ticks: profiled_u64(&lookup, p, "RUN_TICKS", default_run_ticks()),
        }
    }

    pub fn validate(&self) -> Result<(), TickerError> {
        if self.tick_millis == 0 {
            return Err(TickerError::Config("tick_millis must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Ticks delivered per wall-clock second.
    pub fn ticks_per_second(&self) -> f64 {
        if self.tick_millis == 0 {
            return 0.0;
        }
        1000.0 / self.tick_millis as f64
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  tick:   {}ms ({:.1} tps)", self.tick_millis, self.ticks_per_second());
        tracing::info!("  task:   delay={}, interval={}", self.task_delay, self.task_interval);
        tracing::info!("  run:    ticks={}", self.run_ticks);
    }
}
