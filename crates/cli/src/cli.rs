use clap::Parser;

use tickwork_core::TickerConfig;

/// Run a pausable periodic task on a fixed-cadence tick loop.
///
/// Loop and task settings come from the environment (see `TickerConfig`);
/// any flag given here overrides them.
#[derive(Parser, Debug)]
#[command(name = "tickwork", version, about = "Drive a pausable periodic task on a tick loop")]
pub struct CliArgs {
    /// Config profile; keys are read as {PROFILE}_{KEY} before {KEY}
    #[arg(long, env = "TICKWORK_PROFILE", default_value = "")]
    pub profile: String,

    /// Wall-clock milliseconds per tick
    #[arg(long)]
    pub tick_millis: Option<u64>,

    /// Ticks before the task first runs
    #[arg(long)]
    pub delay: Option<u64>,

    /// Ticks between runs, -1 to run once
    #[arg(long, allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Number of ticks to deliver before exiting
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Task name used in logs and the snapshot
    #[arg(long, default_value = "demo")]
    pub name: String,

    /// Pause the task just before this tick is delivered
    #[arg(long)]
    pub pause_at: Option<u64>,

    /// Resume the task just before this tick is delivered
    #[arg(long)]
    pub resume_at: Option<u64>,

    /// Make every Nth run of the work fail
    #[arg(long)]
    pub fail_every: Option<u64>,

    /// Print the final task snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, mut config: TickerConfig) -> TickerConfig {
        if let Some(v) = self.tick_millis {
            config.tick_millis = v;
        }
        if let Some(v) = self.delay {
            config.task_delay = v;
        }
        if let Some(v) = self.interval {
            config.task_interval = v;
        }
        if let Some(v) = self.ticks {
            config.run_ticks = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = CliArgs::try_parse_from([
            "tickwork",
            "--tick-millis",
            "10",
            "--interval",
            "-1",
            "--pause-at",
            "3",
        ])
        .unwrap();
        let config = args.apply(TickerConfig::default());

        assert_eq!(config.tick_millis, 10);
        assert_eq!(config.task_interval, -1);
        assert_eq!(config.task_delay, 0);
        assert_eq!(config.run_ticks, 200);
        assert_eq!(args.pause_at, Some(3));
        assert_eq!(args.name, "demo");
        assert!(!args.json);
    }

    #[test]
    fn no_flags_keep_config() {
        let args = CliArgs::try_parse_from(["tickwork"]).unwrap();
        let base = TickerConfig { run_ticks: 7, ..TickerConfig::default() };
        assert_eq!(args.apply(base.clone()), base);
    }
}
