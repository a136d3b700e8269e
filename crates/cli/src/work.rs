use anyhow::bail;
use tracing::debug;

use tickwork_scheduler::TickWork;

/// Demo work: logs each run and optionally fails on a fixed cadence.
#[derive(Debug, Default)]
pub struct DemoWork {
    runs: u64,
    fail_every: Option<u64>,
}

impl DemoWork {
    pub fn new(fail_every: Option<u64>) -> Self {
        Self {
            runs: 0,
            fail_every: fail_every.filter(|n| *n > 0),
        }
    }
}

impl TickWork for DemoWork {
    fn run(&mut self) -> anyhow::Result<()> {
        self.runs += 1;
        if let Some(n) = self.fail_every {
            if self.runs % n == 0 {
                bail!("simulated failure on run {}", self.runs);
            }
        }
        debug!(run = self.runs, "Demo work ran");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fails_every_nth_run() {
        let mut work = DemoWork::new(Some(3));
        assert!(work.run().is_ok());
        assert!(work.run().is_ok());
        let err = work.run().unwrap_err();
        assert!(err.to_string().contains("run 3"));
        assert!(work.run().is_ok());
    }

    #[test]
    fn zero_means_never_fail() {
        let mut work = DemoWork::new(Some(0));
        for _ in 0..5 {
            assert!(work.run().is_ok());
        }
    }
}
