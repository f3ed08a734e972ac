//! Environment-driven CLI settings.

use std::time::Duration;

use certi_ledger::config::env_u64;
use certi_ledger::AwaitPolicy;

/// Finality polling policy.
///
/// Variables:
/// - `CERTI_POLL_INTERVAL_MS` (default: 1000)
/// - `CERTI_MAX_WAIT_SECS` (default: 120)
pub fn await_policy_from_env() -> AwaitPolicy {
    let defaults = AwaitPolicy::default();
    AwaitPolicy::new(
        Duration::from_millis(env_u64(
            "CERTI_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )),
        Duration::from_secs(env_u64("CERTI_MAX_WAIT_SECS", defaults.max_wait.as_secs())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn await_policy_reads_overrides() {
        std::env::set_var("CERTI_POLL_INTERVAL_MS", "250");
        std::env::set_var("CERTI_MAX_WAIT_SECS", "9");
        let policy = await_policy_from_env();
        std::env::remove_var("CERTI_POLL_INTERVAL_MS");
        std::env::remove_var("CERTI_MAX_WAIT_SECS");

        assert_eq!(policy.poll_interval, Duration::from_millis(250));
        assert_eq!(policy.max_wait, Duration::from_secs(9));
    }
}
