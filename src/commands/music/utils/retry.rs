use std::time::Duration;

/// Retry behavior shared by everything the playback pipeline retries:
/// bounded attempts for stream/metadata lookup, and the pause taken before
/// advancing past a song that failed to play.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum lookup attempts before a song is given up on.
    pub max_attempts: u32,
    /// Delay between attempts, and before advancing after a playback error.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay >= Duration::from_millis(500));
        assert!(policy.delay <= Duration::from_secs(3));
    }
}
