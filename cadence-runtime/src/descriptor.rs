/// Whether a job also executes once at registration, independent of
/// its recurring schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstRun {
    /// Cron schedules default to no first run, fixed intervals default
    /// to running at registration.
    #[default]
    Default,
    /// Execute once at registration.
    Always,
    /// Never execute at registration.
    Never,
}

/// How a discovered method fires: a cron expression or a fixed repeat
/// interval in milliseconds. Exactly one of the two must be set; the
/// invariant is checked when the trigger is built, so a descriptor
/// handed over by the discovery collaborator may be malformed.
///
/// A cron expression may be a `${key}` or `${key:default}` placeholder
/// resolved against the loaded configuration at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDescriptor {
    pub cron: Option<String>,
    pub fixed_millis: Option<u64>,
    pub first_run: FirstRun,
}

impl ScheduleDescriptor {
    /// Descriptor firing on a cron expression.
    pub fn cron(expr: impl Into<String>) -> Self {
        Self {
            cron: Some(expr.into()),
            ..Self::default()
        }
    }

    /// Descriptor firing every `millis` milliseconds, repeating forever.
    pub fn fixed(millis: u64) -> Self {
        Self {
            fixed_millis: Some(millis),
            ..Self::default()
        }
    }

    pub fn first_run(mut self, policy: FirstRun) -> Self {
        self.first_run = policy;
        self
    }
}
