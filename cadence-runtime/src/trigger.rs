use crate::descriptor::{FirstRun, ScheduleDescriptor};
use crate::error::SchedulerError;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Group name shared by every job identity, for log correlation.
pub const JOB_GROUP_NAME: &str = "CADENCE_JOB";

/// Group name shared by every trigger identity, distinct from
/// [`JOB_GROUP_NAME`].
pub const TRIGGER_GROUP_NAME: &str = "CADENCE_TRIGGER";

/// Recurring fire rule of a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireSchedule {
    Cron(String),
    /// Repeats forever at the given interval.
    FixedRate(Duration),
}

/// Timing rule derived from a [`ScheduleDescriptor`]. Pure data; the
/// scheduler facade realizes it against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSpec {
    pub schedule: FireSchedule,
    /// Execute once at registration, independent of the schedule.
    pub start_immediately: bool,
    /// First fire time for a fixed trigger that does not start
    /// immediately. Always `None` for cron.
    pub start_at: Option<DateTime<Utc>>,
}

impl TriggerSpec {
    /// Build the trigger for one discovered method, resolving the
    /// first-run policy.
    ///
    /// The defaults are asymmetric on purpose: cron defaults to no run
    /// at registration while fixed defaults to running at registration.
    pub fn resolve(
        descriptor: &ScheduleDescriptor,
        owner: &str,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulerError> {
        match (&descriptor.cron, descriptor.fixed_millis) {
            (Some(_), Some(_)) => Err(SchedulerError::AmbiguousSchedule {
                owner: owner.to_string(),
                method: method.to_string(),
            }),
            (Some(expr), None) => Ok(Self {
                schedule: FireSchedule::Cron(expr.clone()),
                start_immediately: descriptor.first_run == FirstRun::Always,
                start_at: None,
            }),
            (None, Some(millis)) if millis < 1 => Err(SchedulerError::InvalidInterval {
                value: millis,
                owner: owner.to_string(),
                method: method.to_string(),
            }),
            (None, Some(millis)) => {
                let start_immediately = descriptor.first_run != FirstRun::Never;
                let start_at = if start_immediately {
                    None
                } else {
                    Some(now + TimeDelta::milliseconds(millis as i64))
                };
                Ok(Self {
                    schedule: FireSchedule::FixedRate(Duration::from_millis(millis)),
                    start_immediately,
                    start_at,
                })
            }
            (None, None) => Err(SchedulerError::MissingExpression {
                owner: owner.to_string(),
                method: method.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(descriptor: ScheduleDescriptor) -> Result<TriggerSpec, SchedulerError> {
        TriggerSpec::resolve(&descriptor, "Foo", "bar", Utc::now())
    }

    #[test]
    fn cron_defaults_to_no_first_run() {
        let trigger = resolve(ScheduleDescriptor::cron("0 * * * * *")).unwrap();
        assert_eq!(
            trigger.schedule,
            FireSchedule::Cron("0 * * * * *".to_string())
        );
        assert!(!trigger.start_immediately);
        assert_eq!(trigger.start_at, None);
    }

    #[test]
    fn cron_first_run_always_starts_immediately() {
        let trigger =
            resolve(ScheduleDescriptor::cron("0 * * * * *").first_run(FirstRun::Always)).unwrap();
        assert!(trigger.start_immediately);
    }

    #[test]
    fn cron_first_run_never_does_not_start_immediately() {
        let trigger =
            resolve(ScheduleDescriptor::cron("0 * * * * *").first_run(FirstRun::Never)).unwrap();
        assert!(!trigger.start_immediately);
    }

    #[test]
    fn fixed_defaults_to_first_run() {
        let trigger = resolve(ScheduleDescriptor::fixed(1000)).unwrap();
        assert_eq!(
            trigger.schedule,
            FireSchedule::FixedRate(Duration::from_millis(1000))
        );
        assert!(trigger.start_immediately);
        assert_eq!(trigger.start_at, None);
    }

    #[test]
    fn fixed_first_run_always_starts_immediately() {
        let trigger = resolve(ScheduleDescriptor::fixed(1000).first_run(FirstRun::Always)).unwrap();
        assert!(trigger.start_immediately);
    }

    #[test]
    fn fixed_first_run_never_starts_one_interval_later() {
        let now = Utc::now();
        let descriptor = ScheduleDescriptor::fixed(1000).first_run(FirstRun::Never);
        let trigger = TriggerSpec::resolve(&descriptor, "Foo", "bar", now).unwrap();
        assert!(!trigger.start_immediately);
        assert_eq!(trigger.start_at, Some(now + TimeDelta::milliseconds(1000)));
    }

    #[test]
    fn missing_expression_names_owner_and_method() {
        let err = resolve(ScheduleDescriptor::default()).unwrap_err();
        assert!(matches!(err, SchedulerError::MissingExpression { .. }));
        assert!(err.to_string().contains("Foo#bar"));
    }

    #[test]
    fn both_expressions_are_rejected() {
        let mut descriptor = ScheduleDescriptor::cron("0 * * * * *");
        descriptor.fixed_millis = Some(500);
        let err = resolve(descriptor).unwrap_err();
        assert!(matches!(err, SchedulerError::AmbiguousSchedule { .. }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = resolve(ScheduleDescriptor::fixed(0)).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidInterval { value: 0, .. }
        ));
        assert!(resolve(ScheduleDescriptor::fixed(1)).is_ok());
    }
}
