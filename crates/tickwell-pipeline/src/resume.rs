//! Resume planning.

use chrono::{DateTime, TimeDelta, Utc};
use tickwell_sink::{PersistenceSink, SchemaKind, SinkError};
use tickwell_types::{DateRange, floor_to_hour};

use crate::ResumePolicy;

/// Where a run starts and stops, and what it does to existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    /// First window start.
    pub start: DateTime<Utc>,
    /// Last window start, inclusive.
    pub end: DateTime<Utc>,
    /// Latest persisted timestamp the run continues from.
    pub resumed_from: Option<DateTime<Utc>>,
    /// Rows at or after this instant are removed before writing, and
    /// decoded ticks before it are dropped.
    pub replay_from: Option<DateTime<Utc>>,
    /// Keep polling once the range is exhausted.
    pub tail: bool,
    /// Discard existing rows before writing.
    pub reset: bool,
}

impl ResumePlan {
    /// Returns true if there is nothing left to fetch before tailing.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.start > self.end
    }
}

/// Start of the last hour that has fully elapsed at `now`.
#[must_use]
pub fn last_completed_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    floor_to_hour(now) - TimeDelta::hours(1)
}

/// Decides the effective window range from the sinks' contents.
#[derive(Debug, Clone, Copy)]
pub struct ResumeCoordinator {
    policy: ResumePolicy,
    schema: SchemaKind,
}

impl ResumeCoordinator {
    /// Creates a coordinator for `policy` over sinks holding `schema` rows.
    #[must_use]
    pub const fn new(policy: ResumePolicy, schema: SchemaKind) -> Self {
        Self { policy, schema }
    }

    /// Reads the sinks' latest timestamp (for continuation policies) and
    /// plans the run.
    ///
    /// # Errors
    ///
    /// Returns an error if a sink cannot be read.
    pub fn plan(
        &self,
        sinks: &mut dyn PersistenceSink,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Result<ResumePlan, SinkError> {
        let last = if self.policy.is_continuation() {
            sinks.last_timestamp()?
        } else {
            None
        };
        Ok(self.plan_from(last, range, now))
    }

    /// Plans the run given the latest persisted timestamp.
    ///
    /// With a tick timestamp `T` and a continuation policy the first window
    /// is `floor(T) + 1h`. For bars `T` is the start of the last bucket,
    /// which may still be missing ticks: that bucket is rebuilt from
    /// `floor(T)` and its persisted row replaced. `continue-to-now-and-tail`
    /// moves the end to the last completed hour and enables tailing. Without
    /// a timestamp, or with `restart`, the configured range is used and
    /// existing rows are reset.
    #[must_use]
    pub fn plan_from(
        &self,
        last: Option<DateTime<Utc>>,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> ResumePlan {
        let configured = ResumePlan {
            start: range.first_hour(),
            end: range.last_hour(),
            resumed_from: None,
            replay_from: None,
            tail: false,
            reset: true,
        };

        let Some(last) = last.filter(|_| self.policy.is_continuation()) else {
            return configured;
        };

        let (start, replay_from) = match self.schema {
            SchemaKind::Ticks => {
                let start = floor_to_hour(last) + TimeDelta::hours(1);
                (start, start)
            }
            SchemaKind::Bars(_) => (floor_to_hour(last), last),
        };
        let tail = self.policy == ResumePolicy::ContinueToNowAndTail;
        ResumePlan {
            start,
            end: if tail { last_completed_hour(now) } else { range.last_hour() },
            resumed_from: Some(last),
            replay_from: Some(replay_from),
            tail,
            reset: false,
        }
    }
}
