//! Alarms and timers.
//!
//! Reminders fire on their own tokio tasks and speak through a cloned
//! [`Speaker`], independent of the session loop. Every pending reminder
//! shares one [`CancellationToken`] so quitting drops them together.

use crate::voice::Speaker;
use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Schedules a spoken announcement after a delay.
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, announcement: String);
}

/// [`ReminderScheduler`] spawning one task per reminder on a tokio runtime.
pub struct TokioReminders {
    handle: Handle,
    speaker: Speaker,
    cancel: CancellationToken,
}

impl TokioReminders {
    #[must_use]
    pub fn new(handle: Handle, speaker: Speaker, cancel: CancellationToken) -> Self {
        Self {
            handle,
            speaker,
            cancel,
        }
    }

    /// Drop every pending reminder.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }
}

impl ReminderScheduler for TokioReminders {
    fn schedule(&self, delay: Duration, announcement: String) {
        let speaker = self.speaker.clone();
        let cancel = self.cancel.clone();
        debug!(delay_s = delay.as_secs(), "reminder scheduled");
        self.handle.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    info!("reminder fired");
                    // `say` blocks on synthesis; keep it off the async workers.
                    let _ = tokio::task::spawn_blocking(move || speaker.say(&announcement)).await;
                }
                () = cancel.cancelled() => {
                    debug!("reminder cancelled");
                }
            }
        });
    }
}

/// A parsed reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub delay: Duration,
    /// Spoken form, e.g. `"7:30 AM"` or `"5 minutes"`.
    pub label: String,
}

impl Reminder {
    #[must_use]
    pub fn alarm_announcement(&self) -> String {
        format!("Sir, this is your alarm for {}.", self.label)
    }

    #[must_use]
    pub fn timer_announcement(&self) -> String {
        format!("Sir, your timer for {} is up.", self.label)
    }
}

/// Parse `"... at 7:30 am"` / `"... for 6 pm"` alarm requests relative to `now`.
///
/// The alarm is the next occurrence of the wall-clock time: a time at or
/// before `now` rolls over to tomorrow.
#[must_use]
pub fn parse_alarm(utterance: &str, now: NaiveDateTime) -> Option<Reminder> {
    let pattern = Regex::new(r"(?i)\b(?:at|for)\s+(\d{1,2})(?:\s*:?\s*(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)").ok()?;
    let caps = pattern.captures(utterance)?;

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let meridiem = caps.get(3)?.as_str().to_lowercase().replace('.', "");
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let label = format!("{hour}:{minute:02} {}", meridiem.to_uppercase());

    let hour24 = match (meridiem.as_str(), hour) {
        ("pm", 12) => 12,
        ("pm", h) => h + 12,
        ("am", 12) => 0,
        (_, h) => h,
    };
    let at = NaiveTime::from_hms_opt(hour24, minute, 0)?;
    let mut target = now.date().and_time(at);
    if target <= now {
        target += ChronoDuration::days(1);
    }
    let delay = (target - now).to_std().ok()?;
    Some(Reminder { delay, label })
}

/// Parse `"... 5 minutes"`-style timer requests.
#[must_use]
pub fn parse_timer(utterance: &str) -> Option<Reminder> {
    let pattern = Regex::new(r"(\d+)\s+(second|minute|hour)s?").ok()?;
    let caps = pattern.captures(utterance)?;
    let value: u64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();
    let seconds = match unit {
        "second" => value,
        "minute" => value.checked_mul(60)?,
        _ => value.checked_mul(3600)?,
    };
    Some(Reminder {
        delay: Duration::from_secs(seconds),
        label: if value == 1 {
            format!("1 {unit}")
        } else {
            format!("{value} {unit}s")
        },
    })
}
