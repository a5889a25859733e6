//! Расписание автосохранения черновика.
//!
//! Один срок сохранения: каждое изменение откладывает его на паузу
//! `quiet_period`, но не дальше `max_wait` от первого несохранённого
//! изменения. Сам таймер живёт в UI и только спрашивает срок.

use crate::shared::config::AutoSaveConfig;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct AutoSaveScheduler {
    quiet_period: Duration,
    max_wait: Duration,
    first_dirty_at: Option<DateTime<Utc>>,
    last_change_at: Option<DateTime<Utc>>,
}

impl AutoSaveScheduler {
    pub fn new(quiet_period: Duration, max_wait: Duration) -> Self {
        Self {
            quiet_period,
            max_wait: max_wait.max(quiet_period),
            first_dirty_at: None,
            last_change_at: None,
        }
    }

    pub fn from_config(config: &AutoSaveConfig) -> Self {
        Self::new(
            Duration::seconds(config.quiet_period_secs as i64),
            Duration::seconds(config.max_wait_secs as i64),
        )
    }

    /// Зафиксировать изменение черновика
    pub fn note_mutation(&mut self, now: DateTime<Utc>) {
        if self.first_dirty_at.is_none() {
            self.first_dirty_at = Some(now);
        }
        self.last_change_at = Some(now);
    }

    /// Момент, когда черновик нужно сохранить; `None`, если сохранять нечего
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        let first = self.first_dirty_at?;
        let last = self.last_change_at?;
        Some((last + self.quiet_period).min(first + self.max_wait))
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Запись не удалась: черновик остаётся грязным, следующая попытка
    /// через `quiet_period` от момента ошибки
    pub fn retry_after_failure(&mut self, now: DateTime<Utc>) {
        self.reset();
        self.note_mutation(now);
    }

    /// Сбросить после сохранения или очистки черновика
    pub fn reset(&mut self) {
        self.first_dirty_at = None;
        self.last_change_at = None;
    }
}

impl Default for AutoSaveScheduler {
    fn default() -> Self {
        Self::new(Duration::seconds(5), Duration::seconds(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_quiet_period_restarts_on_mutation() {
        let mut scheduler = AutoSaveScheduler::default();
        assert_eq!(scheduler.deadline(), None);

        scheduler.note_mutation(at(0));
        assert_eq!(scheduler.deadline(), Some(at(5)));
        scheduler.note_mutation(at(3));
        assert_eq!(scheduler.deadline(), Some(at(8)));
        assert!(!scheduler.is_due(at(7)));
        assert!(scheduler.is_due(at(8)));
    }

    #[test]
    fn test_max_wait_caps_continuous_editing() {
        let mut scheduler = AutoSaveScheduler::default();
        for secs in (0..=40).step_by(2) {
            scheduler.note_mutation(at(secs));
        }
        assert_eq!(scheduler.deadline(), Some(at(30)));
        assert!(scheduler.is_due(at(40)));

        scheduler.reset();
        assert!(!scheduler.is_due(at(100)));
    }

    #[test]
    fn test_from_config() {
        let scheduler = AutoSaveScheduler::from_config(&AutoSaveConfig {
            quiet_period_secs: 2,
            max_wait_secs: 10,
        });
        let mut s = scheduler.clone();
        s.note_mutation(at(0));
        assert_eq!(s.deadline(), Some(at(2)));
    }

    #[test]
    fn test_retry_after_failure_rearms_deadline() {
        let mut scheduler = AutoSaveScheduler::default();
        scheduler.note_mutation(at(0));
        scheduler.retry_after_failure(at(5));
        assert_eq!(scheduler.deadline(), Some(at(10)));
        assert!(!scheduler.is_due(at(9)));
        assert!(scheduler.is_due(at(10)));
    }
}
