//! Daily operator reminders.

use chrono::{NaiveTime, Timelike};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reminder {
    /// 07:50, time to start the machine.
    StartMachine,
    /// 15:50, time to fill in the production sheet.
    CompleteSheet,
}

impl Reminder {
    pub const ALL: [Reminder; 2] = [Reminder::StartMachine, Reminder::CompleteSheet];

    /// Hour and minute at which the reminder fires.
    pub fn at(&self) -> (u32, u32) {
        match self {
            Reminder::StartMachine => (7, 50),
            Reminder::CompleteSheet => (15, 50),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Reminder::StartMachine => {
                "Il est l'heure de démarrer la machine. N'oubliez pas d'enregistrer l'heure de début."
            }
            Reminder::CompleteSheet => {
                "La journée est bientôt finie. N'oubliez pas de compléter la fiche de production."
            }
        }
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OxyTrack Rappel: {}", self.message())
    }
}

/// Tracks which reminders already fired today.
///
/// Meant to be checked once a minute. Each reminder fires at most once per
/// day; the flags reset when a check lands on midnight.
#[derive(Debug, Default)]
pub struct ReminderSchedule {
    start_machine_sent: bool,
    complete_sheet_sent: bool,
}

impl ReminderSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, now: NaiveTime) -> Option<Reminder> {
        let at = (now.hour(), now.minute());
        if at == (0, 0) {
            self.start_machine_sent = false;
            self.complete_sheet_sent = false;
        }

        for reminder in Reminder::ALL {
            if reminder.at() != at {
                continue;
            }
            let sent = match reminder {
                Reminder::StartMachine => &mut self.start_machine_sent,
                Reminder::CompleteSheet => &mut self.complete_sheet_sent,
            };
            if !*sent {
                *sent = true;
                return Some(reminder);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_fires_once_per_day() {
        let mut schedule = ReminderSchedule::new();
        assert_eq!(schedule.check(time(7, 49)), None);
        assert_eq!(schedule.check(time(7, 50)), Some(Reminder::StartMachine));
        assert_eq!(schedule.check(time(7, 50)), None);
        assert_eq!(schedule.check(time(15, 50)), Some(Reminder::CompleteSheet));
        assert_eq!(schedule.check(time(15, 50)), None);
    }

    #[test]
    fn test_midnight_resets() {
        let mut schedule = ReminderSchedule::new();
        schedule.check(time(7, 50));
        schedule.check(time(0, 0));
        assert_eq!(schedule.check(time(7, 50)), Some(Reminder::StartMachine));
    }
}
