//! Long-running commands: live remote mirror and operator reminders.

use chrono::Local;
use clap::Args;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use oxytrack_core::ReminderSchedule;

use crate::context::{print_notification, AppContext};

/// Follow the server and print changes as they arrive
#[derive(Args)]
pub struct WatchCommand {
    /// Also print the daily operator reminders
    #[arg(long)]
    remind: bool,
}

impl WatchCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let store = &ctx.store;
        if !store.has_remote() {
            return Err("Sync is not configured. See 'oxy sync status'.".into());
        }

        ctx.block_on(async {
            let subscriptions = store.subscribe_remote()?;
            let mut productions = store.watch_production_entries();
            let mut sales = store.watch_sale_entries();
            let mut settings = store.watch_settings();
            let mut notifications = store.notifications();
            let mut schedule = ReminderSchedule::new();
            let mut minute = tokio::time::interval(Duration::from_secs(60));

            let url = ctx.config.remote_url.value.as_deref().unwrap_or("-");
            println!("Watching {} (Ctrl-C to stop)", url);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,

                    Ok(()) = productions.changed() => {
                        let entries = productions.borrow_and_update().clone();
                        let in_progress = entries.iter().filter(|e| !e.is_completed()).count();
                        println!(
                            "[{}] productions: {} ({} in progress)",
                            Local::now().format("%H:%M:%S"),
                            entries.len(),
                            in_progress
                        );
                    }

                    Ok(()) = sales.changed() => {
                        let entries = sales.borrow_and_update().clone();
                        let pending = entries.iter().filter(|s| !s.is_completed()).count();
                        println!(
                            "[{}] sales: {} ({} awaiting recovery)",
                            Local::now().format("%H:%M:%S"),
                            entries.len(),
                            pending
                        );
                    }

                    Ok(()) = settings.changed() => {
                        let current = settings.borrow_and_update().clone();
                        println!(
                            "[{}] settings: {} / {}",
                            Local::now().format("%H:%M:%S"),
                            current.company_name,
                            current.default_producer
                        );
                    }

                    received = notifications.recv() => match received {
                        Ok(notification) => print_notification(&notification),
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },

                    _ = minute.tick(), if self.remind => {
                        if let Some(reminder) = schedule.check(Local::now().time()) {
                            println!("{}", reminder);
                        }
                    }
                }
            }

            drop(subscriptions);
            Ok::<(), oxytrack_core::StoreError>(())
        })?;

        println!("Stopped with {} in the local store.", summary(ctx));
        Ok(())
    }
}

fn summary(ctx: &AppContext<'_>) -> String {
    format!(
        "{} production run(s) and {} sale(s)",
        ctx.store.production_entries().len(),
        ctx.store.sale_entries().len()
    )
}

/// Print the 07:50 and 15:50 operator reminders
#[derive(Args)]
pub struct RemindCommand {
    /// Check once against the current time and exit
    #[arg(long)]
    once: bool,
}

impl RemindCommand {
    pub fn run(&self, ctx: &AppContext<'_>) -> Result<(), Box<dyn std::error::Error>> {
        let mut schedule = ReminderSchedule::new();

        if self.once {
            if let Some(reminder) = schedule.check(Local::now().time()) {
                println!("{}", reminder);
            }
            return Ok(());
        }

        println!("Reminders at 07:50 and 15:50 (Ctrl-C to stop)");
        ctx.block_on(async {
            let mut minute = tokio::time::interval(Duration::from_secs(60));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = minute.tick() => {
                        if let Some(reminder) = schedule.check(Local::now().time()) {
                            println!("[{}] {}", Local::now().format("%H:%M"), reminder);
                        }
                    }
                }
            }
        });
        Ok(())
    }
}
