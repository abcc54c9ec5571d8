//! Periodic card-spawn scheduling.
//!
//! Each guild gets its own ticking task; a guild's tasks are replaced, not
//! stacked, when it is rescheduled. The scheduler only emits spawn requests
//! on a channel; what a spawn does with them is the consumer's business.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One tick of a guild's spawn schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub guild_id: String,
}

pub struct SpawnScheduler {
    jobs: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
    sender: mpsc::Sender<SpawnRequest>,
}

impl SpawnScheduler {
    /// Returns the scheduler and the receiving end of its spawn channel.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SpawnRequest>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            SpawnScheduler {
                jobs: Mutex::new(HashMap::new()),
                sender,
            },
            receiver,
        )
    }

    /// Start ticking for a guild. Any previous schedule for the same guild
    /// is cancelled first, so calling this twice never doubles the rate.
    pub fn schedule_guild(&self, guild_id: &str, every: Duration) {
        self.cancel_guild(guild_id);

        let sender = self.sender.clone();
        let guild = guild_id.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately; skip it so the cadence
            // starts one full interval out.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let request = SpawnRequest {
                    guild_id: guild.clone(),
                };
                if sender.send(request).await.is_err() {
                    tracing::debug!(guild_id = %guild, "spawn channel closed, stopping ticker");
                    break;
                }
            }
        });

        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.entry(guild_id.to_string()).or_default().push(handle);
        }
        tracing::info!(guild_id, interval_secs = every.as_secs(), "guild spawn scheduled");
    }

    /// Stop all spawn tasks for a guild. Safe to call for an unscheduled
    /// guild.
    pub fn cancel_guild(&self, guild_id: &str) {
        let handles = match self.jobs.lock() {
            Ok(mut jobs) => jobs.remove(guild_id),
            Err(_) => None,
        };
        if let Some(handles) = handles {
            for handle in &handles {
                handle.abort();
            }
            tracing::info!(guild_id, tasks = handles.len(), "guild spawn cancelled");
        }
    }

    /// Abort every scheduled task. Used on shutdown.
    pub fn shutdown(&self) {
        if let Ok(mut jobs) = self.jobs.lock() {
            for handles in jobs.values() {
                for handle in handles {
                    handle.abort();
                }
            }
            jobs.clear();
        }
    }
}

impl Drop for SpawnScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
