// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process change feed for the workout directory and chat rooms.
//!
//! Replaces ambient push-based document subscriptions with an explicit
//! observable: `subscribe_*` returns a broadcast receiver, and dropping the
//! receiver is the teardown. Slow consumers that lag past the channel
//! capacity skip ahead, which is acceptable for snapshot-style UIs that
//! re-render from the latest state.

use crate::models::{ChatMessage, Workout};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 256;

/// A change to the workout collection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkoutEvent {
    Created { workout: Workout },
    Updated { workout: Workout },
    Deleted { id: String },
}

impl WorkoutEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkoutEvent::Created { .. } => "created",
            WorkoutEvent::Updated { .. } => "updated",
            WorkoutEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Change feed hub shared across handlers.
#[derive(Clone)]
pub struct FeedService {
    workouts_tx: broadcast::Sender<WorkoutEvent>,
    chat_channels: Arc<DashMap<String, broadcast::Sender<ChatMessage>>>,
}

impl Default for FeedService {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedService {
    pub fn new() -> Self {
        let (workouts_tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            workouts_tx,
            chat_channels: Arc::new(DashMap::new()),
        }
    }

    /// Subscribe to directory changes. Drop the receiver to unsubscribe.
    pub fn subscribe_workouts(&self) -> broadcast::Receiver<WorkoutEvent> {
        self.workouts_tx.subscribe()
    }

    /// Subscribe to a workout's chat room. Drop the receiver to unsubscribe.
    pub fn subscribe_chat(&self, workout_id: &str) -> broadcast::Receiver<ChatMessage> {
        self.chat_channels
            .entry(workout_id.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    /// Publish a directory change. Lack of subscribers is not an error.
    pub fn publish_workout(&self, event: WorkoutEvent) {
        let _ = self.workouts_tx.send(event);
    }

    /// Publish a chat message to the workout's room.
    pub fn publish_chat(&self, workout_id: &str, message: ChatMessage) {
        if let Some(tx) = self.chat_channels.get(workout_id) {
            if tx.send(message).is_err() {
                // All receivers are gone; drop the channel so idle rooms
                // don't accumulate.
                drop(tx);
                self.chat_channels
                    .remove_if(workout_id, |_, tx| tx.receiver_count() == 0);
            }
        }
    }
}
