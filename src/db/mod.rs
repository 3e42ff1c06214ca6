//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUTS: &str = "workouts";
    /// Parent collection of per-workout chat namespaces
    pub const WORKOUT_CHATS: &str = "workoutChats";
    /// Messages subcollection under `workoutChats/{workout}`
    pub const MESSAGES: &str = "messages";
}
