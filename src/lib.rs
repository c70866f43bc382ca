//! roomchat - Main Library
//!
//! roomchat is the message synchronization core of a real-time chat client.
//! It reconciles a room's history snapshot, fetched once over HTTP, with the
//! live message stream of the room's WebSocket channel, and exposes one
//! append-only, duplicate-free timeline plus connection health to a display
//! layer.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic, serializable types
//!   - Messages, raw wire shapes and their normalization
//!   - Rooms, channel events, errors, configuration
//!
//! - **`client`** - The synchronization core
//!   - Channel Session, History Loader, Timeline Merger
//!   - Room View Controller with reconnect-with-backoff
//!   - `roomchat` terminal binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use roomchat::client::{enter_room, Config};
//! use roomchat::shared::{AppConfig, RoomId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from(AppConfig::load_default()?);
//! let room = RoomId::new("general").ok_or("bad room slug")?;
//! let mut handle = enter_room(&config, room)?;
//!
//! while handle.changed().await {
//!     let snapshot = handle.snapshot();
//!     println!("{} messages, {}", snapshot.timeline.len(), snapshot.connection);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Each room view is driven by one task that processes events to completion
//! one at a time, so the merger needs no locking. The channel session and the
//! history fetch run on their own tasks and only ever send events to it.
//!
//! # Error Handling
//!
//! - `Result<T, SyncError>` for the synchronization core
//! - `Result<T, ConfigError>` for configuration loading
//! - No error is fatal to the process; failures degrade one room view

/// Shared types and data structures
pub mod shared;

/// Room synchronization core
pub mod client;
