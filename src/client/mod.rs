//! Room Synchronization Client
//!
//! The message synchronization core of the chat client: everything between
//! "the user entered a room" and "the display layer has a timeline to draw".
//!
//! # Architecture
//!
//! - **`config`** - Runtime configuration (server URL, credentials, identity)
//! - **`types`** - Identity and connection indicator
//! - **`channel`** - Channel Session over the room WebSocket
//! - **`history`** - History Loader over the room detail endpoint
//! - **`timeline`** - Timeline Merger, the ordering and dedup authority
//! - **`reconnect`** - Backoff policy for reopening a dropped channel
//! - **`room`** - Room View Controller and its display-facing handle
//! - **`main`** - `roomchat` terminal client (binary)
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs       - Module exports and documentation
//! ├── main.rs      - Terminal client entry point
//! ├── config.rs    - Configuration management
//! ├── types.rs     - Shared client types
//! ├── channel.rs   - Live channel session
//! ├── history.rs   - History snapshot fetch
//! ├── timeline.rs  - Seed/live merge
//! ├── reconnect.rs - Backoff policy
//! └── room/        - State machine and async driver
//! ```

pub mod channel;
pub mod config;
pub mod history;
pub mod reconnect;
pub mod room;
pub mod timeline;
pub mod types;

pub use channel::{ChannelSession, ChannelSink, Connector, Transport, WsConnector};
pub use config::Config;
pub use history::{HistoryLoader, HistorySnapshot, HttpHistoryLoader};
pub use reconnect::ReconnectPolicy;
pub use room::{enter_room, enter_room_with, RoomHandle, RoomSnapshot, RoomView};
pub use timeline::{MergeOutcome, TimelineMerger};
pub use types::{ConnectionState, Identity};
