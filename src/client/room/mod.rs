//! Room View Controller
//!
//! Orchestrates the channel session, the history loader and the timeline
//! merger for the lifetime of being in one room.
//!
//! - **`state`** - `RoomView`, the synchronous state machine
//!   (`Entering -> Live <-> Degraded -> Exited`) and `RoomSnapshot`
//! - **`driver`** - `enter_room`, the async event loop with reconnect, and
//!   `RoomHandle` for the display layer

pub mod driver;
pub mod state;

pub use driver::{enter_room, enter_room_with, RoomHandle};
pub use state::{validate_send, RoomEvent, RoomSnapshot, RoomView};
