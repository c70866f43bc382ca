//! Room driver
//!
//! The async half of the room view controller. `enter_room` opens the
//! channel and starts the history fetch concurrently, then spawns a driver
//! task that admits one event at a time into the [`RoomView`]: history
//! completion, channel events, reconnect deadlines and user commands. After
//! each event the driver publishes a [`RoomSnapshot`] on a watch channel.
//!
//! Reconnect-with-backoff lives here: when the channel drops, the driver
//! schedules a new [`ChannelSession`] per the [`ReconnectPolicy`] and
//! attaches it to the same view, so the timeline survives.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::client::channel::{ChannelSession, Connector, WsConnector};
use crate::client::config::Config;
use crate::client::history::{HistoryLoader, HistorySnapshot, HttpHistoryLoader};
use crate::client::reconnect::ReconnectPolicy;
use crate::client::room::state::{validate_send, RoomEvent, RoomSnapshot, RoomView};
use crate::client::types::Identity;
use crate::shared::error::{SendRejection, SyncError};
use crate::shared::event::ChannelEvent;
use crate::shared::room::{RoomId, RoomState};

type HistoryTask = JoinHandle<Result<HistorySnapshot, SyncError>>;
type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

#[derive(Debug)]
enum RoomCommand {
    Send {
        body: String,
        reply: oneshot::Sender<Result<(), SyncError>>,
    },
    SetInput { text: String },
    SubmitInput { reply: oneshot::Sender<Result<(), SyncError>> },
    Leave,
}

/// Enter a room using the configured server, credentials and identity
///
/// Fails with `MissingIdentity` when no identity is configured. Must be
/// called inside a tokio runtime.
pub fn enter_room(config: &Config, room: RoomId) -> Result<RoomHandle, SyncError> {
    let identity = config.identity().cloned().ok_or(SyncError::MissingIdentity)?;
    let connector = Arc::new(WsConnector::new(config.clone()));
    let loader = Arc::new(HttpHistoryLoader::new(config.clone()));
    Ok(enter_room_with(
        connector,
        loader,
        identity,
        room,
        config.reconnect_policy(),
    ))
}

/// Enter a room with explicit collaborators
pub fn enter_room_with<C: Connector, L: HistoryLoader>(
    connector: Arc<C>,
    loader: Arc<L>,
    identity: Identity,
    room: RoomId,
    policy: ReconnectPolicy,
) -> RoomHandle {
    let mut view = RoomView::new(room.clone(), identity);

    let (session, channel_rx) = ChannelSession::open(Arc::clone(&connector), room.clone());
    view.attach_channel(session);

    let history = view.begin_history().then(|| {
        let room = room.clone();
        tokio::spawn(async move { loader.load(&room).await })
    });

    let (snapshot_tx, snapshot_rx) = watch::channel(view.snapshot());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let driver = RoomDriver {
        view,
        connector,
        policy,
        history,
        channel_rx: Some(channel_rx),
        cmd_rx,
        snapshot_tx,
        reconnect_at: None,
        attempt: 0,
    };
    let task = tokio::spawn(driver.run());

    RoomHandle {
        room,
        cmd_tx,
        snapshot_rx,
        task: Some(task),
    }
}

struct RoomDriver<C: Connector> {
    view: RoomView<ChannelSession>,
    connector: Arc<C>,
    policy: ReconnectPolicy,
    history: Option<HistoryTask>,
    channel_rx: Option<ChannelEvents>,
    cmd_rx: mpsc::UnboundedReceiver<RoomCommand>,
    snapshot_tx: watch::Sender<RoomSnapshot>,
    reconnect_at: Option<Instant>,
    /// Reconnect attempts since the channel was last open
    attempt: u32,
}

impl<C: Connector> RoomDriver<C> {
    async fn run(mut self) {
        loop {
            let deadline = self.reconnect_at.unwrap_or_else(Instant::now);
            let has_history = self.history.is_some();
            let has_channel = self.channel_rx.is_some();
            let has_deadline = self.reconnect_at.is_some();

            // channel events queued before a command are applied first, so a
            // send after a drop sees the degraded state
            tokio::select! {
                biased;

                result = join_history(&mut self.history, self.view.room()), if has_history => {
                    self.history = None;
                    self.view.apply(RoomEvent::History(result));
                }
                event = recv_channel(&mut self.channel_rx), if has_channel => match event {
                    Some(event) => self.on_channel_event(event),
                    None => self.channel_rx = None,
                },
                _ = sleep_until(deadline), if has_deadline => {
                    self.reconnect_at = None;
                    self.reconnect();
                }
                command = self.cmd_rx.recv() => match command {
                    Some(RoomCommand::Send { body, reply }) => {
                        let result = self.view.send(&body);
                        if let Err(e) = &result {
                            tracing::warn!("[ROOM] Send to {} rejected: {}", self.view.room(), e);
                        }
                        let _ = reply.send(result);
                    }
                    Some(RoomCommand::SetInput { text }) => self.view.set_input(text),
                    Some(RoomCommand::SubmitInput { reply }) => {
                        let _ = reply.send(self.view.submit_input());
                    }
                    Some(RoomCommand::Leave) | None => {
                        self.exit();
                        break;
                    }
                },
            }

            self.publish();
        }
    }

    fn on_channel_event(&mut self, event: ChannelEvent) {
        let closed = matches!(event, ChannelEvent::Closed { .. });
        if matches!(event, ChannelEvent::Opened) {
            self.attempt = 0;
        }

        self.view.apply(RoomEvent::Channel(event));

        if closed && self.view.state() == RoomState::Degraded {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.policy.next_delay(self.attempt) {
            Some(delay) => {
                self.attempt += 1;
                tracing::info!(
                    "[ROOM] Reconnecting to {} in {:?} (attempt {}/{})",
                    self.view.room(),
                    delay,
                    self.attempt,
                    self.policy.max_attempts
                );
                self.reconnect_at = Some(Instant::now() + delay);
                self.view.set_reconnect_attempt(Some(self.attempt));
            }
            None if self.policy.is_enabled() => {
                tracing::warn!(
                    "[ROOM] Giving up on {} after {} reconnect attempts",
                    self.view.room(),
                    self.attempt
                );
                self.view.set_reconnect_attempt(None);
            }
            None => {}
        }
    }

    fn reconnect(&mut self) {
        if !self.view.is_alive() {
            return;
        }
        let (session, channel_rx) =
            ChannelSession::open(Arc::clone(&self.connector), self.view.room().clone());
        self.view.attach_channel(session);
        self.channel_rx = Some(channel_rx);
    }

    fn exit(&mut self) {
        self.view.leave();
        self.reconnect_at = None;
        if let Some(history) = self.history.take() {
            history.abort();
        }
        self.channel_rx = None;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.view.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

async fn join_history(
    task: &mut Option<HistoryTask>,
    room: &RoomId,
) -> Result<HistorySnapshot, SyncError> {
    match task {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::history(room.as_str(), format!("history task failed: {}", e))),
        },
        None => std::future::pending().await,
    }
}

async fn recv_channel(rx: &mut Option<ChannelEvents>) -> Option<ChannelEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Display-facing handle to an entered room
///
/// Dropping the handle leaves the room.
#[derive(Debug)]
pub struct RoomHandle {
    room: RoomId,
    cmd_tx: mpsc::UnboundedSender<RoomCommand>,
    snapshot_rx: watch::Receiver<RoomSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl RoomHandle {
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn state(&self) -> RoomState {
        self.snapshot_rx.borrow().state
    }

    /// Wait for the next published snapshot; `false` once the room has exited
    pub async fn changed(&mut self) -> bool {
        self.snapshot_rx.changed().await.is_ok()
    }

    /// A separate receiver of snapshots
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Send a message
    ///
    /// A blank body or a room that is not live is rejected without reaching
    /// the channel. The driver checks again against its own state, so a drop
    /// not yet visible in the latest snapshot still rejects the send.
    pub async fn send(&self, body: impl Into<String>) -> Result<(), SyncError> {
        let exited = || SyncError::rejected(SendRejection::NotLive(RoomState::Exited));
        let body = body.into();
        validate_send(self.state(), &body)?;
        let (reply, response) = oneshot::channel();
        self.cmd_tx
            .send(RoomCommand::Send { body, reply })
            .map_err(|_| exited())?;
        response.await.map_err(|_| exited())?
    }

    /// Replace the draft input
    pub fn set_input(&self, text: impl Into<String>) {
        let _ = self.cmd_tx.send(RoomCommand::SetInput { text: text.into() });
    }

    /// Send the draft input, clearing it on success
    pub async fn submit_input(&self) -> Result<(), SyncError> {
        let exited = || SyncError::rejected(SendRejection::NotLive(RoomState::Exited));
        let (reply, response) = oneshot::channel();
        self.cmd_tx
            .send(RoomCommand::SubmitInput { reply })
            .map_err(|_| exited())?;
        response.await.map_err(|_| exited())?
    }

    /// Leave the room; safe to call repeatedly
    pub fn leave(&self) {
        let _ = self.cmd_tx.send(RoomCommand::Leave);
    }

    /// Wait until the driver has exited
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RoomHandle {
    fn drop(&mut self) {
        self.leave();
    }
}
