/// Player engine: the single serialized loop driving every session
///
/// Socket events, user commands and hook feedback all funnel into one task,
/// so every registry and multicaster mutation is atomic with respect to
/// observers - the Rust rendition of the cooperative single-threaded model
/// the connection layer is specified against. Ordering falls out of the
/// channels: events of one connection arrive in order on the event channel,
/// and within one event the multicaster notifies listeners in registration
/// order.
use std::collections::HashMap;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::Arc;

use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };
use tokio::task::JoinHandle;

use crate::audio::{ AudioSink, Codec };
use crate::config::{ AudioSettings, ChannelSettings };
use crate::connection::{
    ConnectionKey,
    ConnectionRegistry,
    ListenerMulticaster,
    SocketEvent,
    SocketEventRx,
    Transport,
};
use crate::logger::{ self, LogTag };
use crate::session::{ PlaybackSession, SessionFeedback, SessionId };

pub enum PlayerCommand {
    AddSession {
        id: SessionId,
        channel: ChannelSettings,
        audio: AudioSettings,
        codec: Arc<dyn Codec>,
        sink: Arc<dyn AudioSink>,
    },
    TogglePlay {
        session: SessionId,
    },
    SetChannel {
        session: SessionId,
        channel: ChannelSettings,
    },
    SetGain {
        session: SessionId,
        gain: f32,
    },
    Shutdown,
}

/// Cheap cloneable handle for driving the engine from anywhere
#[derive(Clone)]
pub struct PlayerHandle {
    commands: UnboundedSender<PlayerCommand>,
    next_session_id: Arc<AtomicU64>,
}

impl PlayerHandle {
    /// Create a session subscribed to the channel's status feed; returns its id
    pub fn add_session(
        &self,
        channel: ChannelSettings,
        audio: AudioSettings,
        codec: Arc<dyn Codec>,
        sink: Arc<dyn AudioSink>
    ) -> SessionId {
        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        let _ = self.commands.send(PlayerCommand::AddSession {
            id,
            channel,
            audio,
            codec,
            sink,
        });
        id
    }

    pub fn toggle_play(&self, session: SessionId) {
        let _ = self.commands.send(PlayerCommand::TogglePlay { session });
    }

    pub fn set_channel(&self, session: SessionId, channel: ChannelSettings) {
        let _ = self.commands.send(PlayerCommand::SetChannel { session, channel });
    }

    pub fn set_gain(&self, session: SessionId, gain: f32) {
        let _ = self.commands.send(PlayerCommand::SetGain { session, gain });
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
    }
}

pub struct Player {
    registry: ConnectionRegistry,
    multicaster: ListenerMulticaster,
    sessions: HashMap<SessionId, PlaybackSession>,
    command_rx: UnboundedReceiver<PlayerCommand>,
    event_rx: SocketEventRx,
    feedback_rx: UnboundedReceiver<SessionFeedback>,
    feedback_tx: UnboundedSender<SessionFeedback>,
}

impl Player {
    pub fn new(transport: Arc<dyn Transport>) -> (Self, PlayerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

        let player = Self {
            registry: ConnectionRegistry::new(transport, event_tx),
            multicaster: ListenerMulticaster::new(),
            sessions: HashMap::new(),
            command_rx,
            event_rx,
            feedback_rx,
            feedback_tx,
        };

        let handle = PlayerHandle {
            commands: command_tx,
            next_session_id: Arc::new(AtomicU64::new(1)),
        };

        (player, handle)
    }

    /// Construct and run the engine on a background task
    pub fn spawn(transport: Arc<dyn Transport>) -> (PlayerHandle, JoinHandle<()>) {
        let (player, handle) = Self::new(transport);
        let join = tokio::spawn(player.run());
        (handle, join)
    }

    /// Serialized event loop; returns after a Shutdown command
    pub async fn run(mut self) {
        logger::info(LogTag::System, "Player engine started");

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some((key, event)) = self.event_rx.recv() => {
                    self.handle_socket_event(key, event);
                }
                Some(feedback) = self.feedback_rx.recv() => {
                    self.handle_feedback(feedback);
                }
                else => {
                    break;
                }
            }
        }

        self.shutdown();
        logger::info(LogTag::System, "Player engine stopped");
    }

    /// Apply one user command; returns false on Shutdown
    fn handle_command(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::AddSession { id, channel, audio, codec, sink } => {
                let mut session = PlaybackSession::new(
                    id,
                    channel,
                    &audio,
                    codec,
                    sink,
                    self.feedback_tx.clone()
                );
                session.attach_status(&mut self.registry, &mut self.multicaster);
                logger::info(
                    LogTag::Session,
                    &format!("Session {}: created on {}", id, session.status_key())
                );
                self.sessions.insert(id, session);
            }
            PlayerCommand::TogglePlay { session } => {
                if let Some(session) = self.sessions.get_mut(&session) {
                    session.toggle_play(&mut self.registry, &mut self.multicaster);
                }
            }
            PlayerCommand::SetChannel { session, channel } => {
                if let Some(session) = self.sessions.get_mut(&session) {
                    session.set_channel(&mut self.registry, &mut self.multicaster, channel);
                }
            }
            PlayerCommand::SetGain { session, gain } => {
                if let Some(session) = self.sessions.get_mut(&session) {
                    session.set_gain(gain);
                }
            }
            PlayerCommand::Shutdown => {
                return false;
            }
        }
        true
    }

    /// Route one raw socket event
    ///
    /// A close removes the registry entry first, unconditionally, so a
    /// listener re-acquiring from its on_close hook gets a fresh connection.
    fn handle_socket_event(&mut self, key: ConnectionKey, event: SocketEvent) {
        if matches!(event, SocketEvent::Closed) {
            self.registry.handle_transport_closed(&key);
        }
        self.multicaster.dispatch(&key, &event);
    }

    /// Apply deferred work a hook queued during dispatch
    ///
    /// Feedback is generation-stamped: commands handled between the dispatch
    /// that queued it and this drain may have replaced the subscription it
    /// refers to, and stale feedback must not touch the replacement.
    fn handle_feedback(&mut self, feedback: SessionFeedback) {
        match feedback {
            SessionFeedback::DataClosed { session, playback } => {
                if let Some(session) = self.sessions.get_mut(&session) {
                    session.handle_data_closed(&mut self.multicaster, playback);
                }
            }
            SessionFeedback::StatusClosed { session, attach } => {
                if let Some(session) = self.sessions.get_mut(&session) {
                    // Re-attach once so the talker indicator keeps tracking
                    // the channel; the registry entry is already gone, so
                    // this opens a fresh status connection. No retry loop.
                    if session.handle_status_closed(&mut self.multicaster, attach) {
                        session.attach_status(&mut self.registry, &mut self.multicaster);
                    }
                }
            }
        }
    }

    fn shutdown(&mut self) {
        for (_, session) in self.sessions.iter_mut() {
            session.detach(&mut self.registry, &mut self.multicaster);
        }
        self.sessions.clear();
        self.registry.shutdown();
    }
}
