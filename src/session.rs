/// Per-widget playback session: ties user play/stop, channel changes, the
/// connection layer and the audio pipeline together
///
/// A session is Idle or Playing. The status subscription is independent of
/// play state - it is attached when the session is created and follows the
/// session across channel changes, driving the "active talker" indicator the
/// whole time. The data subscription exists only while Playing.
///
/// Listener hooks run on the engine loop and only touch the session's shared
/// state behind its own lock; anything that needs the registry or multicaster
/// (a close forcing the session idle) goes back through the feedback channel.
use std::sync::{ Arc, Mutex };

use tokio::sync::mpsc::UnboundedSender;

use crate::arguments::{ is_debug_session_enabled, is_debug_status_enabled };
use crate::audio::{ clamp_gain, AudioSink, Codec, StreamAssembler, SAMPLE_RATE };
use crate::config::{ AudioSettings, ChannelSettings };
use crate::connection::{
    ConnectionKey,
    ConnectionRegistry,
    ListenerHooks,
    ListenerMulticaster,
    ListenerToken,
};
use crate::logger::{ self, LogTag };
use crate::protocol;

pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
}

/// Follow-up work a hook asks the engine to do on its behalf
///
/// Feedback travels through a channel and may be drained after further user
/// commands have already run, so each message carries the subscription
/// generation it was queued for. Feedback whose generation no longer matches
/// the session's current subscription is stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFeedback {
    /// The data transport closed underneath a playing session
    DataClosed {
        session: SessionId,
        playback: u64,
    },
    /// The status transport closed; the engine re-attaches the feed once
    StatusClosed {
        session: SessionId,
        attach: u64,
    },
}

/// State the listener hooks share with the session
struct SessionShared {
    assembler: StreamAssembler,
    gain: f32,
    displayed_call: String,
    idle_label: String,
    reflector: String,
    module: String,
}

pub struct PlaybackSession {
    id: SessionId,
    channel: ChannelSettings,
    state: SessionState,
    data_token: Option<ListenerToken>,
    status_token: Option<ListenerToken>,
    /// Bumped on every start_playback; stamps the data hooks' feedback
    playback_generation: u64,
    /// Bumped on every attach_status; stamps the status hooks' feedback
    status_generation: u64,
    shared: Arc<Mutex<SessionShared>>,
    codec: Arc<dyn Codec>,
    sink: Arc<dyn AudioSink>,
    feedback: UnboundedSender<SessionFeedback>,
}

impl PlaybackSession {
    pub fn new(
        id: SessionId,
        channel: ChannelSettings,
        audio: &AudioSettings,
        codec: Arc<dyn Codec>,
        sink: Arc<dyn AudioSink>,
        feedback: UnboundedSender<SessionFeedback>
    ) -> Self {
        let shared = SessionShared {
            assembler: StreamAssembler::new(),
            gain: clamp_gain(audio.gain),
            displayed_call: audio.idle_label.clone(),
            idle_label: audio.idle_label.clone(),
            reflector: channel.reflector.clone(),
            module: channel.module.clone(),
        };

        Self {
            id,
            channel,
            state: SessionState::Idle,
            data_token: None,
            status_token: None,
            playback_generation: 0,
            status_generation: 0,
            shared: Arc::new(Mutex::new(shared)),
            codec,
            sink,
            feedback,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn channel(&self) -> &ChannelSettings {
        &self.channel
    }

    pub fn data_key(&self) -> ConnectionKey {
        ConnectionKey::data(&self.channel.proxy, &self.channel.reflector, &self.channel.module)
    }

    pub fn status_key(&self) -> ConnectionKey {
        ConnectionKey::status(&self.channel.proxy)
    }

    /// Currently displayed talker callsign (the idle label when quiet)
    pub fn displayed_call(&self) -> String {
        self.shared.lock().unwrap().displayed_call.clone()
    }

    pub fn gain(&self) -> f32 {
        self.shared.lock().unwrap().gain
    }

    /// Subscribe to the proxy's status feed; called once at creation and
    /// again after every channel change
    pub fn attach_status(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster
    ) {
        self.status_generation += 1;
        let token = multicaster.register(&self.status_key(), self.status_hooks());
        registry.acquire_status(&self.channel.proxy);
        self.status_token = Some(token);
    }

    /// User toggled play
    pub fn toggle_play(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster
    ) {
        match self.state {
            SessionState::Idle => self.start_playback(registry, multicaster),
            SessionState::Playing => self.stop_playback(registry, multicaster),
        }
    }

    fn start_playback(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster
    ) {
        {
            let mut shared = self.shared.lock().unwrap();
            shared.assembler.reset();
        }

        // Register before acquiring so the Open event is already heard
        self.playback_generation += 1;
        let key = self.data_key();
        let token = multicaster.register(&key, self.data_hooks());
        registry.acquire_data(&self.channel.proxy, &self.channel.reflector, &self.channel.module);
        self.data_token = Some(token);
        self.state = SessionState::Playing;

        logger::info(LogTag::Session, &format!("Session {}: playing {}", self.id, key));
    }

    fn stop_playback(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster
    ) {
        let key = self.data_key();
        if let Some(token) = self.data_token.take() {
            multicaster.unregister(&key, token);
        }
        registry.release(&key);
        self.reset_to_idle();

        logger::info(LogTag::Session, &format!("Session {}: stopped {}", self.id, key));
    }

    /// The data transport closed underneath us (engine feedback path)
    ///
    /// The registry entry is already gone, so there is no reference left to
    /// release; the stale listener is tombstoned and the session forced idle.
    /// Feedback stamped with an older playback generation belongs to a
    /// playback the user has since stopped or restarted and is dropped, so a
    /// restarted playback keeps its fresh listener and registry reference.
    pub fn handle_data_closed(&mut self, multicaster: &mut ListenerMulticaster, playback: u64) {
        if playback != self.playback_generation {
            if is_debug_session_enabled() {
                logger::debug(
                    LogTag::Session,
                    &format!(
                        "Session {}: ignoring close for playback {} (now {})",
                        self.id,
                        playback,
                        self.playback_generation
                    )
                );
            }
            return;
        }

        if let Some(token) = self.data_token.take() {
            multicaster.unregister(&self.data_key(), token);
        }
        if self.state == SessionState::Playing {
            logger::warning(
                LogTag::Session,
                &format!("Session {}: data connection closed, stopping", self.id)
            );
        }
        self.reset_to_idle();
    }

    /// The status transport closed; drop the stale token
    ///
    /// Returns true when the close was for the current attach, in which case
    /// the engine re-attaches the feed once so the talker indicator keeps
    /// tracking the channel. Feedback for a superseded attach is dropped.
    pub fn handle_status_closed(
        &mut self,
        multicaster: &mut ListenerMulticaster,
        attach: u64
    ) -> bool {
        if attach != self.status_generation {
            return false;
        }
        if let Some(token) = self.status_token.take() {
            multicaster.unregister(&self.status_key(), token);
        }
        logger::warning(LogTag::Status, &format!("Session {}: status feed closed", self.id));
        true
    }

    /// Retune to a different (proxy, reflector, module) triple
    ///
    /// While Playing the old data listener is unregistered (releasing the old
    /// key's reference) before the fresh listener registers against the new
    /// key, so a stale listener never hears events addressed to the channel
    /// the session has left. While Idle only the status subscription moves.
    pub fn set_channel(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster,
        channel: ChannelSettings
    ) {
        if channel == self.channel {
            return;
        }

        let was_playing = self.state == SessionState::Playing;
        if was_playing {
            self.stop_playback(registry, multicaster);
        }

        if let Some(token) = self.status_token.take() {
            multicaster.unregister(&self.status_key(), token);
        }
        registry.release(&self.status_key());

        if is_debug_session_enabled() {
            logger::debug(
                LogTag::Session,
                &format!(
                    "Session {}: retuning {} -> {}/{}/{}",
                    self.id,
                    self.data_key(),
                    channel.proxy,
                    channel.reflector,
                    channel.module
                )
            );
        }

        self.channel = channel;
        {
            let mut shared = self.shared.lock().unwrap();
            shared.reflector = self.channel.reflector.clone();
            shared.module = self.channel.module.clone();
            shared.assembler.reset();
            shared.displayed_call = shared.idle_label.clone();
        }

        self.attach_status(registry, multicaster);
        if was_playing {
            self.start_playback(registry, multicaster);
        }
    }

    /// Adjust playback gain, clamped to [0, 4]
    pub fn set_gain(&mut self, gain: f32) {
        let mut shared = self.shared.lock().unwrap();
        shared.gain = clamp_gain(gain);
    }

    /// Tear down every subscription this session holds (engine shutdown)
    pub fn detach(
        &mut self,
        registry: &mut ConnectionRegistry,
        multicaster: &mut ListenerMulticaster
    ) {
        if self.state == SessionState::Playing {
            self.stop_playback(registry, multicaster);
        }
        if let Some(token) = self.status_token.take() {
            multicaster.unregister(&self.status_key(), token);
        }
    }

    fn reset_to_idle(&mut self) {
        self.state = SessionState::Idle;
        let mut shared = self.shared.lock().unwrap();
        shared.assembler.reset();
        shared.displayed_call = shared.idle_label.clone();
    }

    fn data_hooks(&self) -> ListenerHooks {
        let id = self.id;
        let playback = self.playback_generation;
        let shared = self.shared.clone();
        let codec = self.codec.clone();
        let sink = self.sink.clone();
        let feedback = self.feedback.clone();

        ListenerHooks::new()
            .on_open(move || {
                if is_debug_session_enabled() {
                    logger::debug(LogTag::Session, &format!("Session {}: data open", id));
                }
            })
            .on_message(move |text| {
                handle_voice_text(id, &shared, codec.as_ref(), sink.as_ref(), text);
            })
            .on_error(move |err| {
                logger::warning(
                    LogTag::Session,
                    &format!("Session {}: data transport error: {}", id, err)
                );
            })
            .on_close(move || {
                let _ = feedback.send(SessionFeedback::DataClosed { session: id, playback });
            })
    }

    fn status_hooks(&self) -> ListenerHooks {
        let id = self.id;
        let attach = self.status_generation;
        let shared = self.shared.clone();
        let feedback = self.feedback.clone();

        ListenerHooks::new()
            .on_message(move |text| {
                handle_status_text(id, &shared, text);
            })
            .on_close(move || {
                let _ = feedback.send(SessionFeedback::StatusClosed { session: id, attach });
            })
    }
}

/// Process one data-connection frame: talker indicator, buffering, decode,
/// playback
fn handle_voice_text(
    id: SessionId,
    shared: &Arc<Mutex<SessionShared>>,
    codec: &dyn Codec,
    sink: &dyn AudioSink,
    text: &str
) {
    let frame = match protocol::parse_voice_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            // Malformed frames are dropped; the connection stays up
            logger::warning(LogTag::Session, &format!("Session {}: {}", id, e));
            return;
        }
    };

    let flushed = {
        let mut s = shared.lock().unwrap();

        if frame.done {
            s.displayed_call = s.idle_label.clone();
        } else if let Some(call) = frame.src_call.as_deref() {
            if !call.is_empty() {
                s.displayed_call = call.to_string();
            }
        }

        s.assembler
            .append(&frame.c2_stream, frame.done)
            .map(|run| (run, s.gain))
    };

    // Decode outside the session lock; the flushed run is owned
    if let Some((run, gain)) = flushed {
        match codec.decode(&run) {
            Ok(samples) => sink.schedule_playback(samples, SAMPLE_RATE, gain),
            Err(e) => {
                logger::warning(LogTag::Audio, &format!("Session {}: decode failed: {}", id, e));
            }
        }
    }
}

/// Process one status-connection frame: filter for this session's channel and
/// update the talker indicator
fn handle_status_text(id: SessionId, shared: &Arc<Mutex<SessionShared>>, text: &str) {
    let entries = match protocol::parse_status_frame(text) {
        Ok(entries) => entries,
        Err(e) => {
            logger::warning(LogTag::Status, &format!("Session {}: {}", id, e));
            return;
        }
    };

    let mut s = shared.lock().unwrap();
    for entry in entries {
        if entry.reflector == s.reflector && entry.module == s.module {
            s.displayed_call = if entry.active_qso {
                entry.last_qso_call.clone()
            } else {
                s.idle_label.clone()
            };

            if is_debug_status_enabled() {
                logger::debug(
                    LogTag::Status,
                    &format!(
                        "Session {}: {} module {} talker '{}'",
                        id,
                        entry.reflector,
                        entry.module,
                        s.displayed_call
                    )
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{ self, UnboundedReceiver };

    use super::*;
    use crate::audio::testing::{ RecordingCodec, RecordingSink };
    use crate::connection::transport::testing::MockTransport;
    use crate::connection::types::{ SocketEvent, SocketEventRx };

    struct Fixture {
        registry: ConnectionRegistry,
        multicaster: ListenerMulticaster,
        transport: Arc<MockTransport>,
        feedback_rx: UnboundedReceiver<SessionFeedback>,
        feedback_tx: UnboundedSender<SessionFeedback>,
        _event_rx: SocketEventRx,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();
        Fixture {
            registry: ConnectionRegistry::new(transport.clone(), event_tx),
            multicaster: ListenerMulticaster::new(),
            transport,
            feedback_rx,
            feedback_tx,
            _event_rx: event_rx,
        }
    }

    fn channel() -> ChannelSettings {
        ChannelSettings {
            proxy: "p.example.org".to_string(),
            reflector: "M17-M17".to_string(),
            module: "C".to_string(),
        }
    }

    fn audio() -> AudioSettings {
        AudioSettings {
            gain: 1.0,
            idle_label: "--------".to_string(),
        }
    }

    fn session_with(
        fx: &Fixture,
        id: SessionId,
        codec: Arc<dyn Codec>,
        sink: Arc<dyn AudioSink>
    ) -> PlaybackSession {
        PlaybackSession::new(id, channel(), &audio(), codec, sink, fx.feedback_tx.clone())
    }

    fn voice_json(bytes: usize, done: bool, src_call: Option<&str>) -> String {
        let stream: Vec<u8> = (0..bytes).map(|i| (i % 256) as u8).collect();
        serde_json
            ::to_string(
                &(crate::protocol::VoiceFrame {
                    c2_stream: stream,
                    done,
                    src_call: src_call.map(|s| s.to_string()),
                })
            )
            .unwrap()
    }

    #[test]
    fn test_toggle_play_acquires_and_releases() {
        let mut fx = fixture();
        let codec = Arc::new(RecordingCodec::default());
        let sink = Arc::new(RecordingSink::default());
        let mut session = session_with(&fx, 1, codec, sink);

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        assert!(fx.registry.contains(&session.status_key()));
        assert_eq!(session.state(), SessionState::Idle);

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        assert!(session.is_playing());
        assert_eq!(fx.registry.refcount(&session.data_key()), Some(1));
        assert_eq!(fx.multicaster.active_listener_count(&session.data_key()), 1);

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!fx.registry.contains(&session.data_key()));
        assert_eq!(fx.multicaster.active_listener_count(&session.data_key()), 0);

        // The status subscription is untouched by play state
        assert!(fx.registry.contains(&session.status_key()));
    }

    #[test]
    fn test_two_sessions_share_the_data_connection() {
        let mut fx = fixture();
        let mut a = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );
        let mut b = session_with(
            &fx,
            2,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        a.toggle_play(&mut fx.registry, &mut fx.multicaster);
        b.toggle_play(&mut fx.registry, &mut fx.multicaster);

        let key = a.data_key();
        assert_eq!(fx.registry.refcount(&key), Some(2));
        assert_eq!(fx.transport.controls_for(&key).len(), 1);
        assert_eq!(fx.multicaster.active_listener_count(&key), 2);

        a.toggle_play(&mut fx.registry, &mut fx.multicaster);
        assert_eq!(fx.registry.refcount(&key), Some(1));
        assert!(b.is_playing());

        b.toggle_play(&mut fx.registry, &mut fx.multicaster);
        assert!(!fx.registry.contains(&key));
    }

    #[test]
    fn test_voice_frames_drive_decode_and_playback() {
        let mut fx = fixture();
        let codec = Arc::new(RecordingCodec::default());
        let sink = Arc::new(RecordingSink::default());
        let mut session = session_with(&fx, 1, codec.clone(), sink.clone());

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        session.set_gain(2.0);

        let key = session.data_key();
        fx.multicaster.dispatch(&key, &SocketEvent::Open);
        fx.multicaster.dispatch(
            &key,
            &SocketEvent::Message(voice_json(200, false, Some("N0CALL")))
        );

        // 200 bytes cross the threshold: exactly one decode of all 200
        let calls = codec.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 200);

        let segments = sink.segments.lock().unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].sample_rate, SAMPLE_RATE);
        assert_eq!(segments[0].gain, 2.0);
        assert_eq!(session.displayed_call(), "N0CALL");
    }

    #[test]
    fn test_done_flushes_tail_and_reverts_callsign() {
        let mut fx = fixture();
        let codec = Arc::new(RecordingCodec::default());
        let sink = Arc::new(RecordingSink::default());
        let mut session = session_with(&fx, 1, codec.clone(), sink);

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        let key = session.data_key();

        fx.multicaster.dispatch(
            &key,
            &SocketEvent::Message(voice_json(10, true, Some("N0CALL")))
        );

        let calls = codec.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 10);
        assert_eq!(session.displayed_call(), "--------");
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let mut fx = fixture();
        let codec = Arc::new(RecordingCodec::default());
        let sink = Arc::new(RecordingSink::default());
        let mut session = session_with(&fx, 1, codec.clone(), sink);

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        fx.multicaster.dispatch(
            &session.data_key(),
            &SocketEvent::Message("{broken".to_string())
        );

        assert!(codec.calls.lock().unwrap().is_empty());
        assert!(session.is_playing());
    }

    #[test]
    fn test_data_close_forces_idle() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            7,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        let key = session.data_key();

        // Server-initiated close: registry entry goes first, then dispatch
        fx.registry.handle_transport_closed(&key);
        fx.multicaster.dispatch(&key, &SocketEvent::Closed);

        assert_eq!(
            fx.feedback_rx.try_recv().unwrap(),
            SessionFeedback::DataClosed { session: 7, playback: 1 }
        );
        session.handle_data_closed(&mut fx.multicaster, 1);

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(fx.multicaster.active_listener_count(&key), 0);
        assert_eq!(session.displayed_call(), "--------");
    }

    #[test]
    fn test_stale_data_close_ignored_after_restart() {
        // Close feedback queued for the first playback must not touch a
        // playback the user has since restarted
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        let key = session.data_key();

        fx.registry.handle_transport_closed(&key);
        fx.multicaster.dispatch(&key, &SocketEvent::Closed);
        let stale = fx.feedback_rx.try_recv().unwrap();

        // User toggles off and on again before the feedback is drained
        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        session.toggle_play(&mut fx.registry, &mut fx.multicaster);

        let SessionFeedback::DataClosed { playback, .. } = stale else {
            panic!("unexpected feedback: {:?}", stale);
        };
        session.handle_data_closed(&mut fx.multicaster, playback);

        assert!(session.is_playing());
        assert_eq!(fx.registry.refcount(&key), Some(1));
        assert_eq!(fx.multicaster.active_listener_count(&key), 1);
    }

    #[test]
    fn test_stale_status_close_ignored_after_reattach() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        let key = session.status_key();

        fx.registry.handle_transport_closed(&key);
        fx.multicaster.dispatch(&key, &SocketEvent::Closed);
        assert_eq!(
            fx.feedback_rx.try_recv().unwrap(),
            SessionFeedback::StatusClosed { session: 1, attach: 1 }
        );

        // Current-attach close asks for a re-attach
        assert!(session.handle_status_closed(&mut fx.multicaster, 1));
        session.attach_status(&mut fx.registry, &mut fx.multicaster);

        // The same close delivered again is stale and leaves the new
        // subscription alone
        assert!(!session.handle_status_closed(&mut fx.multicaster, 1));
        assert!(fx.registry.contains(&key));
        assert_eq!(fx.multicaster.active_listener_count(&key), 1);
    }

    #[test]
    fn test_channel_change_while_playing_moves_cleanly() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        let old_key = session.data_key();

        let new_channel = ChannelSettings {
            proxy: "p.example.org".to_string(),
            reflector: "M17-USA".to_string(),
            module: "A".to_string(),
        };
        session.set_channel(&mut fx.registry, &mut fx.multicaster, new_channel);

        // Old subscription fully gone, new one live, still playing
        assert!(!fx.registry.contains(&old_key));
        assert_eq!(fx.multicaster.active_listener_count(&old_key), 0);
        assert!(session.is_playing());
        assert_eq!(fx.registry.refcount(&session.data_key()), Some(1));
        assert_eq!(fx.multicaster.active_listener_count(&session.data_key()), 1);
    }

    #[test]
    fn test_channel_change_while_idle_only_moves_status() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);

        let new_channel = ChannelSettings {
            proxy: "q.example.org".to_string(),
            reflector: "M17-USA".to_string(),
            module: "A".to_string(),
        };
        session.set_channel(&mut fx.registry, &mut fx.multicaster, new_channel);

        assert_eq!(session.state(), SessionState::Idle);
        assert!(fx.registry.contains(&ConnectionKey::status("q.example.org")));
        assert!(!fx.registry.contains(&session.data_key()));
    }

    #[test]
    fn test_status_updates_talker_indicator() {
        // Scenario: active_qso=true shows last_qso_call, false reverts
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        let status_key = session.status_key();

        fx.multicaster.dispatch(
            &status_key,
            &SocketEvent::Message(
                r#"[{"reflector": "M17-M17", "module": "C", "last_qso_call": "W1AW", "active_qso": true},
                    {"reflector": "M17-USA", "module": "A", "last_qso_call": "OTHER", "active_qso": true}]"#.to_string()
            )
        );
        assert_eq!(session.displayed_call(), "W1AW");

        fx.multicaster.dispatch(
            &status_key,
            &SocketEvent::Message(
                r#"[{"reflector": "M17-M17", "module": "C", "last_qso_call": "W1AW", "active_qso": false}]"#.to_string()
            )
        );
        assert_eq!(session.displayed_call(), "--------");
    }

    #[test]
    fn test_status_ignores_other_channels() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        fx.multicaster.dispatch(
            &session.status_key(),
            &SocketEvent::Message(
                r#"[{"reflector": "M17-USA", "module": "A", "last_qso_call": "OTHER", "active_qso": true}]"#.to_string()
            )
        );

        assert_eq!(session.displayed_call(), "--------");
    }

    #[test]
    fn test_set_gain_clamps() {
        let fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.set_gain(10.0);
        assert_eq!(session.gain(), 4.0);
        session.set_gain(-3.0);
        assert_eq!(session.gain(), 0.0);
    }

    #[test]
    fn test_detach_releases_everything() {
        let mut fx = fixture();
        let mut session = session_with(
            &fx,
            1,
            Arc::new(RecordingCodec::default()),
            Arc::new(RecordingSink::default())
        );

        session.attach_status(&mut fx.registry, &mut fx.multicaster);
        session.toggle_play(&mut fx.registry, &mut fx.multicaster);
        session.detach(&mut fx.registry, &mut fx.multicaster);

        assert!(!fx.registry.contains(&session.data_key()));
        assert_eq!(fx.multicaster.active_listener_count(&session.data_key()), 0);
        assert_eq!(fx.multicaster.active_listener_count(&session.status_key()), 0);
    }
}
