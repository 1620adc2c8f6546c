//! The skill dispatcher (C6): turns a typed voice-skill request into a
//! directive envelope, mutating the shared queue along the way.

use std::sync::Arc;

use parking_lot::RwLock;

use super::request::{Request, RequestEnvelope};
use super::response::DirectiveEnvelope;
use crate::queue::{PlaybackState, Queue};

const STOP_SUPPRESSED_ACTIVITIES: [&str; 4] = ["PAUSED", "FINISHED", "IDLE", "STOPPED"];

/// Request-scoped identifiers threaded through the dispatcher explicitly
/// (rather than via thread-local state) so it stays testable without an
/// HTTP framework in the loop.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub correlation_id: String,
}

/// Consumes voice-skill envelopes and produces directive responses,
/// mutating the queue it was built with.
pub struct Dispatcher {
    queue: Arc<RwLock<Queue>>,
    stream_domain: String,
}

impl Dispatcher {
    #[must_use]
    pub fn new(queue: Arc<RwLock<Queue>>, stream_domain: impl Into<String>) -> Self {
        Self {
            queue,
            stream_domain: stream_domain.into(),
        }
    }

    pub fn handle(&self, envelope: &RequestEnvelope, ctx: &RequestContext) -> DirectiveEnvelope {
        log::info!(
            "skill request request_id={} correlation_id={}",
            ctx.request_id,
            ctx.correlation_id
        );
        match &envelope.request {
            Request::Launch => DirectiveEnvelope::empty(),
            Request::Intent { name } => match name.as_str() {
                "AMAZON.ResumeIntent" => self.handle_resume(),
                "AMAZON.NextIntent" => self.handle_next(),
                "AMAZON.PreviousIntent" => self.handle_prev(),
                "AMAZON.StopIntent" | "AMAZON.CancelIntent" | "AMAZON.PauseIntent" => {
                    self.handle_stop(&envelope.context.audio_player.player_activity)
                }
                _ => DirectiveEnvelope::empty(),
            },
            Request::PlaybackStarted { .. } => self.handle_playback_started(),
            Request::PlaybackNearlyFinished { token } => self.handle_nearly_finished(token),
            Request::PlaybackFinished { token } => self.handle_finished(token),
            Request::PlaybackStopped { token, offset_ms } => {
                self.handle_stopped(token, *offset_ms)
            }
            // Falls through to the next-intent handler, mirroring upstream:
            // a failed track is simply skipped.
            Request::PlaybackFailed { .. } => self.handle_next(),
            Request::PlaybackControllerCommand { .. } | Request::Unknown { .. } => {
                DirectiveEnvelope::empty()
            }
        }
    }

    fn handle_resume(&self) -> DirectiveEnvelope {
        let queue = self.queue.read();
        match queue.current() {
            Some(song) => DirectiveEnvelope::play(song, &self.stream_domain, queue.track_position),
            None => DirectiveEnvelope::empty(),
        }
    }

    fn handle_next(&self) -> DirectiveEnvelope {
        let mut queue = self.queue.write();
        if !queue.has_next() {
            return DirectiveEnvelope::empty();
        }
        let song = queue.next().cloned();
        match song {
            Some(song) => DirectiveEnvelope::play(&song, &self.stream_domain, 0),
            None => DirectiveEnvelope::empty(),
        }
    }

    fn handle_prev(&self) -> DirectiveEnvelope {
        let mut queue = self.queue.write();
        if !queue.has_prev() {
            return DirectiveEnvelope::empty();
        }
        let song = queue.prev().cloned();
        match song {
            Some(song) => DirectiveEnvelope::play(&song, &self.stream_domain, 0),
            None => DirectiveEnvelope::empty(),
        }
    }

    fn handle_stop(&self, player_activity: &str) -> DirectiveEnvelope {
        if STOP_SUPPRESSED_ACTIVITIES.contains(&player_activity) {
            DirectiveEnvelope::empty()
        } else {
            DirectiveEnvelope::stop()
        }
    }

    fn handle_playback_started(&self) -> DirectiveEnvelope {
        let mut queue = self.queue.write();
        if queue.has_items() {
            queue.state = PlaybackState::Playing;
        }
        DirectiveEnvelope::empty()
    }

    /// Emits the look-ahead enqueue directive regardless of whether `token`
    /// matches our current song — the cloud may ask to enqueue speculatively.
    fn handle_nearly_finished(&self, _token: &str) -> DirectiveEnvelope {
        let queue = self.queue.read();
        if !queue.has_next() {
            return DirectiveEnvelope::empty();
        }
        let current_id = match queue.current() {
            Some(song) => song.id.clone(),
            None => return DirectiveEnvelope::empty(),
        };
        match queue.peek_next() {
            Some(next_song) => {
                DirectiveEnvelope::enqueue(next_song, &self.stream_domain, &current_id)
            }
            None => DirectiveEnvelope::empty(),
        }
    }

    fn handle_finished(&self, token: &str) -> DirectiveEnvelope {
        let mut queue = self.queue.write();
        if queue.has_next() {
            if queue.current().is_some_and(|s| s.id == token) {
                queue.next();
            }
            // else: the cloud reports a song we aren't tracking — leave the
            // position alone.
        } else {
            queue.state = PlaybackState::Idle;
        }
        DirectiveEnvelope::empty()
    }

    fn handle_stopped(&self, token: &str, offset_ms: u64) -> DirectiveEnvelope {
        let mut queue = self.queue.write();
        if queue.has_items() && queue.current().is_some_and(|s| s.id == token) {
            queue.track_position = offset_ms;
            queue.state = PlaybackState::Idle;
        }
        DirectiveEnvelope::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Song;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            name: format!("song {id}"),
            album: "Album".to_string(),
            artist: "Artist".to_string(),
            duration_seconds: 180,
            cover_path: "/cover.jpg".to_string(),
            stream_path: format!("/stream/{id}"),
        }
    }

    fn envelope(request_json: &str, player_activity: &str) -> RequestEnvelope {
        let body = format!(
            r#"{{"context":{{"audioPlayer":{{"playerActivity":"{player_activity}"}}}},"request":{request_json}}}"#
        );
        serde_json::from_str(&body).unwrap()
    }

    #[test]
    fn nearly_finished_enqueues_next_song_regardless_of_token_and_leaves_position() {
        let queue = Arc::new(RwLock::new(Queue {
            songs: vec![song("A"), song("B"), song("C")],
            queue_position: 1,
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(Arc::clone(&queue), "https://stream.example.com");
        let env = envelope(
            r#"{"type":"AudioPlayer.PlaybackNearlyFinished","token":"B"}"#,
            "PLAYING",
        );
        let response = dispatcher.handle(&env, &RequestContext::default());

        assert_eq!(response.response.directives.len(), 1);
        assert_eq!(queue.read().queue_position, 1);

        let finished_env = envelope(
            r#"{"type":"AudioPlayer.PlaybackFinished","token":"B"}"#,
            "PLAYING",
        );
        let finished = dispatcher.handle(&finished_env, &RequestContext::default());
        assert!(finished.response.directives.is_empty());
        assert_eq!(queue.read().queue_position, 2);
    }

    #[test]
    fn stop_intent_gated_by_player_activity() {
        let queue = Arc::new(RwLock::new(Queue {
            songs: vec![song("A")],
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(queue, "https://stream.example.com");

        let stopped = envelope(r#"{"type":"IntentRequest","intent":{"name":"AMAZON.StopIntent"}}"#, "STOPPED");
        let response = dispatcher.handle(&stopped, &RequestContext::default());
        assert!(response.response.directives.is_empty());

        let playing = envelope(r#"{"type":"IntentRequest","intent":{"name":"AMAZON.StopIntent"}}"#, "PLAYING");
        let response = dispatcher.handle(&playing, &RequestContext::default());
        assert_eq!(response.response.directives.len(), 1);
    }

    #[test]
    fn playback_failed_falls_through_to_next_intent() {
        let queue = Arc::new(RwLock::new(Queue {
            songs: vec![song("A"), song("B")],
            queue_position: 0,
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(Arc::clone(&queue), "https://stream.example.com");
        let env = envelope(r#"{"type":"AudioPlayer.PlaybackFailed","token":"A"}"#, "PLAYING");
        let response = dispatcher.handle(&env, &RequestContext::default());
        assert_eq!(response.response.directives.len(), 1);
        assert_eq!(queue.read().queue_position, 1);
    }

    #[test]
    fn resume_intent_uses_current_track_position() {
        let queue = Arc::new(RwLock::new(Queue {
            songs: vec![song("A")],
            queue_position: 0,
            track_position: 4200,
            ..Default::default()
        }));
        let dispatcher = Dispatcher::new(queue, "https://stream.example.com");
        let env = envelope(r#"{"type":"IntentRequest","intent":{"name":"AMAZON.ResumeIntent"}}"#, "IDLE");
        let response = dispatcher.handle(&env, &RequestContext::default());
        match &response.response.directives[0] {
            super::super::response::Directive::Play { audio_item, .. } => {
                assert_eq!(audio_item.stream.offset_in_milliseconds, 4200);
            }
            _ => panic!("expected a play directive"),
        }
    }

    #[test]
    fn unknown_request_type_yields_empty_response() {
        let queue = Arc::new(RwLock::new(Queue::default()));
        let dispatcher = Dispatcher::new(queue, "https://stream.example.com");
        let env = envelope(r#"{"type":"SomeFutureRequest"}"#, "IDLE");
        let response = dispatcher.handle(&env, &RequestContext::default());
        assert!(response.response.directives.is_empty());
        assert!(response.response.should_end_session);
    }
}
