//! The playback queue (C5): the single piece of state shared between the
//! REST control plane and the skill dispatcher.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub name: String,
    pub album: String,
    pub artist: String,
    pub duration_seconds: u32,
    pub cover_path: String,
    pub stream_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaybackState {
    Playing,
    Idle,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    #[serde(rename = "queue", default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub queue_position: usize,
    #[serde(default)]
    pub track_position: u64,
    #[serde(default)]
    pub state: PlaybackState,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub repeat: bool,
}

impl Default for Queue {
    fn default() -> Self {
        Self {
            songs: Vec::new(),
            queue_position: 0,
            track_position: 0,
            state: PlaybackState::Idle,
            shuffle: false,
            repeat: false,
        }
    }
}

impl Queue {
    #[must_use]
    pub fn has_items(&self) -> bool {
        !self.songs.is_empty()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.has_items() && self.queue_position + 1 < self.songs.len()
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.has_items() && self.queue_position > 0
    }

    /// The song at the current position. `None` when the queue is empty.
    #[must_use]
    pub fn current(&self) -> Option<&Song> {
        self.songs.get(self.queue_position)
    }

    /// The song one past the current position, without mutating state.
    #[must_use]
    pub fn peek_next(&self) -> Option<&Song> {
        self.songs.get(self.queue_position + 1)
    }

    /// Advances to the next song if possible, returning it. Leaves the
    /// position unchanged (and returns `None`) at the end of the queue.
    ///
    /// Does not touch `track_position` — matching upstream, which only ever
    /// writes it from a `PlaybackStopped` callback.
    pub fn next(&mut self) -> Option<&Song> {
        if self.has_next() {
            self.queue_position += 1;
            self.current()
        } else {
            None
        }
    }

    /// Retreats to the previous song if possible, returning it. Leaves the
    /// position unchanged (and returns `None`) at the start of the queue.
    pub fn prev(&mut self) -> Option<&Song> {
        if self.has_prev() {
            self.queue_position -= 1;
            self.current()
        } else {
            None
        }
    }

    /// Replaces the whole queue, clamping the position into range.
    pub fn replace(&mut self, mut new_queue: Queue) {
        if new_queue.songs.is_empty() {
            new_queue.queue_position = 0;
        } else if new_queue.queue_position >= new_queue.songs.len() {
            new_queue.queue_position = new_queue.songs.len() - 1;
        }
        *self = new_queue;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            name: id.to_string(),
            album: "Album".to_string(),
            artist: "Artist".to_string(),
            duration_seconds: 180,
            cover_path: "/cover.jpg".to_string(),
            stream_path: format!("/stream/{id}"),
        }
    }

    #[test]
    fn empty_queue_has_no_current() {
        let q = Queue::default();
        assert!(q.current().is_none());
        assert!(!q.has_next());
        assert!(!q.has_prev());
    }

    #[test]
    fn next_stays_in_bounds_at_end() {
        let mut q = Queue {
            songs: vec![song("a"), song("b")],
            queue_position: 1,
            ..Default::default()
        };
        assert!(!q.has_next());
        let before = q.queue_position;
        assert!(q.next().is_none());
        assert_eq!(q.queue_position, before);
    }

    #[test]
    fn next_advances_without_touching_track_position() {
        let mut q = Queue {
            songs: vec![song("a"), song("b"), song("c")],
            queue_position: 0,
            track_position: 5000,
            ..Default::default()
        };
        let next = q.next().cloned();
        assert_eq!(next.unwrap().id, "b");
        assert_eq!(q.queue_position, 1);
        assert_eq!(q.track_position, 5000);
    }

    #[test]
    fn wire_field_is_queue_not_songs() {
        let q = Queue {
            songs: vec![song("a")],
            ..Default::default()
        };
        let v = serde_json::to_value(&q).unwrap();
        assert!(v.get("queue").is_some());
        assert!(v.get("songs").is_none());
    }
}
