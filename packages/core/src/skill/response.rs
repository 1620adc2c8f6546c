//! Outbound directive envelope (C6 output side).

use crate::queue::Song;
use serde::Serialize;

const USER_AGENT: &str = "bridge/1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub token: String,
    pub url: String,
    pub offset_in_milliseconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_previous_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioItem {
    pub stream: StreamInfo,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Directive {
    #[serde(rename = "AudioPlayer.Play")]
    Play {
        #[serde(rename = "playBehavior")]
        play_behavior: &'static str,
        #[serde(rename = "audioItem")]
        audio_item: AudioItem,
    },
    #[serde(rename = "AudioPlayer.Stop")]
    Stop,
    #[serde(rename = "AudioPlayer.ClearQueue")]
    ClearQueue {
        #[serde(rename = "clearBehavior")]
        clear_behavior: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CanFulfillIntent {
    pub can_fulfill: &'static str,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub should_end_session: bool,
    pub directives: Vec<Directive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_fulfill_intent: Option<CanFulfillIntent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveEnvelope {
    pub version: &'static str,
    pub user_agent: &'static str,
    pub response: ResponseBody,
}

fn song_metadata(song: &Song) -> Metadata {
    Metadata {
        title: song.name.clone(),
        subtitle: format!("{} - {}", song.album, song.artist),
    }
}

impl DirectiveEnvelope {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: "1.0",
            user_agent: USER_AGENT,
            response: ResponseBody {
                should_end_session: true,
                directives: Vec::new(),
                can_fulfill_intent: None,
            },
        }
    }

    #[must_use]
    pub fn play(song: &Song, stream_domain: &str, offset_ms: u64) -> Self {
        let directive = Directive::Play {
            play_behavior: "REPLACE_ALL",
            audio_item: AudioItem {
                stream: StreamInfo {
                    token: song.id.clone(),
                    url: format!("{stream_domain}{}", song.stream_path),
                    offset_in_milliseconds: offset_ms,
                    expected_previous_token: None,
                },
                metadata: song_metadata(song),
            },
        };
        Self {
            version: "1.0",
            user_agent: USER_AGENT,
            response: ResponseBody {
                should_end_session: true,
                directives: vec![directive],
                can_fulfill_intent: Some(CanFulfillIntent { can_fulfill: "YES" }),
            },
        }
    }

    #[must_use]
    pub fn enqueue(song: &Song, stream_domain: &str, previous_token: &str) -> Self {
        let directive = Directive::Play {
            play_behavior: "ENQUEUE",
            audio_item: AudioItem {
                stream: StreamInfo {
                    token: song.id.clone(),
                    url: format!("{stream_domain}{}", song.stream_path),
                    offset_in_milliseconds: 0,
                    expected_previous_token: Some(previous_token.to_string()),
                },
                metadata: song_metadata(song),
            },
        };
        Self {
            version: "1.0",
            user_agent: USER_AGENT,
            response: ResponseBody {
                should_end_session: true,
                directives: vec![directive],
                can_fulfill_intent: None,
            },
        }
    }

    #[must_use]
    pub fn stop() -> Self {
        Self {
            version: "1.0",
            user_agent: USER_AGENT,
            response: ResponseBody {
                should_end_session: true,
                directives: vec![Directive::Stop],
                can_fulfill_intent: None,
            },
        }
    }
}
