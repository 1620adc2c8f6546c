//! Inbound voice-skill envelope (C6 input side): two-pass deserialization
//! keyed on the nested `request.type` discriminator.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Application {
    #[serde(rename = "applicationId")]
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SystemContext {
    pub application: Application,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioPlayerContext {
    #[serde(rename = "playerActivity")]
    pub player_activity: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RequestContext {
    pub system: SystemContext,
    #[serde(rename = "audioPlayer")]
    pub audio_player: AudioPlayerContext,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Session {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub new: bool,
}

/// One typed voice-skill request. `Unknown` is the catch-all for any
/// `request.type` string the dispatcher doesn't recognize, or a malformed
/// inner payload — both fall through to the dispatcher's default response
/// rather than failing the whole envelope's parse.
#[derive(Debug, Clone)]
pub enum Request {
    Launch,
    Intent { name: String },
    PlaybackStarted { token: String },
    PlaybackNearlyFinished { token: String },
    PlaybackFinished { token: String },
    PlaybackStopped { token: String, offset_ms: u64 },
    PlaybackFailed { token: String },
    PlaybackControllerCommand { kind: String },
    Unknown { type_name: String },
}

impl Request {
    fn from_raw(raw: &Value) -> Self {
        let type_name = raw
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match type_name.as_str() {
            "LaunchRequest" => Self::Launch,
            "IntentRequest" => {
                let name = raw
                    .get("intent")
                    .and_then(|i| i.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Self::Intent { name }
            }
            "AudioPlayer.PlaybackStarted" => Self::PlaybackStarted {
                token: token_of(raw),
            },
            "AudioPlayer.PlaybackNearlyFinished" => Self::PlaybackNearlyFinished {
                token: token_of(raw),
            },
            "AudioPlayer.PlaybackFinished" => Self::PlaybackFinished {
                token: token_of(raw),
            },
            "AudioPlayer.PlaybackStopped" => Self::PlaybackStopped {
                token: token_of(raw),
                offset_ms: raw
                    .get("offsetInMilliseconds")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            },
            "AudioPlayer.PlaybackFailed" => Self::PlaybackFailed {
                token: token_of(raw),
            },
            "PlaybackController.PlayCommandIssued"
            | "PlaybackController.PauseCommandIssued"
            | "PlaybackController.NextCommandIssued"
            | "PlaybackController.PreviousCommandIssued" => {
                Self::PlaybackControllerCommand { kind: type_name }
            }
            other => Self::Unknown {
                type_name: other.to_string(),
            },
        }
    }
}

fn token_of(raw: &Value) -> String {
    raw.get("token")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub session: Session,
    pub context: RequestContext,
    pub request: Request,
}

impl<'de> Deserialize<'de> for RequestEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(default)]
        struct Raw {
            session: Session,
            context: RequestContext,
            request: Value,
        }
        impl Default for Raw {
            fn default() -> Self {
                Self {
                    session: Session::default(),
                    context: RequestContext::default(),
                    request: Value::Null,
                }
            }
        }
        let raw = Raw::deserialize(deserializer).map_err(DeError::custom)?;
        Ok(RequestEnvelope {
            session: raw.session,
            context: raw.context,
            request: Request::from_raw(&raw.request),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_does_not_error() {
        let env: RequestEnvelope =
            serde_json::from_str(r#"{"request":{"type":"SomeFutureType"}}"#).unwrap();
        assert!(matches!(env.request, Request::Unknown { .. }));
    }

    #[test]
    fn intent_request_captures_name() {
        let env: RequestEnvelope = serde_json::from_str(
            r#"{"request":{"type":"IntentRequest","intent":{"name":"AMAZON.NextIntent"}}}"#,
        )
        .unwrap();
        match env.request {
            Request::Intent { name } => assert_eq!(name, "AMAZON.NextIntent"),
            _ => panic!("expected Intent"),
        }
    }

    #[test]
    fn player_activity_is_captured() {
        let env: RequestEnvelope = serde_json::from_str(
            r#"{"context":{"audioPlayer":{"playerActivity":"PLAYING"}},"request":{"type":"LaunchRequest"}}"#,
        )
        .unwrap();
        assert_eq!(env.context.audio_player.player_activity, "PLAYING");
    }
}
