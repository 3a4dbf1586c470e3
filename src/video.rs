use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::render::dom::{Element, Node};

/// YouTube player states as reported over `postMessage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    Unknown(i64),
}

impl From<i64> for PlayerState {
    fn from(value: i64) -> Self {
        match value {
            -1 => PlayerState::Unstarted,
            0 => PlayerState::Ended,
            1 => PlayerState::Playing,
            2 => PlayerState::Paused,
            3 => PlayerState::Buffering,
            5 => PlayerState::Cued,
            other => PlayerState::Unknown(other),
        }
    }
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::Playing)
    }
}

/// Inbound player message we care about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMessage {
    pub state: PlayerState,
}

impl PlayerMessage {
    /// Parse `{event: "infoDelivery", info: {playerState}}`.
    ///
    /// Messages arrive either as JSON text or as a JSON-encoded string of
    /// JSON text. Anything else is irrelevant and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut value: Value = serde_json::from_str(raw).ok()?;
        if let Value::String(inner) = &value {
            value = serde_json::from_str(inner).ok()?;
        }

        if value.get("event")?.as_str()? != "infoDelivery" {
            return None;
        }
        let state = value.get("info")?.get("playerState")?.as_i64()?;
        debug!("Player state message: {}", state);

        Some(Self { state: state.into() })
    }
}

/// Outbound command that pauses an embedded player
pub fn pause_command() -> String {
    serde_json::json!({
        "event": "command",
        "func": "pauseVideo",
        "args": ""
    })
    .to_string()
}

/// Video id from `youtu.be/ID`, `youtube.com/watch?v=ID`, `/embed/ID` or `/shorts/ID`
pub fn youtube_id(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let id = match host {
        "youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url.query_pairs().find(|(key, _)| key == "v")?.1.into_owned(),
            "embed" | "shorts" | "v" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };

    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}

/// Embeddable player URL with the JS API enabled, or the input for non-YouTube sources
pub fn embed_url(video_url: &str) -> String {
    match youtube_id(video_url) {
        Some(id) => format!("https://www.youtube.com/embed/{}?enablejsapi=1", id),
        None => video_url.to_string(),
    }
}

/// Player markup for a `{video: url}` paragraph
pub fn embed_element(video_url: &str) -> Element {
    let player = if youtube_id(video_url).is_some() {
        Element::new("iframe")
            .with_attr("src", embed_url(video_url))
            .with_attr("allow", "autoplay; encrypted-media; picture-in-picture")
            .with_attr("allowfullscreen", "")
            .with_attr("frameborder", "0")
    } else {
        Element::new("video")
            .with_attr("src", video_url)
            .with_attr("controls", "")
            .with_attr("preload", "metadata")
    };

    Element::new("div")
        .with_attr("class", "video-container")
        .with_attr("data-video-src", video_url)
        .with_children(vec![Node::Element(player)])
}

/// A playing embed floats once it has scrolled entirely above the viewport
pub fn should_float(rect_bottom: f64, state: PlayerState) -> bool {
    rect_bottom < 0.0 && state.is_playing()
}

/// Outcome of [`FloatingVideo::show`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatAction {
    Unchanged,
    Opened,
    Replaced { previous: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingPlayer {
    pub src: String,
    pub position: (f64, f64),
}

/// The single floating video box.
///
/// At most one player floats at a time. Dragging is a held flag between
/// pointer-down and pointer-up.
#[derive(Debug, Clone, Default)]
pub struct FloatingVideo {
    active: Option<FloatingPlayer>,
    dragging: bool,
}

impl FloatingVideo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, src: &str) -> FloatAction {
        match self.active.as_mut() {
            Some(player) if player.src == src => FloatAction::Unchanged,
            Some(player) => {
                let previous = std::mem::replace(&mut player.src, src.to_string());
                self.dragging = false;
                debug!("Floating video replaced: {} -> {}", previous, src);
                FloatAction::Replaced { previous }
            }
            None => {
                self.active = Some(FloatingPlayer {
                    src: src.to_string(),
                    position: (0.0, 0.0),
                });
                FloatAction::Opened
            }
        }
    }

    /// Tear down the floating player, returning its source
    pub fn close(&mut self) -> Option<String> {
        self.dragging = false;
        self.active.take().map(|player| player.src)
    }

    pub fn active(&self) -> Option<&FloatingPlayer> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Start a drag; refused when nothing floats or a drag is already held
    pub fn begin_drag(&mut self) -> bool {
        if self.active.is_none() || self.dragging {
            return false;
        }
        self.dragging = true;
        true
    }

    /// Move the box while a drag is held
    pub fn drag_to(&mut self, x: f64, y: f64) -> bool {
        match (&mut self.active, self.dragging) {
            (Some(player), true) => {
                player.position = (x, y);
                true
            }
            _ => false,
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_ids() {
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_id("https://youtube.com/embed/abc_123").as_deref(), Some("abc_123"));
        assert_eq!(youtube_id("https://vimeo.com/1234"), None);
        assert_eq!(youtube_id("not a url"), None);
        assert_eq!(
            embed_url("https://youtu.be/abc"),
            "https://www.youtube.com/embed/abc?enablejsapi=1"
        );
        assert_eq!(embed_url("clips/fox.mp4"), "clips/fox.mp4");
    }

    #[test]
    fn test_player_message_parse() {
        let message = PlayerMessage::parse(r#"{"event":"infoDelivery","info":{"playerState":1}}"#).unwrap();
        assert!(message.state.is_playing());

        let nested = PlayerMessage::parse(r#""{\"event\":\"infoDelivery\",\"info\":{\"playerState\":2}}""#).unwrap();
        assert_eq!(nested.state, PlayerState::Paused);

        assert!(PlayerMessage::parse("garbage").is_none());
        assert!(PlayerMessage::parse(r#"{"event":"onReady"}"#).is_none());
        assert!(PlayerMessage::parse(r#"{"event":"infoDelivery","info":{"currentTime":3}}"#).is_none());
    }

    #[test]
    fn test_pause_command_shape() {
        let value: Value = serde_json::from_str(&pause_command()).unwrap();
        assert_eq!(value["event"], "command");
        assert_eq!(value["func"], "pauseVideo");
        assert_eq!(value["args"], "");
    }

    #[test]
    fn test_single_floating_player() {
        let mut floating = FloatingVideo::new();
        assert_eq!(floating.show("a"), FloatAction::Opened);
        assert_eq!(floating.show("a"), FloatAction::Unchanged);
        assert_eq!(
            floating.show("b"),
            FloatAction::Replaced {
                previous: "a".to_string()
            }
        );
        assert_eq!(floating.active().unwrap().src, "b");
        assert_eq!(floating.close().as_deref(), Some("b"));
        assert!(floating.active().is_none());
    }

    #[test]
    fn test_drag_flag() {
        let mut floating = FloatingVideo::new();
        assert!(!floating.begin_drag());

        floating.show("a");
        assert!(!floating.drag_to(5.0, 5.0));
        assert!(floating.begin_drag());
        assert!(!floating.begin_drag());
        assert!(floating.drag_to(10.0, 20.0));
        floating.end_drag();
        assert!(!floating.drag_to(0.0, 0.0));
        assert_eq!(floating.active().unwrap().position, (10.0, 20.0));
    }

    #[test]
    fn test_should_float() {
        assert!(should_float(-1.0, PlayerState::Playing));
        assert!(!should_float(-1.0, PlayerState::Paused));
        assert!(!should_float(100.0, PlayerState::Playing));
    }
}
