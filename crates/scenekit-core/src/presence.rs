//! Multiplayer presence: the local player, remote cursors and their order.
//!
//! Remote updates arrive through a [`PresenceFeed`] channel owned by some
//! transport thread. The tracker drains it without blocking from the
//! session's thread, so the cursor list is only ever touched by one writer.
//! Conflicting updates for the same cursor resolve by timestamp.

use crate::nodes::NodeId;
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Default number of remote cursors drawn at once.
pub const DEFAULT_MAX_VISIBLE_CURSORS: usize = 5;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(0, 1)? * 17,
                channel(1, 1)? * 17,
                channel(2, 1)? * 17,
                255,
            )),
            6 => Some(Self::new(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 255)),
            8 => Some(Self::new(
                channel(0, 2)?,
                channel(2, 2)?,
                channel(4, 2)?,
                channel(6, 2)?,
            )),
            _ => None,
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A step in a player's color scale, lightest to darkest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    S50,
    S100,
    S200,
    S300,
    S400,
    S500,
    S600,
    S700,
    S800,
    S900,
    S950,
}

impl Shade {
    fn index(self) -> usize {
        self as usize
    }
}

/// Eleven-step color scale identifying a player in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPalette([SerializableColor; 11]);

/// Colors for a player's avatar bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarColors {
    pub ring: SerializableColor,
    pub fill: SerializableColor,
    pub text: SerializableColor,
}

/// Colors for the name tag next to a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelColors {
    pub background: SerializableColor,
    pub text: SerializableColor,
}

impl CursorPalette {
    pub const fn new(shades: [SerializableColor; 11]) -> Self {
        Self(shades)
    }

    /// Build from eleven hex strings, `50` first.
    pub fn from_hex(shades: [&str; 11]) -> Option<Self> {
        let mut out = [SerializableColor::black(); 11];
        for (slot, hex) in out.iter_mut().zip(shades) {
            *slot = SerializableColor::from_hex(hex)?;
        }
        Some(Self(out))
    }

    pub fn shade(&self, shade: Shade) -> SerializableColor {
        self.0[shade.index()]
    }

    pub fn avatar_colors(&self) -> AvatarColors {
        AvatarColors {
            ring: self.shade(Shade::S400),
            fill: self.shade(Shade::S600),
            text: self.shade(Shade::S100),
        }
    }

    pub fn label_colors(&self) -> LabelColors {
        LabelColors {
            background: self.shade(Shade::S500),
            text: self.shade(Shade::S100),
        }
    }
}

impl Default for CursorPalette {
    /// Neutral slate scale.
    fn default() -> Self {
        Self::new([
            SerializableColor::new(0xf8, 0xfa, 0xfc, 255),
            SerializableColor::new(0xf1, 0xf5, 0xf9, 255),
            SerializableColor::new(0xe2, 0xe8, 0xf0, 255),
            SerializableColor::new(0xcb, 0xd5, 0xe1, 255),
            SerializableColor::new(0x94, 0xa3, 0xb8, 255),
            SerializableColor::new(0x64, 0x74, 0x8b, 255),
            SerializableColor::new(0x47, 0x55, 0x69, 255),
            SerializableColor::new(0x33, 0x41, 0x55, 255),
            SerializableColor::new(0x1e, 0x29, 0x3b, 255),
            SerializableColor::new(0x0f, 0x17, 0x2a, 255),
            SerializableColor::new(0x02, 0x06, 0x17, 255),
        ])
    }
}

/// Where a player is looking and what they have selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<NodeId>,
    pub position: Point,
    #[serde(default)]
    pub selection: Vec<NodeId>,
}

/// One player's presence. A user with several windows has several cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub cursor_id: String,
    pub user_id: String,
    #[serde(default)]
    pub palette: CursorPalette,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CursorLocation>,
    /// Sender's timestamp in milliseconds. Newer wins.
    pub t: u64,
}

impl PresenceRecord {
    pub fn new(cursor_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            cursor_id: cursor_id.into(),
            user_id: user_id.into(),
            palette: CursorPalette::default(),
            location: None,
            t: 0,
        }
    }
}

/// Messages carried by a presence feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// A cursor appeared or changed.
    Update(PresenceRecord),
    /// A cursor went away.
    Leave { cursor_id: String },
}

/// Sending half of a presence channel, held by the transport.
#[derive(Debug, Clone)]
pub struct PresenceFeed {
    tx: Sender<PresenceEvent>,
}

impl PresenceFeed {
    /// Create a feed and the receiver to hand to [`PresenceTracker::connect`].
    pub fn channel() -> (Self, Receiver<PresenceEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Push an event. Returns `false` once the tracker is gone.
    pub fn send(&self, event: PresenceEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// A remote cursor ready to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleCursor<'a> {
    pub record: &'a PresenceRecord,
    /// Stacking order. Higher draws on top.
    pub z_index: usize,
}

/// Tracks the local player and every remote cursor.
#[derive(Debug)]
pub struct PresenceTracker {
    local: PresenceRecord,
    /// Remote cursors in listing order.
    cursors: Vec<PresenceRecord>,
    max_visible: usize,
    following: Option<String>,
    feed: Option<Receiver<PresenceEvent>>,
    /// Pending outgoing messages (JSON strings).
    outgoing: Vec<String>,
}

impl PresenceTracker {
    pub fn new(local: PresenceRecord, max_visible: usize) -> Self {
        Self {
            local,
            cursors: Vec::new(),
            max_visible,
            following: None,
            feed: None,
            outgoing: Vec::new(),
        }
    }

    /// Start consuming remote events from `feed`.
    pub fn connect(&mut self, feed: Receiver<PresenceEvent>) {
        self.feed = Some(feed);
    }

    pub fn is_connected(&self) -> bool {
        self.feed.is_some()
    }

    /// Stop consuming remote events and announce that the local cursor left.
    pub fn disconnect(&mut self) {
        self.feed = None;
        self.cursors.clear();
        self.following = None;
        self.queue(&PresenceEvent::Leave {
            cursor_id: self.local.cursor_id.clone(),
        });
    }

    /// The local player's record, as broadcast to others.
    pub fn local_record(&self) -> &PresenceRecord {
        &self.local
    }

    /// Update where the local player is and queue a broadcast.
    pub fn set_location(&mut self, location: Option<CursorLocation>, t: u64) {
        self.local.location = location;
        self.local.t = t;
        self.queue(&PresenceEvent::Update(self.local.clone()));
    }

    fn queue(&mut self, event: &PresenceEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.outgoing.push(json),
            Err(e) => log::error!("Failed to serialize presence event: {}", e),
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Remote cursors in listing order.
    pub fn cursors(&self) -> &[PresenceRecord] {
        &self.cursors
    }

    pub fn get(&self, cursor_id: &str) -> Option<&PresenceRecord> {
        self.cursors.iter().find(|c| c.cursor_id == cursor_id)
    }

    /// Insert or replace a remote cursor.
    ///
    /// Returns `false` when the record is the local cursor echoed back, or
    /// older than what is already known.
    pub fn upsert(&mut self, record: PresenceRecord) -> bool {
        if record.cursor_id == self.local.cursor_id {
            return false;
        }
        match self.cursors.iter_mut().find(|c| c.cursor_id == record.cursor_id) {
            Some(existing) if existing.t > record.t => false,
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.cursors.push(record);
                true
            }
        }
    }

    /// Drop a remote cursor. Following it stops.
    pub fn leave(&mut self, cursor_id: &str) -> bool {
        let before = self.cursors.len();
        self.cursors.retain(|c| c.cursor_id != cursor_id);
        if self.following.as_deref() == Some(cursor_id) {
            self.following = None;
        }
        self.cursors.len() != before
    }

    /// Apply one event. Returns whether anything changed.
    pub fn apply(&mut self, event: PresenceEvent) -> bool {
        match event {
            PresenceEvent::Update(record) => self.upsert(record),
            PresenceEvent::Leave { cursor_id } => self.leave(&cursor_id),
        }
    }

    /// Drain the feed without blocking. Returns the events that changed
    /// state, in arrival order.
    pub fn poll(&mut self) -> Vec<PresenceEvent> {
        let mut events = Vec::new();
        let mut disconnected = false;

        if let Some(ref rx) = self.feed {
            loop {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        if disconnected {
            log::info!("Presence feed disconnected");
            self.feed = None;
        }

        events
            .into_iter()
            .filter(|event| self.apply(event.clone()))
            .collect()
    }

    /// Cursors to draw, at most `max_visible`, in listing order. Later
    /// entries get a higher z-index so the most recently listed is on top.
    /// Remote z-indices run from 1 up; the local avatar sits above them at
    /// [`local_z_index`](Self::local_z_index).
    pub fn visible(&self) -> Vec<VisibleCursor<'_>> {
        self.cursors
            .iter()
            .take(self.max_visible)
            .enumerate()
            .map(|(i, record)| VisibleCursor {
                record,
                z_index: i + 1,
            })
            .collect()
    }

    /// Stacking order of the local avatar, above every visible remote.
    pub fn local_z_index(&self) -> usize {
        self.cursors.len().min(self.max_visible) + 1
    }

    /// Cursors not drawn because of the visibility cap.
    pub fn overflow_count(&self) -> usize {
        self.cursors.len().saturating_sub(self.max_visible)
    }

    /// Start following `cursor_id`. Returns where to navigate, or `None`
    /// when the cursor is unknown or has no location yet.
    pub fn follow(&mut self, cursor_id: &str) -> Option<CursorLocation> {
        let location = self.get(cursor_id)?.location.clone();
        self.following = Some(cursor_id.to_string());
        location
    }

    pub fn unfollow(&mut self) {
        self.following = None;
    }

    pub fn following(&self) -> Option<&str> {
        self.following.as_deref()
    }

    /// Current location of the followed cursor.
    pub fn followed_location(&self) -> Option<&CursorLocation> {
        self.get(self.following.as_deref()?)?.location.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str, t: u64) -> PresenceRecord {
        PresenceRecord {
            t,
            ..PresenceRecord::new(id, format!("user-{id}"))
        }
    }

    fn located(id: &str, t: u64, x: f64) -> PresenceRecord {
        PresenceRecord {
            location: Some(CursorLocation {
                scene_id: Some("page".into()),
                position: Point::new(x, 0.0),
                selection: vec![],
            }),
            ..remote(id, t)
        }
    }

    fn tracker() -> PresenceTracker {
        PresenceTracker::new(PresenceRecord::new("me", "user-me"), DEFAULT_MAX_VISIBLE_CURSORS)
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(
            SerializableColor::from_hex("#fff"),
            Some(SerializableColor::white())
        );
        assert_eq!(
            SerializableColor::from_hex("#10203040"),
            Some(SerializableColor::new(0x10, 0x20, 0x30, 0x40))
        );
        assert_eq!(SerializableColor::from_hex("#12"), None);
        assert_eq!(SerializableColor::from_hex("red"), None);
        assert_eq!(SerializableColor::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_palette_roles() {
        let palette = CursorPalette::default();
        let avatar = palette.avatar_colors();
        assert_eq!(avatar.ring, palette.shade(Shade::S400));
        assert_eq!(avatar.fill, palette.shade(Shade::S600));
        assert_eq!(palette.label_colors().background, palette.shade(Shade::S500));

        let color: Color = palette.shade(Shade::S950).into();
        assert_eq!(SerializableColor::from(color), palette.shade(Shade::S950));
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let mut presence = tracker();
        assert!(presence.upsert(located("a", 10, 1.0)));
        assert!(presence.upsert(remote("b", 10)));
        assert!(!presence.upsert(located("a", 5, 99.0)));
        assert!(presence.upsert(located("a", 20, 2.0)));

        let ids: Vec<&str> = presence.cursors().iter().map(|c| c.cursor_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        let a = presence.get("a").unwrap();
        assert_eq!(a.location.as_ref().unwrap().position.x, 2.0);

        // Our own cursor echoed back is ignored.
        assert!(!presence.upsert(remote("me", 100)));
    }

    #[test]
    fn test_visible_is_capped() {
        let mut presence = PresenceTracker::new(PresenceRecord::new("me", "u"), 2);
        for (i, id) in ["a", "b", "c"].into_iter().enumerate() {
            presence.upsert(remote(id, i as u64));
        }
        let visible = presence.visible();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].record.cursor_id, "a");
        assert_eq!(visible[1].record.cursor_id, "b");
        assert!(visible[1].z_index > visible[0].z_index);
        assert_eq!(presence.overflow_count(), 1);
    }

    #[test]
    fn test_local_avatar_stacks_on_top() {
        let mut presence = PresenceTracker::new(PresenceRecord::new("me", "u"), 3);
        assert_eq!(presence.local_z_index(), 1);

        for (i, id) in ["a", "b", "c", "d"].into_iter().enumerate() {
            presence.upsert(remote(id, i as u64));
        }
        let z: Vec<usize> = presence.visible().iter().map(|c| c.z_index).collect();
        assert_eq!(z, [1, 2, 3]);
        assert_eq!(presence.local_z_index(), 4);

        presence.leave("a");
        presence.leave("b");
        assert_eq!(presence.visible().len(), 2);
        assert_eq!(presence.local_z_index(), 3);
    }

    #[test]
    fn test_follow_and_leave() {
        let mut presence = tracker();
        presence.upsert(located("a", 1, 7.0));
        presence.upsert(remote("b", 1));

        assert_eq!(presence.follow("a").map(|l| l.position.x), Some(7.0));
        assert_eq!(presence.following(), Some("a"));
        presence.upsert(located("a", 2, 8.0));
        assert_eq!(presence.followed_location().map(|l| l.position.x), Some(8.0));

        assert_eq!(presence.follow("b"), None);
        assert_eq!(presence.following(), Some("b"));
        assert!(presence.follow("ghost").is_none());

        assert!(presence.leave("b"));
        assert_eq!(presence.following(), None);
        assert!(!presence.leave("b"));
    }

    #[test]
    fn test_poll_drains_feed() {
        let mut presence = tracker();
        let (feed, rx) = PresenceFeed::channel();
        presence.connect(rx);

        assert!(feed.send(PresenceEvent::Update(remote("a", 1))));
        assert!(feed.send(PresenceEvent::Update(remote("a", 0))));
        assert!(feed.send(PresenceEvent::Update(remote("b", 1))));
        assert!(feed.send(PresenceEvent::Leave {
            cursor_id: "a".into()
        }));

        let applied = presence.poll();
        assert_eq!(applied.len(), 3);
        assert_eq!(presence.cursors().len(), 1);
        assert!(presence.poll().is_empty());
        assert!(presence.is_connected());

        drop(feed);
        presence.poll();
        assert!(!presence.is_connected());
    }

    #[test]
    fn test_outgoing_queue() {
        let mut presence = tracker();
        presence.set_location(
            Some(CursorLocation {
                scene_id: None,
                position: Point::new(3.0, 4.0),
                selection: vec!["n".into()],
            }),
            42,
        );
        let out = presence.take_outgoing();
        assert_eq!(out.len(), 1);
        let event: PresenceEvent = serde_json::from_str(&out[0]).unwrap();
        match event {
            PresenceEvent::Update(record) => {
                assert_eq!(record.cursor_id, "me");
                assert_eq!(record.t, 42);
            }
            PresenceEvent::Leave { .. } => panic!("expected update"),
        }
        assert!(!presence.has_outgoing());

        presence.disconnect();
        let out = presence.take_outgoing();
        assert!(out[0].contains("\"leave\""));
    }
}
