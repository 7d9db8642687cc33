//! Alert sounds for chat filter hits.
//!
//! The pipeline never touches an audio device itself. A host injects an
//! [`AlertPlayer`] and the [`AlertRouter`] decides, per hit, whether the
//! rule's sound should be played. The router owns the player; dropping the
//! pipeline releases it.
//!
//! A hit is silent when any of these hold: global chat mute is on, the rule
//! is muted, the rule has no sound, or no player was injected.

use std::fmt;

use th_classifier::ChatFilterEngine;
use th_core::RuleKey;

use crate::error::AlertError;
use crate::events::LogEvent;

/// Plays alert sounds.
///
/// # Examples
///
/// ```
/// use th_pipeline::{AlertError, AlertPlayer};
///
/// #[derive(Default)]
/// struct Log(Vec<String>);
///
/// impl AlertPlayer for Log {
///     fn play(&mut self, sound: &str) -> Result<(), AlertError> {
///         self.0.push(sound.to_owned());
///         Ok(())
///     }
/// }
/// ```
pub trait AlertPlayer: Send {
    /// Plays `sound`, the file name configured on the matching rule.
    fn play(&mut self, sound: &str) -> Result<(), AlertError>;
}

impl<P: AlertPlayer + ?Sized> AlertPlayer for Box<P> {
    fn play(&mut self, sound: &str) -> Result<(), AlertError> {
        (**self).play(sound)
    }
}

/// Decides which filter hits are audible and forwards them to the player.
#[derive(Default)]
pub struct AlertRouter {
    player: Option<Box<dyn AlertPlayer>>,
    muted: bool,
}

impl fmt::Debug for AlertRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRouter")
            .field("has_player", &self.player.is_some())
            .field("muted", &self.muted)
            .finish()
    }
}

impl AlertRouter {
    /// Creates a router with no player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router that plays through `player`.
    #[must_use]
    pub fn with_player(player: impl AlertPlayer + 'static) -> Self {
        Self {
            player: Some(Box::new(player)),
            muted: false,
        }
    }

    /// Replaces the player, returning the previous one.
    pub fn set_player(
        &mut self,
        player: Option<Box<dyn AlertPlayer>>,
    ) -> Option<Box<dyn AlertPlayer>> {
        std::mem::replace(&mut self.player, player)
    }

    /// Returns `true` if a player is installed.
    #[inline]
    #[must_use]
    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Sets global chat mute.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Returns `true` if every alert is silenced.
    #[inline]
    #[must_use]
    pub const fn muted(&self) -> bool {
        self.muted
    }

    /// Plays the alert for `event` if it is an audible filter hit.
    ///
    /// Returns `true` if a sound was handed to the player and it succeeded.
    /// Playback failures are logged and otherwise ignored.
    pub fn route(&mut self, event: &LogEvent, filters: &ChatFilterEngine) -> bool {
        let Some((key, _)) = event.filter_hit() else {
            return false;
        };
        let Some(sound) = self.audible_sound(key, filters) else {
            return false;
        };
        let Some(player) = self.player.as_mut() else {
            return false;
        };

        match player.play(sound) {
            Ok(()) => {
                tracing::debug!(%key, sound, "played chat alert");
                true
            }
            Err(err) => {
                tracing::warn!(%key, sound, error = %err, "chat alert failed");
                false
            }
        }
    }

    fn audible_sound<'a>(&self, key: RuleKey, filters: &'a ChatFilterEngine) -> Option<&'a str> {
        if self.muted {
            return None;
        }
        let rule = filters.rule(key)?;
        let sound = rule.sound.trim();
        (!rule.muted && !sound.is_empty()).then_some(sound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use th_core::SearchEntry;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn played(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl AlertPlayer for Recorder {
        fn play(&mut self, sound: &str) -> Result<(), AlertError> {
            self.0.lock().unwrap().push(sound.to_owned());
            Ok(())
        }
    }

    struct Broken;

    impl AlertPlayer for Broken {
        fn play(&mut self, sound: &str) -> Result<(), AlertError> {
            Err(AlertError::SoundNotFound(sound.to_owned()))
        }
    }

    fn hit(key: u32) -> LogEvent {
        LogEvent::FilterMatch {
            line: "[1] Sage trade wts ci map".to_owned(),
            key: RuleKey::new(key),
            term: Some("ci map".to_owned()),
        }
    }

    fn engine() -> ChatFilterEngine {
        let mut engine = ChatFilterEngine::new();
        engine.upsert(
            RuleKey::new(1),
            SearchEntry::new("maps").with_strings("ci map").with_sound("horn.ogg"),
        );
        engine.upsert(
            RuleKey::new(2),
            SearchEntry::new("quiet").with_strings("ci map").with_muted(true),
        );
        engine.upsert(
            RuleKey::new(3),
            SearchEntry::new("silent").with_strings("ci map").with_sound(" "),
        );
        engine
    }

    #[test]
    fn test_plays_rule_sound() {
        let recorder = Recorder::default();
        let mut router = AlertRouter::with_player(recorder.clone());
        assert!(router.route(&hit(1), &engine()));
        assert_eq!(recorder.played(), ["horn.ogg"]);
    }

    #[test]
    fn test_muted_rule_blank_sound_and_unknown_key_are_silent() {
        let recorder = Recorder::default();
        let mut router = AlertRouter::with_player(recorder.clone());
        let filters = engine();
        assert!(!router.route(&hit(2), &filters));
        assert!(!router.route(&hit(3), &filters));
        assert!(!router.route(&hit(9), &filters));
        assert!(recorder.played().is_empty());
    }

    #[test]
    fn test_global_mute() {
        let recorder = Recorder::default();
        let mut router = AlertRouter::with_player(recorder.clone());
        router.set_muted(true);
        assert!(!router.route(&hit(1), &engine()));
        router.set_muted(false);
        assert!(router.route(&hit(1), &engine()));
        assert_eq!(recorder.played().len(), 1);
    }

    #[test]
    fn test_category_events_and_missing_player() {
        let mut router = AlertRouter::new();
        assert!(!router.has_player());
        assert!(!router.route(&hit(1), &engine()));

        let recorder = Recorder::default();
        router.set_player(Some(Box::new(recorder.clone())));
        let event = LogEvent::Category {
            category: th_core::Category::RUMBLE_START,
            line: "x".to_owned(),
            source: crate::RootKind::GameLog,
        };
        assert!(!router.route(&event, &engine()));
        assert!(recorder.played().is_empty());
    }

    #[test]
    fn test_player_failure_is_not_fatal() {
        let mut router = AlertRouter::with_player(Broken);
        assert!(!router.route(&hit(1), &engine()));
    }
}
