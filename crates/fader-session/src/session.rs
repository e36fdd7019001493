//! Audio session
//!
//! The top-level object a host embeds: two decks, the mixer, and the
//! sidechain ducker, plus a subscription list so UI layers hear about
//! state changes instead of polling. One `AudioSession` per audio
//! context; everything hangs off it explicitly.

use fader_core::effect::FxPreset;
use fader_core::mixer::{CrossfaderCurve, Mixer};
use fader_core::sidechain::{SidechainConfig, SidechainDucker};
use fader_core::types::{DeckId, StereoBuffer, NUM_DECKS};

use crate::deck::{Deck, TrackInfo};
use crate::store::{StateStore, StoreError};

/// State change notifications delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TrackLoaded { deck: DeckId, title: String },
    PlayStateChanged { deck: DeckId, playing: bool },
    LoopChanged { deck: DeckId },
    HotCueChanged { deck: DeckId, slot: u8 },
    SlipChanged { deck: DeckId, active: bool },
    FxPresetChanged { deck: DeckId, preset: FxPreset },
    CrossfaderMoved { position: f64 },
    SidechainChanged { ducking: bool },
}

type Observer = Box<dyn FnMut(&SessionEvent) + Send>;

/// Handle for removing a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// The complete mixing session
pub struct AudioSession {
    decks: [Deck; NUM_DECKS],
    mixer: Mixer,
    ducker: SidechainDucker,
    was_ducking: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl AudioSession {
    pub fn new() -> Self {
        Self {
            decks: [Deck::new(DeckId::A), Deck::new(DeckId::B)],
            mixer: Mixer::new(),
            ducker: SidechainDucker::new(SidechainConfig::default()),
            was_ducking: false,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn deck(&self, id: DeckId) -> &Deck {
        &self.decks[id.index()]
    }

    pub fn deck_mut(&mut self, id: DeckId) -> &mut Deck {
        &mut self.decks[id.index()]
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }

    pub fn ducker(&self) -> &SidechainDucker {
        &self.ducker
    }

    pub fn set_sidechain_config(&mut self, config: SidechainConfig) {
        self.ducker.set_config(config);
    }

    // --- observers ---

    /// Register a state change observer
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Drop a subscription; unknown ids are ignored
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.observers.retain(|(sub_id, _)| *sub_id != id);
    }

    fn emit(&mut self, event: SessionEvent) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }

    // --- deck operations (with change notification) ---

    pub fn load_track(&mut self, deck: DeckId, track: TrackInfo) {
        let title = track.title.clone();
        self.deck_mut(deck).load_track(track);
        self.emit(SessionEvent::TrackLoaded { deck, title });
    }

    pub fn toggle_play(&mut self, deck: DeckId) {
        self.deck_mut(deck).toggle_play();
        let playing = self.deck(deck).is_playing();
        self.emit(SessionEvent::PlayStateChanged { deck, playing });
    }

    pub fn set_hot_cue(&mut self, deck: DeckId, slot: u8, label: Option<String>) {
        self.deck_mut(deck).set_hot_cue(slot, label);
        self.emit(SessionEvent::HotCueChanged { deck, slot });
    }

    pub fn trigger_hot_cue(&mut self, deck: DeckId, slot: u8) {
        self.deck_mut(deck).trigger_hot_cue(slot);
    }

    pub fn set_loop(&mut self, deck: DeckId, bars: f64) {
        self.deck_mut(deck).set_loop(bars);
        self.emit(SessionEvent::LoopChanged { deck });
    }

    pub fn toggle_loop(&mut self, deck: DeckId) {
        self.deck_mut(deck).toggle_loop();
        self.emit(SessionEvent::LoopChanged { deck });
    }

    pub fn toggle_slip(&mut self, deck: DeckId) {
        self.deck_mut(deck).toggle_slip();
        let active = self.deck(deck).is_slipping();
        self.emit(SessionEvent::SlipChanged { deck, active });
    }

    pub fn load_fx_preset(&mut self, deck: DeckId, preset: FxPreset) {
        self.deck_mut(deck).load_fx_preset(preset);
        self.emit(SessionEvent::FxPresetChanged { deck, preset });
    }

    pub fn set_crossfader(&mut self, position: f64) {
        self.mixer.crossfader_mut().set_position(position);
        let position = self.mixer.crossfader().position();
        self.emit(SessionEvent::CrossfaderMoved { position });
    }

    /// Kick off an automated crossfade
    pub fn start_crossfade(&mut self, target: f64, duration: f64) {
        self.mixer.crossfader_mut().start_transition(target, duration);
    }

    pub fn set_crossfader_curve(&mut self, curve: CrossfaderCurve) {
        self.mixer.crossfader_mut().set_curve(curve);
    }

    // --- persistence ---

    /// Persist a deck's cue bank under the given track id
    pub fn save_deck_cues(
        &self,
        deck: DeckId,
        track_id: &str,
        store: &mut dyn StateStore,
    ) -> Result<(), StoreError> {
        store.save_cues(track_id, &self.deck(deck).cues)
    }

    /// Restore a previously saved cue bank onto a deck
    ///
    /// Missing records are fine; the deck keeps its (empty) bank.
    pub fn restore_deck_cues(
        &mut self,
        deck: DeckId,
        track_id: &str,
        store: &dyn StateStore,
    ) -> Result<(), StoreError> {
        match store.load_cues(track_id) {
            Ok(cues) => {
                self.deck_mut(deck).cues = cues;
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // --- clocking and audio ---

    /// Advance both deck clocks and any running crossfade by `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        for deck in &mut self.decks {
            deck.advance(dt);
        }
        let was_moving = self.mixer.crossfader().is_transitioning();
        self.mixer.crossfader_mut().tick(dt);
        if was_moving {
            let position = self.mixer.crossfader().position();
            self.emit(SessionEvent::CrossfaderMoved { position });
        }
    }

    /// Process one audio block end to end
    ///
    /// Deck buffers run through their per-deck filter/FX, then the mixer
    /// builds master and headphone buses. The key signal (microphone)
    /// ducks the master when the sidechain is enabled.
    pub fn process_audio(
        &mut self,
        deck_buffers: &mut [StereoBuffer; NUM_DECKS],
        key: &StereoBuffer,
        master_out: &mut StereoBuffer,
        headphone_out: &mut StereoBuffer,
    ) {
        for (deck, buffer) in self.decks.iter_mut().zip(deck_buffers.iter_mut()) {
            deck.process_audio(buffer);
        }
        self.mixer.process(deck_buffers, master_out, headphone_out);
        self.ducker.process(key, master_out);

        let ducking = self.ducker.is_ducking();
        if ducking != self.was_ducking {
            self.was_ducking = ducking;
            self.emit(SessionEvent::SidechainChanged { ducking });
        }
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new()
    }
}
