//! Deck state
//!
//! One deck owns a loaded track, its playhead, and every per-deck
//! performance feature: beat grid, tap tempo, quantize, loops, hot cues,
//! slip mode and the effect chain. The session drives each deck's clock
//! through [`Deck::advance`]; decks never read the wall clock themselves,
//! which keeps every behavior testable.

use fader_core::effect::native::{FilterEffect, FilterSettings};
use fader_core::effect::{build_preset, Effect, EffectChain, FxPreset};
use fader_core::engine::{CueBank, Loop, LoopRoll, SlipMode};
use fader_core::grid::{BeatGrid, QuantizeSettings, TapTempo, DEFAULT_BPM};
use fader_core::types::{DeckId, PlayState, StereoBuffer};

/// A track loaded onto a deck
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    /// Duration in seconds
    pub duration: f64,
    /// BPM from analysis, if any
    pub bpm: Option<f64>,
}

/// Playback deck with all per-deck performance state
pub struct Deck {
    pub id: DeckId,
    track: Option<TrackInfo>,
    position: f64,
    play_state: PlayState,
    /// Deck-local monotonic clock in seconds, drives slip and loop roll
    clock: f64,

    pub grid: Option<BeatGrid>,
    pub tap: TapTempo,
    pub quantize: QuantizeSettings,
    pub cues: CueBank,
    pub loop_region: Option<Loop>,
    loop_roll: LoopRoll,
    slip: SlipMode,

    filter: FilterEffect,
    fx: EffectChain,
    fx_preset: FxPreset,
}

impl Deck {
    pub fn new(id: DeckId) -> Self {
        Self {
            id,
            track: None,
            position: 0.0,
            play_state: PlayState::Stopped,
            clock: 0.0,
            grid: None,
            tap: TapTempo::new(),
            quantize: QuantizeSettings::default(),
            cues: CueBank::new(),
            loop_region: None,
            loop_roll: LoopRoll::new(),
            slip: SlipMode::new(),
            filter: FilterEffect::new(),
            fx: EffectChain::new(),
            fx_preset: FxPreset::Clean,
        }
    }

    /// Load a track, resetting all playback state
    ///
    /// A grid is generated immediately; tracks without tempo metadata get
    /// the 120 BPM default so quantize and loops work from the first beat.
    pub fn load_track(&mut self, track: TrackInfo) {
        let bpm = track.bpm.unwrap_or(DEFAULT_BPM);
        self.grid = BeatGrid::generate(bpm, 0.0, track.duration, 4)
            .map_err(|e| log::warn!("deck {}: bad grid for {}: {e}", self.id, track.title))
            .ok();

        log::info!("deck {}: loaded \"{}\" at {bpm} BPM", self.id, track.title);
        self.track = Some(track);
        self.position = 0.0;
        self.play_state = PlayState::Stopped;
        self.cues.clear_all();
        self.loop_region = None;
        self.loop_roll = LoopRoll::new();
        self.slip = SlipMode::new();
        self.tap.reset();
        self.filter.reset();
        self.fx.reset();
    }

    pub fn track(&self) -> Option<&TrackInfo> {
        self.track.as_ref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn is_playing(&self) -> bool {
        self.play_state == PlayState::Playing
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn play(&mut self) {
        if self.track.is_some() {
            self.play_state = PlayState::Playing;
        }
    }

    pub fn pause(&mut self) {
        self.play_state = PlayState::Stopped;
    }

    pub fn toggle_play(&mut self) {
        match self.play_state {
            PlayState::Playing => self.pause(),
            PlayState::Stopped => self.play(),
        }
    }

    /// Advance the deck clock and, when playing, the playhead
    ///
    /// Loop wrap and track-end stop are applied here. The clock always
    /// runs so slip and loop roll stay in real time even while paused.
    pub fn advance(&mut self, dt: f64) {
        self.clock += dt;
        if !self.is_playing() {
            return;
        }

        self.position += dt;

        if self.loop_roll.is_active() {
            self.position = self.loop_roll.audible_position(self.position);
        } else if let Some(region) = &self.loop_region {
            if let Some(wrapped) = region.playback_wrap(self.position) {
                self.position = wrapped;
            }
        }

        if let Some(track) = &self.track {
            if self.position >= track.duration {
                self.position = track.duration;
                self.play_state = PlayState::Stopped;
                log::debug!("deck {}: reached end of track", self.id);
            }
        }
    }

    /// Seek to an exact position, clamped to the track
    pub fn seek(&mut self, time: f64) {
        let duration = self.track.as_ref().map(|t| t.duration).unwrap_or(0.0);
        self.position = time.clamp(0.0, duration);
    }

    /// Seek through the quantize settings (snaps when enabled)
    pub fn seek_quantized(&mut self, time: f64) {
        let snapped = self.quantize.apply(time, self.grid.as_ref());
        self.seek(snapped);
    }

    /// Register a tap; a settled estimate is written into the grid
    ///
    /// An active loop is rebuilt against the new tempo so its bar count
    /// stays honest.
    pub fn tap_tempo(&mut self) -> Option<f64> {
        let bpm = self.tap.tap();
        if let (Some(bpm), Some(grid)) = (bpm, self.grid.as_mut()) {
            if self.tap.tap_count() >= 4 {
                if let Err(e) = grid.set_bpm(bpm) {
                    log::warn!("deck {}: tap tempo rejected: {e}", self.id);
                }
                if let Some(region) = &mut self.loop_region {
                    region.resize(region.bars, grid);
                }
            }
        }
        bpm
    }

    // --- hot cues ---

    /// Store the current position in a cue slot
    pub fn set_hot_cue(&mut self, slot: u8, label: Option<String>) {
        self.cues.set(slot, self.position, label);
    }

    /// Jump to a cue slot; empty slots are a no-op
    pub fn trigger_hot_cue(&mut self, slot: u8) {
        if let Some(time) = self.cues.jump(slot) {
            self.seek(time);
        }
    }

    // --- loops ---

    /// Start a loop of `bars` bars at the (quantized) current position
    pub fn set_loop(&mut self, bars: f64) {
        let Some(grid) = &self.grid else {
            log::warn!("deck {}: no grid, cannot set loop", self.id);
            return;
        };
        let start = self.quantize.apply(self.position, Some(grid));
        self.loop_region = Some(Loop::from_bars(start, bars, grid));
    }

    /// Toggle the parked loop on or off
    pub fn toggle_loop(&mut self) {
        if let Some(region) = &mut self.loop_region {
            region.is_active = !region.is_active;
        }
    }

    pub fn halve_loop(&mut self) {
        if let (Some(region), Some(grid)) = (&mut self.loop_region, &self.grid) {
            region.halve(grid);
        }
    }

    pub fn double_loop(&mut self) {
        if let (Some(region), Some(grid)) = (&mut self.loop_region, &self.grid) {
            region.double(grid);
        }
    }

    /// Shift the loop a whole loop-length forward or backward
    pub fn move_loop(&mut self, direction: f64) {
        if let Some(region) = &mut self.loop_region {
            let len = region.length();
            region.shift(direction.signum() * len);
        }
    }

    // --- loop roll ---

    /// Engage a roll; hitting the active length again releases it
    pub fn engage_loop_roll(&mut self, bars: f64) {
        if self.loop_roll.region().map(|r| r.bars) == Some(bars) {
            self.release_loop_roll();
            return;
        }
        let Some(grid) = &self.grid else {
            return;
        };
        let start = self.quantize.apply(self.position, Some(grid));
        self.loop_roll.engage(start, bars, grid, self.clock);
    }

    /// Release the roll, snapping the playhead to where the track would be
    pub fn release_loop_roll(&mut self) {
        if let Some(resume) = self.loop_roll.release(self.clock) {
            self.seek(resume);
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.loop_roll.is_active()
    }

    // --- slip ---

    pub fn enter_slip(&mut self) {
        self.slip.enter_at(self.position, self.clock);
    }

    /// Leave slip mode, snapping back to the virtual playhead
    pub fn exit_slip(&mut self) {
        if let Some(resume) = self.slip.exit_at(self.clock) {
            self.seek(resume);
        }
    }

    pub fn toggle_slip(&mut self) {
        if self.slip.is_active() {
            self.exit_slip();
        } else {
            self.enter_slip();
        }
    }

    pub fn is_slipping(&self) -> bool {
        self.slip.is_active()
    }

    /// Run a destructive gesture under slip protection
    ///
    /// Enters slip mode if needed and deliberately stays in it afterward,
    /// so chained gestures share one virtual playhead.
    pub fn perform_slip_action(&mut self, action: impl FnOnce(&mut Deck)) {
        if !self.slip.is_active() {
            self.enter_slip();
        }
        action(self);
    }

    /// Where the slip virtual playhead currently is
    pub fn slip_position(&self) -> Option<f64> {
        self.slip.virtual_position_at(self.clock)
    }

    // --- effects ---

    pub fn filter(&self) -> &FilterEffect {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterEffect {
        &mut self.filter
    }

    pub fn filter_settings(&self) -> FilterSettings {
        self.filter.settings()
    }

    pub fn fx_preset(&self) -> FxPreset {
        self.fx_preset
    }

    /// Swap the deck's chain for a preset; tempo carries over
    pub fn load_fx_preset(&mut self, preset: FxPreset) {
        self.fx = build_preset(preset);
        self.fx_preset = preset;
        if let Some(grid) = &self.grid {
            self.fx.set_bpm(grid.bpm);
        }
    }

    pub fn fx(&mut self) -> &mut EffectChain {
        &mut self.fx
    }

    /// Run a block of deck audio through filter and effect chain
    pub fn process_audio(&mut self, buffer: &mut StereoBuffer) {
        self.filter.process(buffer);
        if let Some(grid) = &self.grid {
            self.fx.set_bpm(grid.bpm);
        }
        self.fx.process(buffer);
    }
}
