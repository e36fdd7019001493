//! Fader Session - host-facing layer over fader-core
//!
//! Owns the deck and mixer state for one audio context: track loading,
//! transport, performance controls, keyboard mapping, configuration, and
//! the persistence boundary. UI layers subscribe to [`SessionEvent`]s
//! rather than polling.

pub mod config;
pub mod deck;
pub mod keybindings;
pub mod session;
pub mod store;

pub use config::{default_config_path, load_config, save_config, Config};
pub use deck::{Deck, TrackInfo};
pub use keybindings::{
    default_keybindings_path, load_keybindings, save_keybindings, Action, KeybindingsConfig,
};
pub use session::{AudioSession, SessionEvent, SubscriptionId};
pub use store::{MemoryStore, MixSettings, StateStore, StoreError};
