//! Data models for the rig control panel.
//!
//! - [`RigConfig`]: everything loaded from `rigpanel.yaml`, split per concern
//!   ([`SerialSettings`], [`DaqSettings`], [`ConsoleSettings`], [`PanelSettings`],
//!   [`LoggingSettings`])
//!
//! All structs derive `Serialize`/`Deserialize` and fill in missing keys with
//! the rig's factory defaults, so a partial file is always valid.

pub mod config;

pub use config::{
    ConsoleSettings, DaqSettings, LoggingSettings, PanelSettings, RigConfig, SerialSettings,
};
