//! na-bridge-core - shared library for the voice-assistant playback bridge.
//!
//! This crate bridges a self-hosted music server's playback queue and
//! voice-assistant speaker devices via the vendor cloud API. It is designed
//! to be used by a standalone headless server binary.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Runtime configuration
//! - [`cookies`]: Cookie-jar persistence for the vendor session
//! - [`http`]: HTTP transport abstraction
//! - [`vendor`]: Vendor cloud client (login, re-auth, devices/volume/commands)
//! - [`queue`]: The shared playback queue
//! - [`skill`]: Voice-skill webhook request/response types and dispatcher
//! - [`api`]: HTTP API layer (router, app state, server startup)
//! - [`error`]: Centralized error types

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod cookies;
pub mod error;
pub mod http;
pub mod queue;
pub mod skill;
pub mod vendor;

pub use api::{start_server, AppState, AppStateBuilder, HealthCache, ServerError};
pub use config::Config;
pub use error::{BridgeError, ErrorCode, HttpError, LoginError, Result};
pub use queue::{PlaybackState, Queue, Song};
pub use skill::{Dispatcher, DirectiveEnvelope, Request, RequestContext, RequestEnvelope};
pub use vendor::{
    build_speak, build_text_command, build_volume, CommandEnvelope, Device, DevicesResponse,
    DeviceTarget, Vendor, VendorClient, VendorConfig, Volume, VolumesResponse,
};
