//! Core library for the Roblox toolkit.
//!
//! Two independent flows live here. The friend lookup (`friends`, `lookup`,
//! `web`) validates a Roblox user id, fetches the public friend list and
//! renders the result. The montage helper (`preflight`, `audio`, `analysis`,
//! `encoder`, `process`, `montage`) checks its inputs, reports the detected
//! tempo and hands a fixed filter graph to FFmpeg.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod encoder;
pub mod error;
pub mod friends;
pub mod lookup;
pub mod montage;
pub mod preflight;
pub mod process;
pub mod web;

pub use analysis::{analyze_file, BeatAnalysis, BeatAnalyzer};
pub use audio::{decode_mono, DecodedAudio};
pub use config::{AppConfig, MontageConfig, ServerConfig};
pub use encoder::{build_command, EncodeSettings, EncoderCommand, MontagePaths};
pub use error::{Result, ToolkitError};
pub use friends::{FetchError, FriendRecord, FriendSource, FriendsFetcher};
pub use lookup::{describe_fetch_error, validate_user_id, FriendLookup, LookupOutcome, ValidationError};
pub use montage::{BeatSource, FileBeatSource, MontageRenderer, RenderOutcome};
pub use process::{CommandRunner, ProcessRunner};
