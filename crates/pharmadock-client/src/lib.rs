//! pharmadock-client: the interactive side of PharmaDock.
//!
//! The page surfaces (message list, viewer container, typed-text banner) and
//! the 3D viewer are reached through the traits in [`conversation`],
//! [`viewer`] and [`landing`]; [`headless`] implements them in memory and
//! [`transport`] talks to the server over HTTP.

pub mod error;
pub mod csrf;
pub mod download;
pub mod markdown;
pub mod conversation;
pub mod viewer;
pub mod landing;
pub mod headless;
pub mod transport;

pub use conversation::{ChatController, TurnOutcome};
pub use error::ClientError;
pub use landing::{LandingInitializer, LandingMessages};
pub use viewer::loader::{LoadOutcome, ViewerLoader};
