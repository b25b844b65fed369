pub mod config;
pub mod emitter;
pub mod error;
pub mod keyboard;
pub mod model;
pub mod playback;
pub mod sim;
pub mod surface;
pub mod terminal;
pub mod timer;
pub mod typewriter;

pub use config::{RawConfig, TypewriterConfig};
pub use error::TypewriterError;
pub use surface::{shared, BufferSurface, SharedSurface, Surface};
pub use typewriter::{Typewriter, WriteOptions};
