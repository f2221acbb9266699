//! tintbar-core - style-driven status icon rendering.
//!
//! The crate keeps a small set of rendered, tinted status icons coherent
//! with a live style configuration:
//!
//! - [`style`]: the configuration record and the aspect bitmask describing
//!   what changed.
//! - [`cache`] and [`resolver`]: normalized icon keys, the artifact cache and
//!   the resolution pipeline (icon set selection plus tint).
//! - [`bus`]: synchronous change notification to registered listeners.
//! - [`tracker`] and [`cluster`]: per-signal connection/activity state that
//!   repaints strength and activity icons on a host surface.
//! - [`manager`]: the owner tying configuration, resolver and bus together.

pub mod artifact;
pub mod assets;
pub mod bus;
pub mod cache;
pub mod cluster;
pub mod color;
pub mod config;
pub mod consumers;
pub mod error;
pub mod host;
pub mod logging;
pub mod manager;
pub mod resolver;
pub mod style;
pub mod tables;
pub mod tracker;

pub use artifact::{Artifact, IconImage, IconSet, Tint, TintMode};
pub use assets::{AssetSource, DirectoryAssets, MemoryAssets};
pub use bus::{FnListener, NotificationBus, StyleListener};
pub use cache::{ArtifactKind, CacheKey, CacheStats, IconArtifactCache};
pub use cluster::{ClusterOptions, SignalCluster};
pub use color::Color;
pub use config::Config;
pub use error::{Error, FieldAccessError, ResolveError, Result};
pub use manager::IconManager;
pub use resolver::{IconResolver, NormalizedKey, Resolution};
pub use style::{Aspects, IconStyle, SignalIconMode, StyleConfiguration, StyleEvent};
pub use tracker::{ActivityGlyph, SignalActivityTracker, SignalType};
