//! Icon resolution: raw identity in, tinted artifact out.
//!
//! The resolver owns the artifact cache. Every entry point reads the style
//! configuration snapshot it is handed and never keeps it, so the cache can
//! only ever hold artifacts produced under the configuration that was
//! current when the owner last cleared it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::artifact::{Artifact, IconImage, IconSet, Tint, TintMode};
use crate::assets::AssetSource;
use crate::cache::{ArtifactKind, CacheKey, CacheStats, IconArtifactCache};
use crate::error::ResolveError;
use crate::style::{SignalIconMode, StyleConfiguration};
use crate::tables::{self, FULLY_SUFFIX};

/// Cache identity derived from a raw icon identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Derive the key for `raw`.
    ///
    /// When `fully_connected` is false, a trailing "_fully" is stripped so
    /// the full and partial variants share one entry. Everything else
    /// passes through unchanged. A blank identity cannot name any icon.
    pub fn derive(raw: &str, fully_connected: bool) -> Result<Self, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolveError::UnknownIcon(raw.to_string()));
        }

        let key = match raw.strip_suffix(FULLY_SUFFIX) {
            Some(base) if !fully_connected && !base.is_empty() => base,
            _ => raw,
        };
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Display this artifact.
    Icon(Rc<Artifact>),
    /// Intentionally suppressed; the host keeps its own icon.
    NoArtifact,
}

impl Resolution {
    pub fn artifact(&self) -> Option<&Rc<Artifact>> {
        match self {
            Resolution::Icon(artifact) => Some(artifact),
            Resolution::NoArtifact => None,
        }
    }

    pub fn into_artifact(self) -> Option<Rc<Artifact>> {
        match self {
            Resolution::Icon(artifact) => Some(artifact),
            Resolution::NoArtifact => None,
        }
    }
}

/// Builds tinted artifacts through the cache.
pub struct IconResolver {
    assets: Rc<dyn AssetSource>,
    cache: RefCell<IconArtifactCache>,
}

impl IconResolver {
    pub fn new(assets: Rc<dyn AssetSource>, cache_capacity: usize) -> Self {
        Self {
            assets,
            cache: RefCell::new(IconArtifactCache::new(cache_capacity)),
        }
    }

    /// Resolve a signal strength icon.
    ///
    /// # Arguments
    ///
    /// * `raw` - Icon identity as supplied by the host
    /// * `rail` - 0 for the primary icon, 1 for the secondary icon of dual
    ///   layouts; selects the tint color. Values above 1 use rail 1.
    /// * `fully_connected` - Whether the "_fully" variant is wanted
    pub fn resolve(
        &self,
        style: &StyleConfiguration,
        raw: &str,
        rail: usize,
        fully_connected: bool,
    ) -> Result<Resolution, ResolveError> {
        let rail = rail.min(1);
        let key = NormalizedKey::derive(raw, fully_connected)?;

        if style.signal_icon_mode == SignalIconMode::Disabled {
            trace!("signal icons disabled, not resolving {}", key);
            return Ok(Resolution::NoArtifact);
        }

        if !style.coloring_enabled {
            return self.native_untinted(key.as_str(), raw).map(Resolution::Icon);
        }

        let cache_key = CacheKey::signal(key.as_str(), rail);
        if let Some(artifact) = self.cache.borrow_mut().get(&cache_key) {
            return Ok(Resolution::Icon(artifact));
        }

        let (set, asset) = match style.signal_icon_mode {
            SignalIconMode::Alternate => {
                let asset = tables::alternate_signal_asset(key.as_str())
                    .ok_or_else(|| ResolveError::UnknownIcon(raw.to_string()))?;
                (IconSet::Alternate, asset)
            }
            _ => (IconSet::Native, raw.trim()),
        };

        let tint = Tint {
            color: style.icon_color[rail],
            mode: TintMode::SrcIn,
        };
        let artifact = self.build(key.as_str(), set, asset, tint)?;
        self.cache.borrow_mut().put(cache_key, Rc::clone(&artifact));
        Ok(Resolution::Icon(artifact))
    }

    /// Resolve a basic (non-signal) icon such as alarm or headset.
    ///
    /// Icons absent from the basic table fail with `UnknownIcon`. When the
    /// active style has no replacement asset, the native asset is tinted
    /// with a source-atop composite instead.
    pub fn resolve_basic(
        &self,
        style: &StyleConfiguration,
        raw: &str,
    ) -> Result<Rc<Artifact>, ResolveError> {
        let key = NormalizedKey::derive(raw, true)?;
        let replacement = tables::basic_icon_asset(key.as_str(), style.icon_style)
            .ok_or_else(|| ResolveError::UnknownIcon(raw.to_string()))?;

        if !style.coloring_enabled {
            return self.native_untinted(key.as_str(), key.as_str());
        }

        let cache_key = CacheKey::new(ArtifactKind::Basic, key.as_str(), 0);
        if let Some(artifact) = self.cache.borrow_mut().get(&cache_key) {
            return Ok(artifact);
        }

        let color = style.icon_color[0];
        let artifact = match replacement {
            Some(asset) => self.build(
                key.as_str(),
                IconSet::Alternate,
                asset,
                Tint {
                    color,
                    mode: TintMode::SrcIn,
                },
            )?,
            None => self.build(
                key.as_str(),
                IconSet::Native,
                key.as_str(),
                Tint {
                    color,
                    mode: TintMode::SrcAtop,
                },
            )?,
        };
        self.cache.borrow_mut().put(cache_key, Rc::clone(&artifact));
        Ok(artifact)
    }

    /// Resolve the cellular data-type glyph (3G, LTE, ...) shown next to
    /// the strength icon. Always drawn from the native set.
    pub fn resolve_type_icon(
        &self,
        style: &StyleConfiguration,
        raw: &str,
        rail: usize,
    ) -> Result<Rc<Artifact>, ResolveError> {
        let rail = rail.min(1);
        let key = NormalizedKey::derive(raw, true)?;

        if !style.coloring_enabled {
            return self.native_untinted(key.as_str(), key.as_str());
        }

        let cache_key = CacheKey::new(ArtifactKind::DataType, key.as_str(), rail);
        if let Some(artifact) = self.cache.borrow_mut().get(&cache_key) {
            return Ok(artifact);
        }

        let tint = Tint {
            color: style.icon_color[rail],
            mode: TintMode::SrcIn,
        };
        let artifact = self.build(key.as_str(), IconSet::Native, key.as_str(), tint)?;
        self.cache.borrow_mut().put(cache_key, Rc::clone(&artifact));
        Ok(artifact)
    }

    /// Load an untinted asset from the alternate set, bypassing the cache.
    ///
    /// Used for activity glyphs, which are re-tinted from the pristine
    /// image on every color change.
    pub fn load_pristine(&self, asset: &str) -> Result<Artifact, ResolveError> {
        let image = self.load(IconSet::Alternate, asset)?;
        Ok(Artifact::plain(asset, IconSet::Alternate, asset, image))
    }

    /// Drop every cached artifact.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Drop one cached artifact.
    pub fn evict(&self, key: &CacheKey) -> bool {
        self.cache.borrow_mut().evict(key)
    }

    /// Low-memory hook for the host.
    pub fn trim_memory(&self) {
        self.cache.borrow_mut().trim_memory();
    }

    pub fn resize_cache(&self, capacity: usize) {
        self.cache.borrow_mut().resize(capacity);
    }

    /// Whether a signal strength artifact for `name` on `rail` is cached.
    pub fn is_cached(&self, name: &str, rail: usize) -> bool {
        self.cache.borrow().contains(&CacheKey::signal(name, rail))
    }

    pub fn cached_keys(&self) -> Vec<CacheKey> {
        self.cache.borrow().keys()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    fn native_untinted(&self, key: &str, asset: &str) -> Result<Rc<Artifact>, ResolveError> {
        let image = self.load(IconSet::Native, asset.trim())?;
        Ok(Rc::new(Artifact::plain(key, IconSet::Native, asset.trim(), image)))
    }

    fn build(
        &self,
        key: &str,
        set: IconSet,
        asset: &str,
        tint: Tint,
    ) -> Result<Rc<Artifact>, ResolveError> {
        let image = self.load(set, asset)?;
        debug!(
            "rendering {} from {:?} asset {} with {}",
            key, set, asset, tint.color
        );
        Ok(Rc::new(Artifact::plain(key, set, asset, image).tinted(tint)))
    }

    fn load(&self, set: IconSet, asset: &str) -> Result<IconImage, ResolveError> {
        self.assets.load(set, asset)
    }
}

impl fmt::Debug for IconResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconResolver")
            .field("cache", &self.cache.borrow().stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::color::Color;
    use crate::style::IconStyle;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn grey() -> IconImage {
        IconImage::filled(2, 2, Color::rgb(128, 128, 128))
    }

    fn assets() -> Rc<MemoryAssets> {
        Rc::new(
            MemoryAssets::new()
                .with(IconSet::Native, "stat_sys_signal_3", grey())
                .with(IconSet::Native, "stat_sys_signal_3_fully", grey())
                .with(IconSet::Native, "stat_sys_data_fully_connected_lte", grey())
                .with(IconSet::Native, "stat_sys_alarm", grey())
                .with(IconSet::Alternate, "stat_sys_signal_3", grey())
                .with(IconSet::Alternate, "stat_sys_signal_3_fully", grey())
                .with(IconSet::Alternate, "stat_sys_alarm_classic", grey())
                .with(IconSet::Alternate, "stat_sys_wifi_in", grey()),
        )
    }

    fn resolver(assets: &Rc<MemoryAssets>) -> IconResolver {
        IconResolver::new(Rc::clone(assets) as Rc<dyn AssetSource>, 16)
    }

    fn colored(mode: SignalIconMode) -> StyleConfiguration {
        StyleConfiguration {
            coloring_enabled: true,
            icon_color: [RED, BLUE],
            signal_icon_mode: mode,
            ..StyleConfiguration::default()
        }
    }

    #[test]
    fn test_normalize_strips_fully_when_partial() {
        let partial = NormalizedKey::derive("stat_sys_wifi_signal_3_fully", false).unwrap();
        let plain = NormalizedKey::derive("stat_sys_wifi_signal_3", true).unwrap();
        let full = NormalizedKey::derive("stat_sys_wifi_signal_3_fully", true).unwrap();

        assert_eq!(partial.as_str(), "stat_sys_wifi_signal_3");
        assert_eq!(partial, plain);
        assert_eq!(full.as_str(), "stat_sys_wifi_signal_3_fully");
    }

    #[test]
    fn test_normalize_passes_unknown_through() {
        let key = NormalizedKey::derive("stat_sys_data_fully_connected_lte", false).unwrap();
        assert_eq!(key.as_str(), "stat_sys_data_fully_connected_lte");
        assert!(NormalizedKey::derive("   ", true).is_err());
        assert!(NormalizedKey::derive("", false).is_err());
    }

    #[test]
    fn test_disabled_mode_never_touches_cache() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Disabled);

        for _ in 0..3 {
            let res = resolver.resolve(&style, "stat_sys_signal_3", 0, true).unwrap();
            assert_eq!(res, Resolution::NoArtifact);
        }
        assert_eq!(resolver.cache_stats().lookups, 0);
        assert_eq!(assets.load_count(), 0);
    }

    #[test]
    fn test_coloring_disabled_returns_native_untinted() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = StyleConfiguration::default();

        let artifact = resolver
            .resolve(&style, "stat_sys_signal_3", 0, true)
            .unwrap()
            .into_artifact()
            .unwrap();
        assert_eq!(artifact.set, IconSet::Native);
        assert_eq!(artifact.tint, None);
        assert_eq!(artifact.image, grey());
        assert!(resolver.cached_keys().is_empty());
    }

    #[test]
    fn test_alternate_mode_tints_and_caches() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Alternate);

        let first = resolver
            .resolve(&style, "stat_sys_signal_3", 0, true)
            .unwrap()
            .into_artifact()
            .unwrap();
        assert_eq!(first.set, IconSet::Alternate);
        assert_eq!(first.image.pixel(0, 0), Some(RED));
        assert!(resolver.is_cached("stat_sys_signal_3", 0));

        let loads = assets.load_count();
        let second = resolver
            .resolve(&style, "stat_sys_signal_3", 0, true)
            .unwrap()
            .into_artifact()
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(assets.load_count(), loads);
    }

    #[test]
    fn test_alternate_mode_unknown_icon() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Alternate);

        let err = resolver
            .resolve(&style, "stat_sys_gemini_signal_3", 0, true)
            .unwrap_err();
        assert_eq!(err, ResolveError::UnknownIcon("stat_sys_gemini_signal_3".into()));
    }

    #[test]
    fn test_partial_and_full_share_key_when_partial() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Alternate);

        let a = resolver
            .resolve(&style, "stat_sys_signal_3_fully", 0, false)
            .unwrap();
        let b = resolver.resolve(&style, "stat_sys_signal_3", 0, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(resolver.cached_keys().len(), 1);
    }

    #[test]
    fn test_rails_tint_independently() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Native);

        let primary = resolver
            .resolve(&style, "stat_sys_signal_3", 0, true)
            .unwrap()
            .into_artifact()
            .unwrap();
        let secondary = resolver
            .resolve(&style, "stat_sys_signal_3", 1, true)
            .unwrap()
            .into_artifact()
            .unwrap();
        assert_eq!(primary.image.pixel(0, 0), Some(RED));
        assert_eq!(secondary.image.pixel(0, 0), Some(BLUE));
        assert_eq!(secondary.set, IconSet::Native);
    }

    #[test]
    fn test_missing_asset_is_resource_unavailable() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Native);

        let err = resolver
            .resolve(&style, "stat_sys_signal_9", 0, true)
            .unwrap_err();
        assert!(matches!(err, ResolveError::ResourceUnavailable { .. }));
        assert!(resolver.cached_keys().is_empty());
    }

    #[test]
    fn test_basic_icon_per_style() {
        let assets = assets();
        let resolver = resolver(&assets);
        let mut style = colored(SignalIconMode::Native);

        style.icon_style = IconStyle::Classic;
        let classic = resolver.resolve_basic(&style, "stat_sys_alarm").unwrap();
        assert_eq!(classic.set, IconSet::Alternate);
        assert_eq!(classic.asset, "stat_sys_alarm_classic");
        assert_eq!(classic.tint.map(|t| t.mode), Some(TintMode::SrcIn));

        resolver.clear_cache();
        style.icon_style = IconStyle::Modern;
        let modern = resolver.resolve_basic(&style, "stat_sys_alarm").unwrap();
        assert_eq!(modern.set, IconSet::Native);
        assert_eq!(modern.tint.map(|t| t.mode), Some(TintMode::SrcAtop));
        assert_eq!(modern.image.pixel(0, 0), Some(RED));
    }

    #[test]
    fn test_basic_icon_unknown() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Native);
        assert!(matches!(
            resolver.resolve_basic(&style, "stat_sys_signal_3"),
            Err(ResolveError::UnknownIcon(_))
        ));
    }

    #[test]
    fn test_type_icon_keeps_fully_in_name() {
        let assets = assets();
        let resolver = resolver(&assets);
        let style = colored(SignalIconMode::Alternate);

        let artifact = resolver
            .resolve_type_icon(&style, "stat_sys_data_fully_connected_lte", 1)
            .unwrap();
        assert_eq!(artifact.set, IconSet::Native);
        assert_eq!(artifact.image.pixel(0, 0), Some(BLUE));
        let key = CacheKey::new(ArtifactKind::DataType, "stat_sys_data_fully_connected_lte", 1);
        assert_eq!(resolver.cached_keys(), vec![key.clone()]);
        assert!(resolver.evict(&key));
        assert!(resolver.cached_keys().is_empty());
    }

    #[test]
    fn test_resolution_paths_do_not_share_entries() {
        let assets = Rc::new(
            MemoryAssets::new()
                .with(IconSet::Native, "stat_sys_alarm", grey())
                .with(IconSet::Alternate, "stat_sys_alarm_classic", grey()),
        );
        let resolver = resolver(&assets);
        let mut style = colored(SignalIconMode::Native);
        style.icon_style = IconStyle::Classic;

        let basic = resolver.resolve_basic(&style, "stat_sys_alarm").unwrap();
        let type_icon = resolver
            .resolve_type_icon(&style, "stat_sys_alarm", 0)
            .unwrap();
        let signal = resolver
            .resolve(&style, "stat_sys_alarm", 0, true)
            .unwrap()
            .into_artifact()
            .unwrap();

        assert_eq!(basic.set, IconSet::Alternate);
        assert_eq!(type_icon.set, IconSet::Native);
        assert_eq!(signal.set, IconSet::Native);
        assert!(!Rc::ptr_eq(&type_icon, &signal));
        assert_eq!(resolver.cached_keys().len(), 3);

        // Each path hits its own entry.
        let again = resolver.resolve_basic(&style, "stat_sys_alarm").unwrap();
        assert!(Rc::ptr_eq(&basic, &again));
        assert_eq!(resolver.cache_stats().hits, 1);
    }

    #[test]
    fn test_load_pristine_bypasses_cache() {
        let assets = assets();
        let resolver = resolver(&assets);
        let glyph = resolver.load_pristine("stat_sys_wifi_in").unwrap();
        assert_eq!(glyph.tint, None);
        assert_eq!(resolver.cache_stats().lookups, 0);
    }
}
