//! Stand-in host for the command-line tool.
//!
//! Without `--assets`, icons come from generated placeholder images so the
//! whole pipeline can be exercised without a real icon pack. The sample
//! surface plays the part of a status bar showing one Wi-Fi and one
//! cellular signal.

use tintbar_core::artifact::{Artifact, IconImage, IconSet};
use tintbar_core::host::{RecordingSurface, SurfaceState};
use tintbar_core::tables::{self, FULLY_SUFFIX};
use tintbar_core::{Color, MemoryAssets, SignalType};

/// Edge length of generated placeholder icons.
pub const PLACEHOLDER_SIZE: u32 = 24;

const NATIVE_GREY: Color = Color::rgb(0x9e, 0x9e, 0x9e);
const ALTERNATE_GREY: Color = Color::rgb(0xdd, 0xdd, 0xdd);

/// Basic icons the host may ask for.
const BASIC_ICONS: &[&str] = &[
    "stat_sys_data_bluetooth",
    "stat_sys_data_bluetooth_connected",
    "stat_sys_alarm",
    "stat_sys_ringer_vibrate",
    "stat_sys_ringer_silent",
    "stat_sys_headset_with_mic",
    "stat_sys_headset_without_mic",
];

/// Cellular data-type icons the host may show.
const TYPE_ICONS: &[&str] = &[
    "stat_sys_data_fully_connected_3g",
    "stat_sys_data_fully_connected_4g",
    "stat_sys_data_fully_connected_lte",
];

/// Opaque square on a transparent one-pixel border.
pub fn placeholder_image(color: Color) -> IconImage {
    let mut image = IconImage::filled(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, color);
    let last = PLACEHOLDER_SIZE - 1;
    for (i, px) in image.pixels.chunks_exact_mut(4).enumerate() {
        let x = i as u32 % PLACEHOLDER_SIZE;
        let y = i as u32 / PLACEHOLDER_SIZE;
        if x == 0 || y == 0 || x == last || y == last {
            px[3] = 0;
        }
    }
    image
}

fn signal_ids() -> Vec<String> {
    let mut ids = vec!["stat_sys_wifi_signal_null".to_string()];
    for level in 0..=4 {
        for base in [
            format!("stat_sys_wifi_signal_{level}"),
            format!("stat_sys_signal_{level}"),
        ] {
            ids.push(format!("{base}{FULLY_SUFFIX}"));
            ids.push(base);
        }
    }
    ids
}

/// Placeholder images for every icon the tables know about.
pub fn placeholder_assets() -> MemoryAssets {
    let native = placeholder_image(NATIVE_GREY);
    let alternate = placeholder_image(ALTERNATE_GREY);
    let mut assets = MemoryAssets::new();

    for id in signal_ids() {
        if let Some(asset) = tables::alternate_signal_asset(&id) {
            assets.insert(IconSet::Alternate, asset, alternate.clone());
        }
        assets.insert(IconSet::Native, id, native.clone());
    }

    for &id in BASIC_ICONS {
        assets.insert(IconSet::Native, id, native.clone());
        for asset in tables::basic_icon_assets(id).into_iter().flatten().flatten() {
            assets.insert(IconSet::Alternate, asset, alternate.clone());
        }
    }

    for &id in TYPE_ICONS {
        assets.insert(IconSet::Native, id, native.clone());
    }

    for signal in [SignalType::Wifi, SignalType::Mobile] {
        for asset in tables::activity_glyph_assets(signal) {
            assets.insert(IconSet::Alternate, asset, alternate.clone());
        }
    }

    assets
}

/// A surface showing a partially connected Wi-Fi network and a full LTE
/// connection.
pub fn sample_surface() -> RecordingSurface {
    let surface = RecordingSurface::new();
    surface.set_icon_id(SignalType::Wifi, "stat_sys_wifi_signal_3");
    surface.set_icon_id(SignalType::Mobile, "stat_sys_signal_4_fully");
    surface.set_type_icon_id(Some("stat_sys_data_fully_connected_lte".to_string()));
    surface
}

/// One-line provenance of an artifact.
pub fn describe_artifact(artifact: &Artifact) -> String {
    let tint = match artifact.tint {
        Some(t) => format!("{} {:?}", t.color, t.mode),
        None => "untinted".to_string(),
    };
    format!(
        "{} <- {:?}/{} ({})",
        artifact.key, artifact.set, artifact.asset, tint
    )
}

/// Human-readable dump of what the surface currently shows.
pub fn describe_surface(state: &SurfaceState) -> Vec<String> {
    let mut lines = Vec::new();

    for signal in [SignalType::Wifi, SignalType::Mobile] {
        let icon = state
            .strength_icon
            .get(&signal)
            .map(|a| describe_artifact(a))
            .unwrap_or_else(|| "host icon".to_string());
        let filter = match state.strength_filter.get(&signal).copied().flatten() {
            Some(t) => format!(", filter {}", t.color),
            None => String::new(),
        };
        let glyph = match state.activity_glyph.get(&signal) {
            Some(Some(g)) => format!(", activity {}", g.asset),
            _ => String::new(),
        };
        lines.push(format!("{signal}: {icon}{filter}{glyph}"));
    }

    if let Some(type_icon) = &state.type_icon {
        lines.push(format!("type: {}", describe_artifact(type_icon)));
    }
    lines.push(format!(
        "airplane: {}",
        state
            .airplane_filter
            .map(|t| t.color.to_string())
            .unwrap_or_else(|| "untinted".to_string())
    ));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tintbar_core::AssetSource;

    #[test]
    fn test_placeholder_border_is_transparent() {
        let image = placeholder_image(Color::WHITE);
        assert_eq!(image.pixel(0, 0).map(|c| c.a), Some(0));
        assert_eq!(image.pixel(5, 5), Some(Color::WHITE));
    }

    #[test]
    fn test_placeholder_assets_cover_tables() {
        let assets = placeholder_assets();
        assert!(assets.load(IconSet::Native, "stat_sys_signal_2").is_ok());
        assert!(
            assets
                .load(IconSet::Alternate, "stat_sys_wifi_signal_4_fully")
                .is_ok()
        );
        assert!(
            assets
                .load(IconSet::Alternate, "stat_sys_alarm_classic")
                .is_ok()
        );
        assert!(assets.load(IconSet::Alternate, "stat_sys_signal_inout").is_ok());
        // No alternate asset exists for a fully connected empty Wi-Fi icon.
        assert!(
            assets
                .load(IconSet::Alternate, "stat_sys_wifi_signal_0_fully")
                .is_err()
        );
    }

    #[test]
    fn test_describe_surface_defaults() {
        let lines = describe_surface(&SurfaceState::default());
        assert_eq!(lines[0], "wifi: host icon");
        assert_eq!(lines[1], "mobile: host icon");
        assert_eq!(lines[2], "airplane: untinted");
    }
}
