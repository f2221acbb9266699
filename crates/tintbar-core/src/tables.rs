//! Fixed icon tables.
//!
//! Maps logical icon names (as supplied by the host) to asset ids in the
//! alternate icon set. Keys are normalized names, so a "_fully" variant is
//! only listed where the alternate set ships a distinct asset for it.

use crate::style::IconStyle;
use crate::tracker::SignalType;

/// Suffix marking the "fully connected" variant of a signal icon.
pub const FULLY_SUFFIX: &str = "_fully";

/// Alternate-set asset for a signal strength icon (Wi-Fi or cellular).
///
/// Wi-Fi icons:
///   - stat_sys_wifi_signal_0 .. stat_sys_wifi_signal_4
///   - "_fully" variants for levels 1-4
///   - stat_sys_wifi_signal_null when the radio has no link
///
/// Cellular icons:
///   - stat_sys_signal_0 .. stat_sys_signal_4, each with a "_fully" variant
pub fn alternate_signal_asset(key: &str) -> Option<&'static str> {
    let asset = match key {
        // Wi-Fi
        "stat_sys_wifi_signal_0" => "stat_sys_wifi_signal_0",
        "stat_sys_wifi_signal_1" => "stat_sys_wifi_signal_1",
        "stat_sys_wifi_signal_1_fully" => "stat_sys_wifi_signal_1_fully",
        "stat_sys_wifi_signal_2" => "stat_sys_wifi_signal_2",
        "stat_sys_wifi_signal_2_fully" => "stat_sys_wifi_signal_2_fully",
        "stat_sys_wifi_signal_3" => "stat_sys_wifi_signal_3",
        "stat_sys_wifi_signal_3_fully" => "stat_sys_wifi_signal_3_fully",
        "stat_sys_wifi_signal_4" => "stat_sys_wifi_signal_4",
        "stat_sys_wifi_signal_4_fully" => "stat_sys_wifi_signal_4_fully",
        "stat_sys_wifi_signal_null" => "stat_sys_wifi_signal_null",

        // Cellular
        "stat_sys_signal_0" => "stat_sys_signal_0",
        "stat_sys_signal_0_fully" => "stat_sys_signal_0_fully",
        "stat_sys_signal_1" => "stat_sys_signal_1",
        "stat_sys_signal_1_fully" => "stat_sys_signal_1_fully",
        "stat_sys_signal_2" => "stat_sys_signal_2",
        "stat_sys_signal_2_fully" => "stat_sys_signal_2_fully",
        "stat_sys_signal_3" => "stat_sys_signal_3",
        "stat_sys_signal_3_fully" => "stat_sys_signal_3_fully",
        "stat_sys_signal_4" => "stat_sys_signal_4",
        "stat_sys_signal_4_fully" => "stat_sys_signal_4_fully",

        _ => return None,
    };
    Some(asset)
}

/// Alternate-set assets for a basic (non-signal) icon, one slot per style.
///
/// Returns `None` if the icon is not a known basic icon. A `None` slot
/// means the style has no replacement and the native asset is tinted
/// instead.
pub fn basic_icon_assets(key: &str) -> Option<[Option<&'static str>; 2]> {
    let assets = match key {
        "stat_sys_data_bluetooth" => [
            Some("stat_sys_data_bluetooth"),
            Some("stat_sys_data_bluetooth"),
        ],
        "stat_sys_data_bluetooth_connected" => [
            Some("stat_sys_data_bluetooth_connected"),
            Some("stat_sys_data_bluetooth_connected"),
        ],
        "stat_sys_alarm" => [Some("stat_sys_alarm_classic"), None],
        "stat_sys_ringer_vibrate" => [Some("stat_sys_ringer_vibrate_classic"), None],
        "stat_sys_ringer_silent" => [Some("stat_sys_ringer_silent_classic"), None],
        "stat_sys_headset_with_mic" => [Some("stat_sys_headset_with_mic_classic"), None],
        "stat_sys_headset_without_mic" => [Some("stat_sys_headset_without_mic_classic"), None],
        _ => return None,
    };
    Some(assets)
}

/// Alternate-set asset of a basic icon for the given style.
///
/// Outer `None`: unknown icon. Inner `None`: no replacement for this style.
pub fn basic_icon_asset(key: &str, style: IconStyle) -> Option<Option<&'static str>> {
    basic_icon_assets(key).map(|slots| slots[style.slot()])
}

/// Direction-of-traffic glyphs: (in, out, in+out).
pub fn activity_glyph_assets(signal: SignalType) -> [&'static str; 3] {
    match signal {
        SignalType::Wifi => ["stat_sys_wifi_in", "stat_sys_wifi_out", "stat_sys_wifi_inout"],
        SignalType::Mobile => [
            "stat_sys_signal_in",
            "stat_sys_signal_out",
            "stat_sys_signal_inout",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_signal_asset_wifi() {
        assert_eq!(
            alternate_signal_asset("stat_sys_wifi_signal_3"),
            Some("stat_sys_wifi_signal_3")
        );
        assert_eq!(
            alternate_signal_asset("stat_sys_wifi_signal_4_fully"),
            Some("stat_sys_wifi_signal_4_fully")
        );
        // Wi-Fi level 0 has no fully-connected variant.
        assert_eq!(alternate_signal_asset("stat_sys_wifi_signal_0_fully"), None);
    }

    #[test]
    fn test_alternate_signal_asset_mobile() {
        for level in 0..=4 {
            let base = format!("stat_sys_signal_{level}");
            let fully = format!("{base}{FULLY_SUFFIX}");
            assert!(alternate_signal_asset(&base).is_some(), "{base}");
            assert!(alternate_signal_asset(&fully).is_some(), "{fully}");
        }
    }

    #[test]
    fn test_alternate_signal_asset_unknown() {
        assert_eq!(alternate_signal_asset("stat_sys_gemini_signal_1_blue"), None);
        assert_eq!(alternate_signal_asset(""), None);
    }

    #[test]
    fn test_basic_icon_asset_per_style() {
        assert_eq!(
            basic_icon_asset("stat_sys_alarm", IconStyle::Classic),
            Some(Some("stat_sys_alarm_classic"))
        );
        assert_eq!(basic_icon_asset("stat_sys_alarm", IconStyle::Modern), Some(None));
        assert_eq!(
            basic_icon_asset("stat_sys_data_bluetooth", IconStyle::Modern),
            Some(Some("stat_sys_data_bluetooth"))
        );
        assert_eq!(basic_icon_asset("stat_sys_unknown", IconStyle::Modern), None);
    }

    #[test]
    fn test_activity_glyph_assets() {
        assert_eq!(activity_glyph_assets(SignalType::Wifi)[2], "stat_sys_wifi_inout");
        assert_eq!(activity_glyph_assets(SignalType::Mobile)[0], "stat_sys_signal_in");
    }
}
