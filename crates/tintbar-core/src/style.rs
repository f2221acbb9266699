//! Style configuration record, change aspects and change events.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;

bitflags! {
    /// Which dimensions of the style configuration changed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Aspects: u32 {
        /// Master coloring switch flipped.
        const COLORING_ENABLED     = 1 << 0;
        /// Signal icon family changed.
        const SIGNAL_ICON_MODE     = 1 << 1;
        /// Primary tint changed.
        const ICON_COLOR           = 1 << 2;
        /// Secondary tint changed.
        const ICON_COLOR_SECONDARY = 1 << 3;
        /// Activity glyph tint changed (either rail).
        const DATA_ACTIVITY_COLOR  = 1 << 4;
        /// Basic icon style changed.
        const ICON_STYLE           = 1 << 5;
        /// Group opacity changed.
        const ICON_ALPHA           = 1 << 6;
        /// Every aspect; delivered on registration and refresh.
        const ALL                  = 0x7f;
    }
}

/// Which icon family signal icons resolve from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalIconMode {
    /// Replacement assets from the alternate table.
    Alternate,
    /// The host's own assets, tinted.
    #[default]
    Native,
    /// Signal icons are left to the host.
    Disabled,
}

/// Alternate-asset variant used for basic (non-signal) icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconStyle {
    Classic,
    #[default]
    Modern,
}

impl IconStyle {
    /// Column in the basic icon table.
    pub fn slot(self) -> usize {
        match self {
            IconStyle::Classic => 0,
            IconStyle::Modern => 1,
        }
    }
}

/// Current values of every style flag.
///
/// Pure data. Index-based fields use rail 0 for the primary icon and rail 1
/// for the secondary icon of dual layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfiguration {
    pub coloring_enabled: bool,
    pub icon_color: [Color; 2],
    pub data_activity_color: [Color; 2],
    pub signal_icon_mode: SignalIconMode,
    pub icon_style: IconStyle,
    /// Opacity of the whole signal cluster (0.0 to 1.0).
    pub alpha_signal_cluster: f32,
    /// Opacity of text and battery (0.0 to 1.0).
    pub alpha_text_and_battery: f32,
}

impl Default for StyleConfiguration {
    fn default() -> Self {
        Self {
            coloring_enabled: false,
            icon_color: [Color::WHITE; 2],
            data_activity_color: [Color::WHITE; 2],
            signal_icon_mode: SignalIconMode::Native,
            icon_style: IconStyle::Modern,
            alpha_signal_cluster: 1.0,
            alpha_text_and_battery: 1.0,
        }
    }
}

/// One configuration-change delivery.
///
/// Every present field maps to exactly one mutator call on
/// [`IconManager`](crate::manager::IconManager).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleEvent {
    pub coloring_enabled: Option<bool>,
    pub icon_color: Option<Color>,
    pub icon_color_secondary: Option<Color>,
    pub icon_style: Option<IconStyle>,
    pub signal_mode: Option<SignalIconMode>,
    pub data_activity_color: Option<Color>,
    pub data_activity_color_secondary: Option<Color>,
    /// (signal cluster, text and battery)
    pub icon_alpha: Option<(f32, f32)>,
}

impl StyleEvent {
    /// Event carrying only the fields that differ between two configurations.
    pub fn between(old: &StyleConfiguration, new: &StyleConfiguration) -> Self {
        fn changed<T: PartialEq + Copy>(old: T, new: T) -> Option<T> {
            (old != new).then_some(new)
        }

        let alpha_old = (old.alpha_signal_cluster, old.alpha_text_and_battery);
        let alpha_new = (new.alpha_signal_cluster, new.alpha_text_and_battery);

        Self {
            coloring_enabled: changed(old.coloring_enabled, new.coloring_enabled),
            icon_color: changed(old.icon_color[0], new.icon_color[0]),
            icon_color_secondary: changed(old.icon_color[1], new.icon_color[1]),
            icon_style: changed(old.icon_style, new.icon_style),
            signal_mode: changed(old.signal_icon_mode, new.signal_icon_mode),
            data_activity_color: changed(old.data_activity_color[0], new.data_activity_color[0]),
            data_activity_color_secondary: changed(
                old.data_activity_color[1],
                new.data_activity_color[1],
            ),
            icon_alpha: changed(alpha_old, alpha_new),
        }
    }

    /// Event that sets every field to the values of `style`.
    pub fn full(style: &StyleConfiguration) -> Self {
        Self {
            coloring_enabled: Some(style.coloring_enabled),
            icon_color: Some(style.icon_color[0]),
            icon_color_secondary: Some(style.icon_color[1]),
            icon_style: Some(style.icon_style),
            signal_mode: Some(style.signal_icon_mode),
            data_activity_color: Some(style.data_activity_color[0]),
            data_activity_color_secondary: Some(style.data_activity_color[1]),
            icon_alpha: Some((style.alpha_signal_cluster, style.alpha_text_and_battery)),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == StyleEvent::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspects_all_covers_every_bit() {
        let union = Aspects::COLORING_ENABLED
            | Aspects::SIGNAL_ICON_MODE
            | Aspects::ICON_COLOR
            | Aspects::ICON_COLOR_SECONDARY
            | Aspects::DATA_ACTIVITY_COLOR
            | Aspects::ICON_STYLE
            | Aspects::ICON_ALPHA;
        assert_eq!(union, Aspects::ALL);
        assert_eq!(Aspects::ALL.bits(), 0x7f);
    }

    #[test]
    fn test_default_style() {
        let style = StyleConfiguration::default();
        assert!(!style.coloring_enabled);
        assert_eq!(style.signal_icon_mode, SignalIconMode::Native);
        assert_eq!(style.icon_style, IconStyle::Modern);
        assert_eq!(style.icon_color, [Color::WHITE; 2]);
    }

    #[test]
    fn test_event_between_identical_is_empty() {
        let style = StyleConfiguration::default();
        assert!(StyleEvent::between(&style, &style).is_empty());
    }

    #[test]
    fn test_event_between_only_changed_fields() {
        let old = StyleConfiguration::default();
        let mut new = old.clone();
        new.icon_color[1] = Color::rgb(0, 0, 255);
        new.signal_icon_mode = SignalIconMode::Alternate;

        let event = StyleEvent::between(&old, &new);
        assert_eq!(event.icon_color, None);
        assert_eq!(event.icon_color_secondary, Some(Color::rgb(0, 0, 255)));
        assert_eq!(event.signal_mode, Some(SignalIconMode::Alternate));
        assert_eq!(event.coloring_enabled, None);
        assert_eq!(event.icon_alpha, None);
    }

    #[test]
    fn test_event_full_sets_everything() {
        let event = StyleEvent::full(&StyleConfiguration::default());
        assert_eq!(event.coloring_enabled, Some(false));
        assert_eq!(event.icon_alpha, Some((1.0, 1.0)));
        assert!(!event.is_empty());
    }

    #[test]
    fn test_mode_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: SignalIconMode,
            style: IconStyle,
        }
        let w: Wrapper = toml::from_str("mode = \"disabled\"\nstyle = \"classic\"").unwrap();
        assert_eq!(w.mode, SignalIconMode::Disabled);
        assert_eq!(w.style, IconStyle::Classic);
    }
}
