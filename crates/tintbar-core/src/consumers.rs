//! Simple style consumers for single host views.

use std::rc::Rc;

use crate::artifact::{Tint, TintMode};
use crate::bus::StyleListener;
use crate::color::Color;
use crate::style::{Aspects, StyleConfiguration};

/// A host text view whose color can be set.
pub trait TextSink {
    fn set_text_color(&self, color: Color);
}

/// A host image view with a color filter and opacity.
pub trait GlyphSink {
    fn set_tint(&self, tint: Option<Tint>);
    fn set_alpha(&self, alpha: f32);
}

/// Text (a clock, for instance) that follows the primary icon color.
///
/// While coloring is disabled the text returns to its own default color.
pub struct TintedText {
    default_color: Color,
    sink: Rc<dyn TextSink>,
}

impl TintedText {
    pub fn new(default_color: Color, sink: Rc<dyn TextSink>) -> Self {
        Self {
            default_color,
            sink,
        }
    }
}

impl StyleListener for TintedText {
    fn on_style_changed(&self, aspects: Aspects, style: &StyleConfiguration) {
        if !aspects.contains(Aspects::ICON_COLOR) {
            return;
        }
        let color = if style.coloring_enabled {
            style.icon_color[0]
        } else {
            self.default_color
        };
        self.sink.set_text_color(color);
    }
}

/// A standalone status glyph tinted with the primary icon color and faded
/// with the signal cluster.
pub struct TintedGlyph {
    sink: Rc<dyn GlyphSink>,
}

impl TintedGlyph {
    pub fn new(sink: Rc<dyn GlyphSink>) -> Self {
        Self { sink }
    }
}

impl StyleListener for TintedGlyph {
    fn on_style_changed(&self, aspects: Aspects, style: &StyleConfiguration) {
        if aspects.contains(Aspects::ICON_COLOR) {
            let tint = style.coloring_enabled.then(|| Tint {
                color: style.icon_color[0],
                mode: TintMode::SrcIn,
            });
            self.sink.set_tint(tint);
        }
        if aspects.contains(Aspects::ICON_ALPHA) {
            self.sink.set_alpha(style.alpha_signal_cluster);
        }
    }
}
