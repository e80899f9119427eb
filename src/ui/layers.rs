//! Retained layer tree

use crate::clock::Text;
use crate::config::{ALERT_TEXT, PLACEHOLDER_TIME, PLACEHOLDER_WEATHER};
use crate::weather::WeatherIcon;

use super::{LayerId, Surface};

/// Set of layers that need redrawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyLayers(u16);

impl DirtyLayers {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self((1 << LayerId::COUNT) - 1)
    }

    pub fn insert(&mut self, layer: LayerId) {
        self.0 |= 1 << layer.index();
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.0 & (1 << layer.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Dirty layers in drawing order
    pub fn iter(self) -> impl Iterator<Item = LayerId> {
        LayerId::ALL.into_iter().filter(move |l| self.contains(*l))
    }
}

/// Everything the watchface shows, as last pushed by the composer
#[derive(Debug)]
pub struct FaceLayers {
    texts: [Text; LayerId::COUNT],
    hidden: [bool; LayerId::COUNT],
    icon: WeatherIcon,
    bar_width: u32,
    dirty: DirtyLayers,
    released: bool,
}

impl Default for FaceLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceLayers {
    /// Layer tree with placeholder content, fully dirty.
    pub fn new() -> Self {
        let mut layers = Self {
            texts: Default::default(),
            hidden: [false; LayerId::COUNT],
            icon: WeatherIcon::Clear,
            bar_width: 0,
            dirty: DirtyLayers::all(),
            released: false,
        };

        layers.put(LayerId::Time, PLACEHOLDER_TIME);
        layers.put(LayerId::Utc, PLACEHOLDER_TIME);
        layers.put(LayerId::Secondary, PLACEHOLDER_TIME);
        layers.put(LayerId::Weather, PLACEHOLDER_WEATHER);
        layers.put(LayerId::Alert, ALERT_TEXT);
        layers
    }

    pub fn text(&self, layer: LayerId) -> &str {
        &self.texts[layer.index()]
    }

    pub fn is_hidden(&self, layer: LayerId) -> bool {
        self.hidden[layer.index()]
    }

    pub fn icon(&self) -> WeatherIcon {
        self.icon
    }

    pub fn bar_width(&self) -> u32 {
        self.bar_width
    }

    pub fn dirty(&self) -> DirtyLayers {
        self.dirty
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Return the dirty set and start a new, empty one.
    ///
    /// A dirty background covers every layer.
    pub fn take_dirty(&mut self) -> DirtyLayers {
        let dirty = if self.dirty.contains(LayerId::Background) {
            DirtyLayers::all()
        } else {
            self.dirty
        };
        self.dirty = DirtyLayers::empty();
        if self.released {
            DirtyLayers::empty()
        } else {
            dirty
        }
    }

    fn put(&mut self, layer: LayerId, text: &str) {
        let slot = &mut self.texts[layer.index()];
        slot.clear();
        for c in text.chars() {
            if slot.push(c).is_err() {
                break;
            }
        }
    }
}

impl Surface for FaceLayers {
    fn set_text(&mut self, layer: LayerId, text: &str) {
        if self.text(layer) != text {
            self.put(layer, text);
            self.dirty.insert(layer);
        }
    }

    fn set_hidden(&mut self, layer: LayerId, hidden: bool) {
        if self.hidden[layer.index()] != hidden {
            self.hidden[layer.index()] = hidden;
            self.dirty.insert(layer);
        }
    }

    fn set_battery_bar(&mut self, width: u32) {
        if self.bar_width != width {
            self.bar_width = width;
            self.dirty.insert(LayerId::BatteryMeter);
        }
    }

    fn set_weather(&mut self, text: &str, icon: WeatherIcon) {
        self.put(LayerId::Weather, text);
        self.icon = icon;
        self.dirty.insert(LayerId::Weather);
        self.dirty.insert(LayerId::WeatherIcon);
    }

    fn release(&mut self) {
        self.released = true;
        self.dirty = DirtyLayers::empty();
    }
}
