//! Categorical palette for display labels.
//!
//! Colours come from the 8-colour "Set2" qualitative map. Labels are placed at
//! evenly spaced positions in `[0, 1)` in display order, so the same display
//! order always yields the same colours.

use std::collections::BTreeMap;

use crate::core::types::{Color, DisplayLabel, Sentinel};

/// The Set2 qualitative colour map
pub const SET2: [Color; 8] = [
    Color::new(0x66, 0xc2, 0xa5),
    Color::new(0xfc, 0x8d, 0x62),
    Color::new(0x8d, 0xa0, 0xcb),
    Color::new(0xe7, 0x8a, 0xc3),
    Color::new(0xa6, 0xd8, 0x54),
    Color::new(0xff, 0xd9, 0x2f),
    Color::new(0xe5, 0xc4, 0x94),
    Color::new(0xb3, 0xb3, 0xb3),
];

/// Neutral colour of the no-hit group
pub const NO_HIT_COLOR: Color = Color::new(0xd3, 0xd3, 0xd3);

/// Neutral colour of the `other` bucket and of excluded groups
pub const OTHER_COLOR: Color = Color::new(0xff, 0xff, 0xff);

/// Colour at position `x` of the categorical map.
///
/// `x` is clamped to `[0, 1]`; 1.0 maps to the last colour.
#[must_use]
pub fn categorical(x: f64) -> Color {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped above
    let index = (x * SET2.len() as f64).floor() as usize;
    SET2[index.min(SET2.len() - 1)]
}

/// Fixed colour of a sentinel label
#[must_use]
pub fn sentinel_color(sentinel: Sentinel) -> Color {
    match sentinel {
        Sentinel::NoHit => NO_HIT_COLOR,
        Sentinel::Other | Sentinel::All => OTHER_COLOR,
    }
}

/// Assign colours to an ordered list of displayed labels.
///
/// Non-sentinel labels take palette positions `i / n` in order; sentinels get
/// their fixed neutral colour and do not use a palette slot.
#[must_use]
pub fn assign_colors(display_order: &[DisplayLabel]) -> BTreeMap<DisplayLabel, Color> {
    let mut colors = BTreeMap::new();

    let colored: Vec<&DisplayLabel> = display_order.iter().filter(|l| !l.is_sentinel()).collect();
    let n = colored.len();
    for (i, label) in colored.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let position = i as f64 / n as f64;
        colors.insert(label.clone(), categorical(position));
    }

    for label in display_order {
        if let DisplayLabel::Sentinel(sentinel) = label {
            colors.insert(label.clone(), sentinel_color(*sentinel));
        }
    }

    colors
}
