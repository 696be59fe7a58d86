//! Dye colours and leather-armour colour mixing.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rng::TradeRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DyeColor {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
}

impl DyeColor {
    pub const ALL: [DyeColor; 16] = [
        DyeColor::White,
        DyeColor::Orange,
        DyeColor::Magenta,
        DyeColor::LightBlue,
        DyeColor::Yellow,
        DyeColor::Lime,
        DyeColor::Pink,
        DyeColor::Gray,
        DyeColor::LightGray,
        DyeColor::Cyan,
        DyeColor::Purple,
        DyeColor::Blue,
        DyeColor::Brown,
        DyeColor::Green,
        DyeColor::Red,
        DyeColor::Black,
    ];

    /// Diffuse texture colour as `0xRRGGBB`.
    pub fn rgb(self) -> u32 {
        match self {
            DyeColor::White => 0xF9FFFE,
            DyeColor::Orange => 0xF9801D,
            DyeColor::Magenta => 0xC74EBD,
            DyeColor::LightBlue => 0x3AB3DA,
            DyeColor::Yellow => 0xFED83D,
            DyeColor::Lime => 0x80C71F,
            DyeColor::Pink => 0xF38BAA,
            DyeColor::Gray => 0x474F52,
            DyeColor::LightGray => 0x9D9D97,
            DyeColor::Cyan => 0x169C9C,
            DyeColor::Purple => 0x8932B8,
            DyeColor::Blue => 0x3C44AA,
            DyeColor::Brown => 0x835432,
            DyeColor::Green => 0x5E7C16,
            DyeColor::Red => 0xB02E26,
            DyeColor::Black => 0x1D1D21,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DyeColor::White => "white",
            DyeColor::Orange => "orange",
            DyeColor::Magenta => "magenta",
            DyeColor::LightBlue => "light_blue",
            DyeColor::Yellow => "yellow",
            DyeColor::Lime => "lime",
            DyeColor::Pink => "pink",
            DyeColor::Gray => "gray",
            DyeColor::LightGray => "light_gray",
            DyeColor::Cyan => "cyan",
            DyeColor::Purple => "purple",
            DyeColor::Blue => "blue",
            DyeColor::Brown => "brown",
            DyeColor::Green => "green",
            DyeColor::Red => "red",
            DyeColor::Black => "black",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dye color '{0}'")]
pub struct ParseDyeColorError(String);

impl FromStr for DyeColor {
    type Err = ParseDyeColorError;

    /// Accepts `red`, `minecraft:red` and `minecraft:red_dye`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("minecraft:").unwrap_or(name);
        let name = name.strip_suffix("_dye").unwrap_or(name);
        DyeColor::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ParseDyeColorError(s.to_string()))
    }
}

fn channels(rgb: u32) -> [u32; 3] {
    [(rgb >> 16) & 0xFF, (rgb >> 8) & 0xFF, rgb & 0xFF]
}

/// Mix dyes into an optional base colour the way a crafting grid dyes
/// leather armour: average the channels, then rescale so the brightest
/// channel matches the average brightness of the inputs.
///
/// Returns `base` unchanged when there is nothing to mix.
pub fn mix_colors(base: Option<u32>, dyes: &[DyeColor]) -> Option<u32> {
    let inputs: Vec<u32> = base
        .into_iter()
        .chain(dyes.iter().map(|d| d.rgb()))
        .collect();
    if inputs.is_empty() {
        return base;
    }

    let mut sum = [0u32; 3];
    let mut brightness = 0u32;
    for rgb in &inputs {
        let c = channels(*rgb);
        brightness += c.iter().copied().max().unwrap_or(0);
        for (total, value) in sum.iter_mut().zip(c) {
            *total += value;
        }
    }

    let n = inputs.len() as u32;
    let avg = sum.map(|total| total / n);
    let peak = avg.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return Some(0);
    }
    let scale = brightness as f32 / n as f32 / peak as f32;
    let [r, g, b] = avg.map(|v| ((v as f32 * scale) as u32).min(0xFF));
    Some((r << 16) | (g << 8) | b)
}

/// One to three dyes drawn uniformly, used when `set_dye` lists none.
pub fn random_dyes(rng: &mut TradeRng) -> Vec<DyeColor> {
    let count = rng.range_inclusive(1, 3);
    (0..count)
        .map(|_| DyeColor::ALL[rng.next_below(DyeColor::ALL.len() as u64) as usize])
        .collect()
}
