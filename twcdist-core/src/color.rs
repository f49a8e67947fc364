// Imports
use itertools::Itertools;

use crate::data::{Datum, Float, ScoreMap};

pub const MISSING_COLOR: &str = "#808080";

const LUT_SIZE: usize = 256;

/// Sequential single-hue colormaps (ColorBrewer), from light to dark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Greens,
    Purples,
}

impl Colormap {
    #[rustfmt::skip]
    const GREENS: [[u8; 3]; 9] = [
        [0xf7, 0xfc, 0xf5], [0xe5, 0xf5, 0xe0], [0xc7, 0xe9, 0xc0],
        [0xa1, 0xd9, 0x9b], [0x74, 0xc4, 0x76], [0x41, 0xab, 0x5d],
        [0x23, 0x8b, 0x45], [0x00, 0x6d, 0x2c], [0x00, 0x44, 0x1b],
    ];
    #[rustfmt::skip]
    const PURPLES: [[u8; 3]; 9] = [
        [0xfc, 0xfb, 0xfd], [0xef, 0xed, 0xf5], [0xda, 0xda, 0xeb],
        [0xbc, 0xbd, 0xdc], [0x9e, 0x9a, 0xc8], [0x80, 0x7d, 0xba],
        [0x6a, 0x51, 0xa3], [0x54, 0x27, 0x8f], [0x3f, 0x00, 0x7d],
    ];

    fn anchors(&self) -> &'static [[u8; 3]; 9] {
        match self {
            Self::Greens => &Self::GREENS,
            Self::Purples => &Self::PURPLES,
        }
    }

    /// RGB channels in `[0, 1]` for `x` in `[0, 1]`, values outside are clamped
    ///
    /// The anchors are evenly spaced and linearly interpolated into a 256-entry lookup table, `x` selects the
    /// entry `floor(x * 256)` (capped at the last one).
    pub fn rgb(
        &self,
        x: Float,
    ) -> [Float; 3] {
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        let lut_idx = ((x * LUT_SIZE as Float) as usize).min(LUT_SIZE - 1);
        let position = lut_idx as Float / (LUT_SIZE - 1) as Float;

        let anchors = self.anchors();
        let nb_segments = (anchors.len() - 1) as Float;
        let segment = ((position * nb_segments) as usize).min(anchors.len() - 2);
        let local = position * nb_segments - segment as Float;

        let (start, end) = (anchors[segment], anchors[segment + 1]);
        [0, 1, 2].map(|c| {
            let (a, b) = (start[c] as Float / 255.0, end[c] as Float / 255.0);
            a + (b - a) * local
        })
    }

    pub fn hex(
        &self,
        x: Float,
    ) -> String {
        rgb_to_hex(self.rgb(x))
    }
}

pub fn rgb_to_hex(rgb: [Float; 3]) -> String {
    format!("#{}", rgb.iter().map(|c| format!("{:02x}", (c * 255.0).round().clamp(0.0, 255.0) as u8)).join(""))
}

/// Maps a value onto the `positive` colormap when `>= 0` (scaled by `max`) and onto the `negative` one otherwise
/// (scaled by `min`), missing values are grey
pub fn diverging_gradient(
    datum: Datum,
    max: Float,
    min: Float,
    positive: Colormap,
    negative: Colormap,
) -> String {
    let value = match datum {
        Datum::Missing => return MISSING_COLOR.to_string(),
        Datum::Score(value) => value,
    };
    if value >= 0.0 { positive.hex(ratio(value, max)) } else { negative.hex(ratio(value, min)) }
}

// a zero or non-finite divisor maps to the lightest color
fn ratio(
    value: Float,
    bound: Float,
) -> Float {
    let ratio = value / bound;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// Hex color of every residue, `Greens` for positive scores and `Purples` for negative ones
pub fn data_to_colors(data: &ScoreMap) -> Vec<(String, String)> {
    data_to_colors_with_missing(data.iter().map(|(residue, score)| (residue, Datum::Score(score))))
}

/// Same as `data_to_colors`, accepts missing scores, which do not take part in the min/max computation
pub fn data_to_colors_with_missing<'a, I>(data: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, Datum)>,
{
    let data = data.into_iter().collect_vec();
    let (min, max) = data
        .iter()
        .filter_map(|(_, datum)| match datum {
            Datum::Score(value) => Some(*value),
            Datum::Missing => None,
        })
        .fold((Float::INFINITY, Float::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));

    data.into_iter()
        .map(|(residue, datum)| {
            (residue.to_string(), diverging_gradient(datum, max, min, Colormap::Greens, Colormap::Purples))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn colormap_endpoints_test() {
        assert_eq!(Colormap::Greens.hex(0.0), "#f7fcf5");
        assert_eq!(Colormap::Greens.hex(1.0), "#00441b");
        assert_eq!(Colormap::Purples.hex(0.0), "#fcfbfd");
        assert_eq!(Colormap::Purples.hex(1.0), "#3f007d");
        assert_eq!(Colormap::Greens.hex(7.0), "#00441b");
        assert_eq!(Colormap::Greens.hex(-1.0), "#f7fcf5");
    }

    #[test]
    fn missing_is_grey_test() {
        for (max, min) in [(1.0, -1.0), (100.0, 0.0), (0.0, 0.0), (Float::NAN, -5.0)] {
            assert_eq!(
                diverging_gradient(Datum::Missing, max, min, Colormap::Greens, Colormap::Purples),
                MISSING_COLOR
            );
        }
    }

    #[test]
    fn diverging_gradient_branches_test() {
        let positive = diverging_gradient(Datum::Score(2.0), 2.0, -4.0, Colormap::Greens, Colormap::Purples);
        let negative = diverging_gradient(Datum::Score(-4.0), 2.0, -4.0, Colormap::Greens, Colormap::Purples);
        let zero = diverging_gradient(Datum::Score(0.0), 0.0, -4.0, Colormap::Greens, Colormap::Purples);
        assert_eq!(positive, "#00441b");
        assert_eq!(negative, "#3f007d");
        assert_eq!(zero, "#f7fcf5");
    }

    #[test]
    fn data_to_colors_test() {
        let data: ScoreMap = [("1", -3.0), ("2", 0.0), ("3", 1.5), ("4", 3.0)].into_iter().collect();

        let colors = data_to_colors(&data);
        assert_eq!(colors.iter().map(|(residue, _)| residue.as_str()).collect_vec(), vec!["1", "2", "3", "4"]);
        assert_eq!(colors[0].1, "#3f007d");
        assert_eq!(colors[3].1, "#00441b");
        assert!(colors.iter().all(|(_, hex)| hex.len() == 7 && hex.starts_with('#')));

        // idempotent
        assert_eq!(colors, data_to_colors(&data));
    }

    #[test]
    fn data_to_colors_with_missing_test() {
        let colors = data_to_colors_with_missing([("1", Datum::Score(-1.0)), ("2", Datum::Missing)]);
        assert_eq!(colors[0].1, "#3f007d");
        assert_eq!(colors[1].1, MISSING_COLOR);
    }
}
