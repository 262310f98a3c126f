//! Logarithmic band-to-bin mapping
//!
//! Maps a band index to a contiguous, monotonically widening range of
//! frequency bins. The edge formula is load-bearing for compatibility with
//! stored band tables and external controllers; do not retune it.

use std::ops::Range;

/// Transform window size in samples (must be power of 2)
pub const WINDOW_SIZE: usize = 2048;

/// Samples of history carried into each window (50%-class overlap)
pub const HALF_WINDOW: usize = WINDOW_SIZE / 2;

/// Offset into the reconstructed window where output is extracted
pub const OUTPUT_OFFSET: usize = WINDOW_SIZE / 4;

/// Upper bound on the configurable band count
pub const MAX_BANDS: usize = 2048;

/// Band gains are clamped to this range at use time, never at write time
pub const GAIN_MIN: f32 = 0.0;
pub const GAIN_MAX: f32 = 2.0;

/// Bin edge for band `j`: floor(0.75 * (j/32 + 1) * j / 2), in f32 math.
///
/// The curve is roughly quadratic, so low bands are narrow (a few may even
/// be empty after flooring) and high bands widen toward the top of the
/// spectrum.
fn bin_edge(j: u32) -> usize {
    (0.75_f32 * (j as f32 / 32.0 + 1.0) * j as f32 / 2.0) as usize
}

/// Frequency-bin range controlled by band `j`, clipped to the window size.
///
/// `band_range(j).end == band_range(j + 1).start` before clipping, so the
/// ranges tile the spectrum without gaps or overlap. Bins at or beyond the
/// last mapped range keep an implicit gain of 1.0.
pub fn band_range(j: u32) -> Range<usize> {
    let start = bin_edge(j).min(WINDOW_SIZE);
    let end = bin_edge(j + 1).min(WINDOW_SIZE);
    start..end
}

/// Number of bands that actually map to distinct bin ranges.
///
/// Only one quarter of the configured band count is mapped; the rest of the
/// table is stored and reported but never applied. This matches the shipped
/// behavior and stays until product confirms a change.
pub fn mapped_bands(band_count: u32) -> u32 {
    band_count / 4
}

/// Clamp a stored band gain into the applied range [0, 2].
#[inline]
pub fn clamp_gain(gain: f32) -> f32 {
    gain.clamp(GAIN_MIN, GAIN_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_band_starts_at_dc() {
        assert_eq!(band_range(0).start, 0);
    }

    #[test]
    fn test_ranges_tile_without_gaps() {
        for j in 0..512 {
            assert_eq!(
                band_range(j).end,
                band_range(j + 1).start,
                "band {} end must meet band {} start",
                j,
                j + 1
            );
        }
    }

    #[test]
    fn test_edges_non_decreasing() {
        let mut prev = 0;
        for j in 0..1024 {
            let r = band_range(j);
            assert!(r.start >= prev, "start must be non-decreasing at band {}", j);
            assert!(r.end >= r.start, "end must not precede start at band {}", j);
            prev = r.start;
        }
    }

    #[test]
    fn test_ranges_clipped_to_window() {
        for j in 0..2048 {
            let r = band_range(j);
            assert!(r.start <= WINDOW_SIZE);
            assert!(r.end <= WINDOW_SIZE);
        }
    }

    #[test]
    fn test_high_bands_are_wider_than_low_bands() {
        let low = band_range(8);
        let high = band_range(200);
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_known_edges() {
        // floor(0.75 * (j/32 + 1) * j / 2) spot checks
        assert_eq!(band_range(3).start, 1);
        assert_eq!(band_range(10).start, 4);
        assert_eq!(band_range(100).start, 154);
    }

    #[test]
    fn test_quarter_of_bands_mapped() {
        assert_eq!(mapped_bands(1024), 256);
        assert_eq!(mapped_bands(2048), 512);
        assert_eq!(mapped_bands(3), 0);
    }

    #[test]
    fn test_gain_clamping() {
        assert_eq!(clamp_gain(5.0), 2.0);
        assert_eq!(clamp_gain(-1.0), 0.0);
        assert_eq!(clamp_gain(1.5), 1.5);
    }
}
