use rayon::prelude::*;

use super::InkMask;

const PARALLEL_ROW_THRESHOLD: usize = 256;

/// Binary median over a `(2r+1)^2` window with replicated borders.
///
/// A pixel becomes ink when ink is the strict majority of its window. An
/// ink pixel also stays ink while any of its 8 neighbours is ink, so only
/// isolated speckle is removed and 1-px strokes survive.
pub(super) fn median_filter(data: &[u8], width: u32, height: u32, radius: u32) -> Vec<u8> {
    if radius == 0 || data.is_empty() {
        return data.to_vec();
    }

    let (w, h) = (width as i64, height as i64);
    let r = radius as i64;
    let window = ((2 * r + 1) * (2 * r + 1)) as usize;
    let mut out = vec![InkMask::BACKGROUND; data.len()];

    let filter_row = |y: usize, row: &mut [u8]| {
        for (x, value) in row.iter_mut().enumerate() {
            let mut ink = 0usize;
            for dy in -r..=r {
                let sy = (y as i64 + dy).clamp(0, h - 1) as usize;
                let line = &data[sy * width as usize..(sy + 1) * width as usize];
                for dx in -r..=r {
                    let sx = (x as i64 + dx).clamp(0, w - 1) as usize;
                    if line[sx] == InkMask::INK {
                        ink += 1;
                    }
                }
            }
            let here = data[y * width as usize + x] == InkMask::INK;
            let connected = here && has_ink_neighbour(data, width, height, x, y);
            *value = if ink * 2 > window || connected {
                InkMask::INK
            } else {
                InkMask::BACKGROUND
            };
        }
    };

    if height as usize >= PARALLEL_ROW_THRESHOLD {
        out.par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| filter_row(y, row));
    } else {
        for (y, row) in out.chunks_mut(width as usize).enumerate() {
            filter_row(y, row);
        }
    }
    out
}

fn has_ink_neighbour(data: &[u8], width: u32, height: u32, x: usize, y: usize) -> bool {
    let (w, h) = (width as usize, height as usize);
    (y.saturating_sub(1)..=(y + 1).min(h - 1)).any(|ny| {
        (x.saturating_sub(1)..=(x + 1).min(w - 1))
            .any(|nx| (nx, ny) != (x, y) && data[ny * w + nx] == InkMask::INK)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const I: u8 = InkMask::INK;
    const B: u8 = InkMask::BACKGROUND;

    #[test]
    fn test_removes_isolated_pixel() {
        let mut data = vec![B; 25];
        data[12] = I;
        let out = median_filter(&data, 5, 5, 1);
        assert!(out.iter().all(|v| *v == B));
    }

    #[test]
    fn test_fills_isolated_hole() {
        let mut data = vec![I; 25];
        data[12] = B;
        let out = median_filter(&data, 5, 5, 1);
        assert!(out.iter().all(|v| *v == I));
    }

    #[test]
    fn test_keeps_thick_stroke_and_border() {
        // 3-px wide vertical bar touching the left border.
        let data: Vec<u8> = (0..36)
            .map(|i| if i % 6 < 3 { I } else { B })
            .collect();
        let out = median_filter(&data, 6, 6, 1);
        assert_eq!(out, data);
    }

    #[test]
    fn test_keeps_one_pixel_lines() {
        // 20x9 with a single ink row.
        let row: Vec<u8> = (0..180).map(|i| if i / 20 == 4 { I } else { B }).collect();
        assert_eq!(median_filter(&row, 20, 9, 1), row);

        // Diagonal hairline.
        let diagonal: Vec<u8> = (0..81).map(|i| if i % 9 == i / 9 { I } else { B }).collect();
        assert_eq!(median_filter(&diagonal, 9, 9, 1), diagonal);
    }

    #[test]
    fn test_removes_speckle_next_to_stroke() {
        // Vertical 1-px line at x=1, isolated dot at (4, 2).
        let mut data = vec![B; 36];
        for y in 0..6 {
            data[y * 6 + 1] = I;
        }
        data[2 * 6 + 4] = I;
        let out = median_filter(&data, 6, 6, 1);
        assert_eq!(out[2 * 6 + 4], B);
        assert!((0..6).all(|y| out[y * 6 + 1] == I));
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let data = vec![I, B, I, B];
        assert_eq!(median_filter(&data, 2, 2, 0), data);
    }
}
