use crate::image::mask::InkMask;

/// Working bitmap for path decomposition; `true` = ink.
#[derive(Debug, Clone)]
pub(super) struct Bitmap {
    pub width: i32,
    pub height: i32,
    data: Vec<bool>,
}

impl Bitmap {
    pub fn from_mask(mask: &InkMask) -> Self {
        Self {
            width: mask.width() as i32,
            height: mask.height() as i32,
            data: mask.data().iter().map(|v| *v == InkMask::INK).collect(),
        }
    }

    /// Ink test; coordinates outside the bitmap are background.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn flip(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            let i = (y * self.width + x) as usize;
            self.data[i] = !self.data[i];
        }
    }

    /// First ink pixel at or after linear index `from`, in scan order.
    pub fn find_next(&self, from: usize) -> Option<(i32, i32)> {
        let offset = self.data.get(from..)?.iter().position(|v| *v)?;
        let i = (from + offset) as i32;
        Some((i % self.width, i / self.width))
    }

    pub fn index_of(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_next_scan_order() {
        let mask = InkMask::from_fn(4, 3, |x, y| (x, y) == (2, 1) || (x, y) == (0, 2));
        let bitmap = Bitmap::from_mask(&mask);
        assert_eq!(bitmap.find_next(0), Some((2, 1)));
        assert_eq!(bitmap.find_next(bitmap.index_of(3, 1)), Some((0, 2)));
        assert_eq!(bitmap.find_next(bitmap.index_of(1, 2)), None);
    }

    #[test]
    fn test_out_of_bounds_is_background() {
        let mask = InkMask::from_fn(2, 2, |_, _| true);
        let mut bitmap = Bitmap::from_mask(&mask);
        assert!(!bitmap.at(-1, 0));
        assert!(!bitmap.at(0, 2));
        bitmap.flip(1, 1);
        assert!(!bitmap.at(1, 1));
    }
}
