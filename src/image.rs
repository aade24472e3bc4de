use crate::{IMAGE_AREA, IMAGE_SIZE, N_CLASSES};

// Row-major grid, indexed as grid[y][x]
pub type PixelGrid = [[u8; IMAGE_SIZE]; IMAGE_SIZE];

/// One 28x28 grayscale digit image, optionally carrying its ground-truth label.
///
/// Training rows produce labeled records, test rows unlabeled ones. The pixel grid
/// is owned by the record and never handed out mutably.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    id: usize,
    pixels: PixelGrid,
    label: Option<u8>,
}

/// The only pixel predicate the classifier uses: any trace of the digit stroke.
pub fn is_ink(value: u8) -> bool {
    value > 0
}

impl ImageRecord {
    pub fn new(id: usize, pixels: &PixelGrid) -> Self {
        Self {
            id,
            pixels: *pixels,
            label: None,
        }
    }

    // Build from a flat row-major slice; value y * 28 + x lands at (x, y).
    // Returns None unless the slice holds exactly 28 * 28 values.
    pub fn from_pixels(id: usize, values: &[u8]) -> Option<Self> {
        if values.len() != IMAGE_AREA {
            return None;
        }
        let pixels: PixelGrid = array_init::array_init(|y| {
            array_init::array_init(|x| values[y * IMAGE_SIZE + x])
        });
        Some(Self {
            id,
            pixels,
            label: None,
        })
    }

    // Attach a ground-truth label, consuming the unlabeled record
    pub fn with_label(self, label: u8) -> Self {
        debug_assert!((label as usize) < N_CLASSES);
        Self {
            label: Some(label),
            ..self
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn label(&self) -> Option<u8> {
        self.label
    }

    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y][x]
    }

    /// Count the pixels matching `predicate`. No predicate matches nothing.
    pub fn count_pixels<P>(&self, predicate: Option<P>) -> u32
    where
        P: Fn(u8) -> bool,
    {
        match predicate {
            Some(predicate) => self
                .pixels
                .iter()
                .flatten()
                .filter(|&&value| predicate(value))
                .count() as u32,
            None => 0,
        }
    }

    pub fn ink_count(&self) -> u32 {
        self.count_pixels(Some(is_ink))
    }

    /// Flatten the grid row-major into 0/1 inputs, 1 wherever there is ink.
    pub fn to_binary_vector(&self) -> Vec<f64> {
        self.pixels
            .iter()
            .flatten()
            .map(|&value| if is_ink(value) { 1.0 } else { 0.0 })
            .collect()
    }

    // One-hot target vector for the label, if there is one
    pub fn one_hot_label(&self) -> Option<[f64; N_CLASSES]> {
        self.label.map(|label| {
            array_init::array_init(|class| if class == label as usize { 1.0 } else { 0.0 })
        })
    }
}
