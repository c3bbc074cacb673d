//! # Connected region search
//!
//! Regions are found on a binary mask using 8-connectivity, so pixels touching only at a corner
//! belong to the same region.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Offsets to the 8 neighbours of a pixel, as (row, col).
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Inclusive pixel bounds of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

/// A connected region reduced to its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contour {
    /// Row of the region's centroid.
    ///
    /// Units: pixels
    pub centroid_row: f64,

    /// Column of the region's centroid.
    ///
    /// Units: pixels
    pub centroid_col: f64,

    /// Number of pixels in the region.
    pub area: usize,

    pub bbox: BoundingBox,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BoundingBox {
    fn at(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            min_col: col,
            max_row: row,
            max_col: col,
        }
    }

    fn grow(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.min_col = self.min_col.min(col);
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
    }

    /// Shift the box by the given row and column offsets.
    pub fn offset(&self, rows: usize, cols: usize) -> Self {
        Self {
            min_row: self.min_row + rows,
            min_col: self.min_col + cols,
            max_row: self.max_row + rows,
            max_col: self.max_col + cols,
        }
    }
}

impl Contour {
    /// Shift the contour by the given row and column offsets.
    pub fn offset(&self, rows: usize, cols: usize) -> Self {
        Self {
            centroid_row: self.centroid_row + rows as f64,
            centroid_col: self.centroid_col + cols as f64,
            area: self.area,
            bbox: self.bbox.offset(rows, cols),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find every maximal 8-connected region of `true` pixels in the mask.
///
/// Regions are returned in the raster order of their first pixel.
pub fn find_contours(mask: &Array2<bool>) -> Vec<Contour> {
    let (num_rows, num_cols) = mask.dim();
    let mut visited = Array2::<bool>::from_elem((num_rows, num_cols), false);
    let mut contours = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for ((row, col), &set) in mask.indexed_iter() {
        if !set || visited[[row, col]] {
            continue;
        }

        // Flood fill from this seed
        visited[[row, col]] = true;
        stack.push((row, col));

        let mut area = 0usize;
        let mut row_sum = 0f64;
        let mut col_sum = 0f64;
        let mut bbox = BoundingBox::at(row, col);

        while let Some((r, c)) = stack.pop() {
            area += 1;
            row_sum += r as f64;
            col_sum += c as f64;
            bbox.grow(r, c);

            for (dr, dc) in NEIGHBOURS.iter() {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < 0 || nc < 0 || nr >= num_rows as isize || nc >= num_cols as isize {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);

                if mask[[nr, nc]] && !visited[[nr, nc]] {
                    visited[[nr, nc]] = true;
                    stack.push((nr, nc));
                }
            }
        }

        contours.push(Contour {
            centroid_row: row_sum / area as f64,
            centroid_col: col_sum / area as f64,
            area,
            bbox,
        });
    }

    contours
}

/// Select the region with the largest area.
///
/// When several regions share the largest area the first one in the list wins.
pub fn largest(contours: &[Contour]) -> Option<&Contour> {
    let mut best: Option<&Contour> = None;

    for c in contours {
        match best {
            Some(b) if b.area >= c.area => (),
            _ => best = Some(c),
        }
    }

    best
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn mask_from(rows: &[&str]) -> Array2<bool> {
        let num_cols = rows[0].len();
        let mut mask = Array2::from_elem((rows.len(), num_cols), false);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                mask[[r, c]] = ch == '#';
            }
        }
        mask
    }

    #[test]
    fn test_find_contours() {
        let mask = mask_from(&[
            "##....", //
            "##...#", //
            ".....#", //
            "....#.", //
        ]);

        let contours = find_contours(&mask);
        assert_eq!(contours.len(), 2);

        assert_eq!(contours[0].area, 4);
        assert_eq!(contours[0].centroid_row, 0.5);
        assert_eq!(contours[0].centroid_col, 0.5);

        // Diagonal neighbour joins the right-hand region
        assert_eq!(contours[1].area, 3);
        assert_eq!(contours[1].centroid_row, 2.0);
        assert_eq!(
            contours[1].bbox,
            BoundingBox {
                min_row: 1,
                min_col: 4,
                max_row: 3,
                max_col: 5
            }
        );
    }

    #[test]
    fn test_largest_ties() {
        let mask = mask_from(&[
            "#..#", //
            "#..#", //
        ]);

        let contours = find_contours(&mask);
        let best = largest(&contours).unwrap();
        assert_eq!(best.area, 2);
        assert_eq!(best.centroid_col, 0.0);

        assert!(largest(&[]).is_none());
    }

    #[test]
    fn test_empty_mask() {
        let mask = Array2::from_elem((0, 0), false);
        assert!(find_contours(&mask).is_empty());

        let mask = Array2::from_elem((4, 4), false);
        assert!(find_contours(&mask).is_empty());
    }
}
