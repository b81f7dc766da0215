//! Initial conditions: circular drops of value 1.0.

use rayon::prelude::*;

use super::ScalarField;

/// Value written into every cell covered by a drop.
pub const DROP_VALUE: f32 = 1.0;

/// Center of a drop, in field coordinates.
///
/// Centers may lie outside the field; such drops only affect the cells that
/// fall inside it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Droplet {
    pub row: i64,
    pub col: i64,
}

impl Droplet {
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Squared distance to `(row, col)`, computed in `i128`. `None` when even
    /// that overflows, which is farther than any `i64` radius.
    fn distance2(&self, row: i64, col: i64) -> Option<i128> {
        let dr = i128::from(self.row) - i128::from(row);
        let dc = i128::from(self.col) - i128::from(col);
        dr.checked_mul(dr)?.checked_add(dc.checked_mul(dc)?)
    }

    /// Whether `(row, col)` lies strictly inside the drop.
    pub fn covers(&self, row: i64, col: i64, radius2: i64) -> bool {
        self.distance2(row, col).map_or(false, |d2| d2 < i128::from(radius2))
    }
}

/// Sets every cell within `radius2` (squared distance, exclusive) of any drop
/// to [`DROP_VALUE`]. Other cells are left untouched.
pub fn seed(field: &mut ScalarField, drops: &[Droplet], radius2: i64) {
    if drops.is_empty() {
        return;
    }

    field.par_rows_mut().enumerate().for_each(|(row, cells)| {
        let row = row as i64;
        for (col, cell) in cells.iter_mut().enumerate() {
            let col = col as i64;
            if drops.iter().any(|drop| drop.covers(row, col, radius2)) {
                *cell = DROP_VALUE;
            }
        }
    });

    log::debug!(
        "Seeded {}x{} field with {} drop(s)",
        field.width(),
        field.height(),
        drops.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_field() -> ScalarField {
        ScalarField::new(800, 600).unwrap()
    }

    #[test]
    fn single_drop_scenario() {
        let mut field = stock_field();
        seed(&mut field, &[Droplet::new(100, 100)], 100);

        assert_eq!(field.get(100, 100), Some(1.0));
        // Squared distance 121: outside.
        assert_eq!(field.get(100, 111), Some(0.0));
        // Squared distance 81: inside.
        assert_eq!(field.get(100, 109), Some(1.0));
        // Squared distance exactly 100 is excluded.
        assert_eq!(field.get(100, 110), Some(0.0));
        assert_eq!(field.get(110, 100), Some(0.0));
    }

    #[test]
    fn matches_pointwise_definition() {
        let drops = [Droplet::new(3, 4), Droplet::new(10, -2), Droplet::new(0, 15)];
        let radius2 = 9;
        let mut field = ScalarField::new(16, 12).unwrap();
        seed(&mut field, &drops, radius2);

        for row in 0..field.height() {
            for col in 0..field.width() {
                let covered = drops.iter().any(|d| {
                    let dr = d.row - row as i64;
                    let dc = d.col - col as i64;
                    dr * dr + dc * dc < radius2
                });
                let expected = if covered { 1.0 } else { 0.0 };
                assert_eq!(field[(row, col)], expected, "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn empty_drop_list_leaves_field_zeroed() {
        let mut field = stock_field();
        seed(&mut field, &[], 100);
        assert_eq!(field, stock_field());
    }

    #[test]
    fn seeding_is_idempotent() {
        let drops = [Droplet::new(50, 60), Droplet::new(55, 62)];
        let mut once = ScalarField::new(120, 90).unwrap();
        seed(&mut once, &drops, 64);

        let mut twice = once.clone();
        seed(&mut twice, &drops, 64);

        assert_eq!(once, twice);
    }

    #[test]
    fn drop_order_does_not_matter() {
        let drops = [Droplet::new(5, 5), Droplet::new(7, 6), Droplet::new(20, 1)];
        let mut forward = ScalarField::new(32, 32).unwrap();
        seed(&mut forward, &drops, 16);

        let reversed: Vec<Droplet> = drops.iter().rev().copied().collect();
        let mut backward = ScalarField::new(32, 32).unwrap();
        seed(&mut backward, &reversed, 16);

        assert_eq!(forward, backward);
    }

    #[test]
    fn prior_values_outside_drops_are_kept() {
        let mut field = ScalarField::new(10, 10).unwrap();
        field[(9, 9)] = 0.25;
        seed(&mut field, &[Droplet::new(0, 0)], 4);
        assert_eq!(field[(9, 9)], 0.25);
        assert_eq!(field[(0, 0)], 1.0);
        assert_eq!(field[(1, 1)], 1.0);
        assert_eq!(field[(2, 0)], 0.0);
    }

    #[test]
    fn drops_outside_the_field() {
        let mut field = ScalarField::new(10, 10).unwrap();

        // Far away: nothing changes.
        seed(&mut field, &[Droplet::new(-100, 500)], 100);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));

        // Just past the corner: only the overlapping cells change.
        seed(&mut field, &[Droplet::new(-1, -1)], 5);
        assert_eq!(field[(0, 0)], 1.0);
        assert_eq!(field[(0, 1)], 0.0); // distance2 = 1 + 4 = 5
        assert_eq!(field.as_slice().iter().filter(|&&v| v == 1.0).count(), 1);
    }

    #[test]
    fn distant_drops_do_not_wrap_around() {
        let mut field = ScalarField::new(8, 8).unwrap();
        let drops = [
            // (2^32)^2 wraps to 0 in i64.
            Droplet::new(1 << 32, 0),
            Droplet::new(5_000_000_000, 0),
            Droplet::new(i64::MAX, i64::MIN),
            Droplet::new(i64::MIN, i64::MAX),
            Droplet::new(i64::MIN, i64::MIN),
        ];
        seed(&mut field, &drops, i64::MAX);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));

        // Within i64::MAX of the squared radius a far drop still reaches in.
        let reach = 3_000_000_000;
        assert!(Droplet::new(reach, 0).covers(0, 0, i64::MAX));
        assert!(!Droplet::new(reach, 0).covers(0, 0, reach * reach));
    }

    #[test]
    fn distant_drops_from_the_environment_are_harmless() {
        let config = crate::config::Config::from_lookup(|key| {
            (key == "FIELD_DROPS").then(|| "4294967296:0".to_string())
        });
        assert_eq!(config.drops, vec![Droplet::new(1 << 32, 0)]);

        let mut field = ScalarField::new(8, 8).unwrap();
        seed(&mut field, &config.drops, config.drop_radius2);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));
    }
}
