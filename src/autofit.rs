use crate::document::Unit;
use crate::measure::{FontRole, TextMeasurer};

/// Smallest annotation size the search will go down to.
pub const MIN_SECONDARY_SIZE: u32 = 8;

/// Largest annotation size in `floor..=primary_size` at which no annotation is
/// wider than its base character.
///
/// Scans downward from `primary_size`. When nothing fits, `floor` is returned
/// anyway. `None` for an empty unit list.
pub fn fit_secondary_size<M: TextMeasurer + ?Sized>(
    units: &[Unit],
    primary_size: u32,
    floor: u32,
    measurer: &M,
) -> Option<u32> {
    if units.is_empty() {
        return None;
    }
    let limits: Vec<u32> = units
        .iter()
        .map(|unit| measurer.measure(FontRole::Primary, primary_size, unit.base()).width)
        .collect();

    let fits = |size: u32| {
        units.iter().zip(&limits).all(|(unit, &limit)| {
            measurer
                .measure(FontRole::Secondary, size, &unit.annotation)
                .width
                <= limit
        })
    };

    Some((floor..=primary_size).rev().find(|&size| fits(size)).unwrap_or(floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Rgb;
    use crate::test_util::BoxMeasurer;

    fn units(pairs: &[(char, &str)]) -> Vec<Unit> {
        pairs
            .iter()
            .map(|(c, a)| Unit::new(*c, *a, Rgb::BLACK))
            .collect()
    }

    fn all_fit(units: &[Unit], primary: u32, secondary: u32, m: &BoxMeasurer) -> bool {
        units.iter().all(|u| {
            m.measure(FontRole::Secondary, secondary, &u.annotation).width
                <= m.measure(FontRole::Primary, primary, u.base()).width
        })
    }

    #[test]
    fn narrow_annotations_keep_primary_size() {
        let m = BoxMeasurer {
            primary_em: 1.0,
            secondary_em: 0.3,
        };
        let u = units(&[('爱', "ài"), ('你', "nǐ")]);
        assert_eq!(fit_secondary_size(&u, 32, MIN_SECONDARY_SIZE, &m), Some(32));
    }

    #[test]
    fn long_annotation_shrinks_size() {
        let m = BoxMeasurer::narrow();
        // "zhuàng" is 6 chars at 0.5em: needs 3 * s <= 32.
        let u = units(&[('爱', "ài"), ('壮', "zhuàng")]);
        let size = fit_secondary_size(&u, 32, MIN_SECONDARY_SIZE, &m).unwrap();
        assert_eq!(size, 10);
        assert!(all_fit(&u, 32, size, &m));
        assert!(!all_fit(&u, 32, size + 1, &m));
    }

    #[test]
    fn falls_back_to_floor() {
        let m = BoxMeasurer::narrow();
        let u = units(&[('a', "a very long annotation indeed")]);
        assert_eq!(fit_secondary_size(&u, 32, MIN_SECONDARY_SIZE, &m), Some(MIN_SECONDARY_SIZE));
        assert_eq!(fit_secondary_size(&u, 32, 12, &m), Some(12));
    }

    #[test]
    fn empty_document_is_a_no_op() {
        assert_eq!(fit_secondary_size(&[], 32, MIN_SECONDARY_SIZE, &BoxMeasurer::narrow()), None);
    }

    #[test]
    fn result_fits_or_equals_floor() {
        let m = BoxMeasurer::narrow();
        let cases: [&[(char, &str)]; 4] = [
            &[('中', "zhōng"), ('国', "guó")],
            &[('一', "yī")],
            &[('双', "shuāng"), ('窗', "chuāng"), ('床', "chuáng")],
            &[('x', "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx")],
        ];
        for pairs in cases {
            let u = units(pairs);
            for primary in [10, 24, 32, 48, 100] {
                let size = fit_secondary_size(&u, primary, MIN_SECONDARY_SIZE, &m).unwrap();
                assert!(size == MIN_SECONDARY_SIZE || all_fit(&u, primary, size, &m));
            }
        }
    }

    #[test]
    fn monotone_in_primary_size() {
        let m = BoxMeasurer::narrow();
        let u = units(&[('双', "shuāng"), ('人', "rén")]);
        let mut last = 0;
        for primary in 8..=120 {
            let size = fit_secondary_size(&u, primary, MIN_SECONDARY_SIZE, &m).unwrap();
            assert!(size >= last, "primary {primary}: {size} < {last}");
            last = size;
        }
    }

    #[test]
    fn lowering_floor_keeps_an_existing_fit() {
        let m = BoxMeasurer::narrow();
        let u = units(&[('双', "shuāng"), ('人', "rén")]);
        let high = fit_secondary_size(&u, 64, 12, &m).unwrap();
        assert!(all_fit(&u, 64, high, &m));
        for floor in (1..12).rev() {
            assert!(fit_secondary_size(&u, 64, floor, &m).unwrap() >= high);
        }
    }
}
