use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RmsdError {
    #[error("Point set lengths differ: reference has {reference}, coords has {coords}")]
    LengthMismatch { reference: usize, coords: usize },

    #[error("Weight vector has {found} entries, but the point sets have {expected}")]
    WeightLengthMismatch { expected: usize, found: usize },

    #[error("Weight at position {index} is negative: {value}")]
    NegativeWeight { index: usize, value: f64 },

    #[error("RMSD is undefined: the weights sum to zero")]
    Undefined,
}

/// Computes the weighted root-mean-square deviation between two matched point
/// sets.
///
/// Weight-zero points contribute nothing to the numerator and are excluded
/// from the normalizing sum; `None` weights mean every point counts with
/// weight one. All weights zero makes the mean undefined and is reported as
/// an error rather than a division by zero.
pub fn calculate_rmsd(
    reference: &[Point3<f64>],
    coords: &[Point3<f64>],
    weights: Option<&[f64]>,
) -> Result<f64, RmsdError> {
    if reference.len() != coords.len() {
        return Err(RmsdError::LengthMismatch {
            reference: reference.len(),
            coords: coords.len(),
        });
    }

    let (squared_sum, weight_sum) = match weights {
        Some(w) => {
            if w.len() != reference.len() {
                return Err(RmsdError::WeightLengthMismatch {
                    expected: reference.len(),
                    found: w.len(),
                });
            }
            for (index, &value) in w.iter().enumerate() {
                if value < 0.0 {
                    return Err(RmsdError::NegativeWeight { index, value });
                }
            }
            reference
                .iter()
                .zip(coords.iter())
                .zip(w.iter())
                .fold((0.0, 0.0), |(num, denom), ((r, c), &weight)| {
                    (num + weight * (r - c).norm_squared(), denom + weight)
                })
        }
        None => {
            let squared_sum: f64 = reference
                .iter()
                .zip(coords.iter())
                .map(|(r, c)| (r - c).norm_squared())
                .sum();
            (squared_sum, reference.len() as f64)
        }
    };

    if weight_sum <= 0.0 {
        return Err(RmsdError::Undefined);
    }
    Ok((squared_sum / weight_sum).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn triangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn unweighted_rmsd_matches_hand_computation() {
        let reference = triangle();
        let coords: Vec<_> = reference
            .iter()
            .map(|p| p + Vector3::new(0.0, 0.0, 2.0))
            .collect();

        // Every atom displaced by 2.0, so the RMSD is exactly 2.0.
        let rmsd = calculate_rmsd(&reference, &coords, None).unwrap();
        assert!((rmsd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn identical_sets_have_zero_rmsd() {
        let reference = triangle();
        let rmsd = calculate_rmsd(&reference, &reference, None).unwrap();
        assert!(rmsd.abs() < 1e-12);
    }

    #[test]
    fn zero_weight_point_matches_physical_removal() {
        let reference = triangle();
        let mut coords = reference.clone();
        coords[2] = Point3::new(50.0, 50.0, 50.0);
        coords[0].z += 1.0;
        let weights = [1.0, 1.0, 0.0];

        let masked = calculate_rmsd(&reference, &coords, Some(&weights)).unwrap();
        let removed = calculate_rmsd(&reference[..2], &coords[..2], None).unwrap();
        assert!((masked - removed).abs() < 1e-12);
    }

    #[test]
    fn weights_scale_contributions() {
        let reference = triangle();
        let mut coords = reference.clone();
        coords[0].z += 1.0; // squared deviation 1.0 at weight 3.0
        coords[1].z += 2.0; // squared deviation 4.0 at weight 1.0
        let weights = [3.0, 1.0, 2.0];

        let rmsd = calculate_rmsd(&reference, &coords, Some(&weights)).unwrap();
        let expected = ((3.0 * 1.0 + 1.0 * 4.0) / 6.0f64).sqrt();
        assert!((rmsd - expected).abs() < 1e-12);
    }

    #[test]
    fn all_zero_weights_is_undefined() {
        let reference = triangle();
        let weights = [0.0, 0.0, 0.0];
        let result = calculate_rmsd(&reference, &reference, Some(&weights));
        assert!(matches!(result, Err(RmsdError::Undefined)));
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let reference = triangle();

        let result = calculate_rmsd(&reference, &reference[..2], None);
        assert!(matches!(
            result,
            Err(RmsdError::LengthMismatch {
                reference: 3,
                coords: 2
            })
        ));

        let result = calculate_rmsd(&reference, &reference, Some(&[1.0]));
        assert!(matches!(
            result,
            Err(RmsdError::WeightLengthMismatch {
                expected: 3,
                found: 1
            })
        ));

        let result = calculate_rmsd(&reference, &reference, Some(&[1.0, -1.0, 1.0]));
        assert!(matches!(
            result,
            Err(RmsdError::NegativeWeight { index: 1, .. })
        ));
    }
}
