use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("Point set lengths differ: reference has {reference}, mobile has {mobile}")]
    LengthMismatch { reference: usize, mobile: usize },

    #[error("Weight vector has {found} entries, but the point sets have {expected}")]
    WeightLengthMismatch { expected: usize, found: usize },

    #[error("Weight at position {index} is negative: {value}")]
    NegativeWeight { index: usize, value: f64 },

    #[error(
        "Insufficient points for a stable alignment: requires at least 3, but found {usable}"
    )]
    Degenerate { usable: usize },
}

/// A rigid-body transformation: a proper rotation followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * *point + self.translation
    }

    pub fn apply_to_all(&self, points: &mut [Point3<f64>]) {
        for point in points.iter_mut() {
            *point = self.apply(point);
        }
    }
}

/// Computes the rigid-body transform that superposes `mobile` onto `reference`
/// in the weighted least-squares sense (Kabsch).
///
/// Points with weight zero are excluded from the centroids and from the fit
/// entirely; applying the returned transform still moves them, so their
/// positions remain defined. The determinant test on the singular vectors
/// guarantees a proper rotation even when the best unconstrained map is a
/// reflection.
pub fn calculate_transformation(
    reference: &[Point3<f64>],
    mobile: &[Point3<f64>],
    weights: Option<&[f64]>,
) -> Result<Transform, FitError> {
    if reference.len() != mobile.len() {
        return Err(FitError::LengthMismatch {
            reference: reference.len(),
            mobile: mobile.len(),
        });
    }
    if let Some(w) = weights {
        if w.len() != reference.len() {
            return Err(FitError::WeightLengthMismatch {
                expected: reference.len(),
                found: w.len(),
            });
        }
        for (index, &value) in w.iter().enumerate() {
            if value < 0.0 {
                return Err(FitError::NegativeWeight { index, value });
            }
        }
    }

    let usable: Vec<(usize, f64)> = match weights {
        Some(w) => w
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value > 0.0)
            .map(|(index, &value)| (index, value))
            .collect(),
        None => (0..reference.len()).map(|index| (index, 1.0)).collect(),
    };

    if usable.len() < 3 {
        return Err(FitError::Degenerate {
            usable: usable.len(),
        });
    }

    let mut weight_sum = 0.0;
    let mut reference_sum = Vector3::zeros();
    let mut mobile_sum = Vector3::zeros();
    for &(index, weight) in &usable {
        weight_sum += weight;
        reference_sum += reference[index].coords * weight;
        mobile_sum += mobile[index].coords * weight;
    }
    let reference_centroid = Point3::from(reference_sum / weight_sum);
    let mobile_centroid = Point3::from(mobile_sum / weight_sum);

    let h = usable.iter().fold(Matrix3::zeros(), |acc, &(index, weight)| {
        let t = reference[index] - reference_centroid;
        let f = mobile[index] - mobile_centroid;
        acc + (t * f.transpose()) * weight
    });

    let svd = h.svd(true, true);
    let u = svd.u.unwrap();
    let v_t = svd.v_t.unwrap();

    let d = (u * v_t.transpose()).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation_matrix = u * correction * v_t;
    let rotation = Rotation3::from_matrix(&rotation_matrix);
    let translation = reference_centroid.coords - rotation * mobile_centroid.coords;

    Ok(Transform {
        rotation,
        translation,
    })
}
