//! Conversion of conformed `f32` samples to on-disk sample types.

/// Samples that can be produced from a conformed `f32`.
pub(crate) trait FromSample: Copy {
    fn from_sample(v: f32) -> Self;
}

macro_rules! impl_from_sample {
    ($($t:ty),*) => {
        $(impl FromSample for $t {
            fn from_sample(v: f32) -> Self {
                v.round() as $t
            }
        })*
    };
}

impl_from_sample!(u8, u16, u32, i8, i16, i32);

impl FromSample for f32 {
    fn from_sample(v: f32) -> Self {
        v
    }
}

impl FromSample for f64 {
    fn from_sample(v: f32) -> Self {
        v as f64
    }
}

pub(crate) fn cast_vec<T: FromSample>(values: &[f32]) -> Vec<T> {
    values.iter().map(|&v| T::from_sample(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_samples_round() {
        assert_eq!(cast_vec::<u8>(&[0.4, 0.6, 254.7]), vec![0, 1, 255]);
        assert_eq!(cast_vec::<i16>(&[-3.5, 2.2]), vec![-4, 2]);
        assert_eq!(cast_vec::<f64>(&[0.25]), vec![0.25]);
    }
}
