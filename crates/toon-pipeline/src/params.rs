//! The tunable parameter set governing the cartoonization pipeline.
//!
//! [`CartoonParams`] is an explicit bundle of numeric knobs with
//! documented defaults and validated ranges. It owns no pipeline
//! behavior: stages read it, a UI or CLI collaborator writes it. The
//! range constants are public so sliders and flag parsers can derive
//! their bounds from the same source as the validator.
//!
//! Updates go through [`CartoonParams::update`] with a [`ParamPatch`]:
//! only fields present in the patch change, and the merged candidate is
//! validated *before* anything is committed, so a rejected patch leaves
//! the parameter set untouched.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::types::CartoonError;

/// Tunable parameters for the cartoonization pipeline.
///
/// Construct with [`CartoonParams::default`] (the documented defaults)
/// and mutate via [`update`](Self::update). Fields are public for
/// read access and struct-update construction in tests; going through
/// `update` is what guarantees validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartoonParams {
    /// Median-blur kernel size applied before edge detection.
    /// Must be odd; larger values suppress more texture noise at the
    /// cost of edge placement accuracy.
    pub line_size: u32,

    /// Reserved smoothing knob. Accepted and validated for
    /// compatibility with existing parameter files, but not read by any
    /// pipeline stage.
    pub blur_value: u32,

    /// Neighborhood diameter for the bilateral smoothing filter.
    pub bilateral_filter_d: u32,

    /// Bilateral filter sigma in color space. Larger values mix more
    /// dissimilar colors together.
    pub bilateral_sigma_color: f32,

    /// Bilateral filter sigma in coordinate space. Larger values let
    /// farther pixels influence each other.
    pub bilateral_sigma_space: f32,

    /// Lower hysteresis threshold for the Canny edge detector. Pixels
    /// with gradient magnitude between the two thresholds are edges
    /// only if connected to a strong edge.
    ///
    /// Must not exceed [`edge_threshold2`](Self::edge_threshold2).
    pub edge_threshold1: f32,

    /// Upper hysteresis threshold for the Canny edge detector. Pixels
    /// with gradient magnitude above this value are definite edges.
    pub edge_threshold2: f32,

    /// Number of color clusters in the quantized output. The output
    /// contains at most this many distinct colors.
    pub total_color_levels: usize,

    /// Seed for the k-means restarts. `Some` makes the pipeline fully
    /// reproducible (restart `i` is seeded with `seed + i`); `None`
    /// draws a seed from system randomness on every invocation.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CartoonParams {
    /// Default median-blur kernel size.
    pub const DEFAULT_LINE_SIZE: u32 = 7;
    /// Default reserved blur value.
    pub const DEFAULT_BLUR_VALUE: u32 = 7;
    /// Default bilateral filter diameter.
    pub const DEFAULT_BILATERAL_FILTER_D: u32 = 9;
    /// Default bilateral color-space sigma.
    pub const DEFAULT_BILATERAL_SIGMA_COLOR: f32 = 75.0;
    /// Default bilateral coordinate-space sigma.
    pub const DEFAULT_BILATERAL_SIGMA_SPACE: f32 = 75.0;
    /// Default lower Canny threshold.
    pub const DEFAULT_EDGE_THRESHOLD1: f32 = 50.0;
    /// Default upper Canny threshold.
    pub const DEFAULT_EDGE_THRESHOLD2: f32 = 150.0;
    /// Default quantized color count.
    pub const DEFAULT_TOTAL_COLOR_LEVELS: usize = 8;

    /// Valid range for [`line_size`](Self::line_size) (odd values only).
    pub const LINE_SIZE_RANGE: RangeInclusive<u32> = 1..=15;
    /// Valid range for [`blur_value`](Self::blur_value).
    pub const BLUR_VALUE_RANGE: RangeInclusive<u32> = 1..=15;
    /// Valid range for [`bilateral_filter_d`](Self::bilateral_filter_d).
    pub const BILATERAL_FILTER_D_RANGE: RangeInclusive<u32> = 5..=15;
    /// Valid range for both bilateral sigmas.
    pub const BILATERAL_SIGMA_RANGE: RangeInclusive<f32> = 10.0..=150.0;
    /// Valid range for [`edge_threshold1`](Self::edge_threshold1).
    pub const EDGE_THRESHOLD1_RANGE: RangeInclusive<f32> = 10.0..=100.0;
    /// Valid range for [`edge_threshold2`](Self::edge_threshold2).
    pub const EDGE_THRESHOLD2_RANGE: RangeInclusive<f32> = 50.0..=200.0;
    /// Valid range for [`total_color_levels`](Self::total_color_levels).
    pub const TOTAL_COLOR_LEVELS_RANGE: RangeInclusive<usize> = 2..=16;

    /// Check every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`CartoonError::InvalidParameter`] naming the first
    /// offending field. Cross-field: `edge_threshold1` must not exceed
    /// `edge_threshold2`, and `line_size` must be odd.
    pub fn validate(&self) -> Result<(), CartoonError> {
        check_range("line_size", self.line_size, &Self::LINE_SIZE_RANGE)?;
        if self.line_size.is_multiple_of(2) {
            return Err(CartoonError::InvalidParameter {
                field: "line_size",
                reason: format!("{} is not odd", self.line_size),
            });
        }
        check_range("blur_value", self.blur_value, &Self::BLUR_VALUE_RANGE)?;
        check_range(
            "bilateral_filter_d",
            self.bilateral_filter_d,
            &Self::BILATERAL_FILTER_D_RANGE,
        )?;
        check_range(
            "bilateral_sigma_color",
            self.bilateral_sigma_color,
            &Self::BILATERAL_SIGMA_RANGE,
        )?;
        check_range(
            "bilateral_sigma_space",
            self.bilateral_sigma_space,
            &Self::BILATERAL_SIGMA_RANGE,
        )?;
        check_range(
            "edge_threshold1",
            self.edge_threshold1,
            &Self::EDGE_THRESHOLD1_RANGE,
        )?;
        check_range(
            "edge_threshold2",
            self.edge_threshold2,
            &Self::EDGE_THRESHOLD2_RANGE,
        )?;
        if self.edge_threshold1 > self.edge_threshold2 {
            return Err(CartoonError::InvalidParameter {
                field: "edge_threshold1",
                reason: format!(
                    "{} exceeds edge_threshold2 ({})",
                    self.edge_threshold1, self.edge_threshold2,
                ),
            });
        }
        check_range(
            "total_color_levels",
            self.total_color_levels,
            &Self::TOTAL_COLOR_LEVELS_RANGE,
        )?;
        Ok(())
    }

    /// Apply a partial update.
    ///
    /// Fields present in the patch replace the current values; absent
    /// fields are left unchanged. The merged candidate is validated
    /// before committing, so on error `self` is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CartoonError::InvalidParameter`] if the merged
    /// parameter set fails [`validate`](Self::validate).
    pub fn update(&mut self, patch: &ParamPatch) -> Result<(), CartoonError> {
        let candidate = patch.merged_over(self);
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

impl Default for CartoonParams {
    fn default() -> Self {
        Self {
            line_size: Self::DEFAULT_LINE_SIZE,
            blur_value: Self::DEFAULT_BLUR_VALUE,
            bilateral_filter_d: Self::DEFAULT_BILATERAL_FILTER_D,
            bilateral_sigma_color: Self::DEFAULT_BILATERAL_SIGMA_COLOR,
            bilateral_sigma_space: Self::DEFAULT_BILATERAL_SIGMA_SPACE,
            edge_threshold1: Self::DEFAULT_EDGE_THRESHOLD1,
            edge_threshold2: Self::DEFAULT_EDGE_THRESHOLD2,
            total_color_levels: Self::DEFAULT_TOTAL_COLOR_LEVELS,
            seed: None,
        }
    }
}

/// A partial parameter update: every field optional, absent fields left
/// unchanged by [`CartoonParams::update`].
///
/// `seed` here sets the seed when present; a patch cannot clear an
/// already-set seed (assign the field directly for that).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamPatch {
    /// New median-blur kernel size.
    pub line_size: Option<u32>,
    /// New reserved blur value.
    pub blur_value: Option<u32>,
    /// New bilateral filter diameter.
    pub bilateral_filter_d: Option<u32>,
    /// New bilateral color-space sigma.
    pub bilateral_sigma_color: Option<f32>,
    /// New bilateral coordinate-space sigma.
    pub bilateral_sigma_space: Option<f32>,
    /// New lower Canny threshold.
    pub edge_threshold1: Option<f32>,
    /// New upper Canny threshold.
    pub edge_threshold2: Option<f32>,
    /// New quantized color count.
    pub total_color_levels: Option<usize>,
    /// New k-means seed.
    pub seed: Option<u64>,
}

impl ParamPatch {
    /// Merge this patch over a base parameter set, producing the
    /// candidate that [`CartoonParams::update`] validates.
    #[must_use]
    pub fn merged_over(&self, base: &CartoonParams) -> CartoonParams {
        CartoonParams {
            line_size: self.line_size.unwrap_or(base.line_size),
            blur_value: self.blur_value.unwrap_or(base.blur_value),
            bilateral_filter_d: self.bilateral_filter_d.unwrap_or(base.bilateral_filter_d),
            bilateral_sigma_color: self
                .bilateral_sigma_color
                .unwrap_or(base.bilateral_sigma_color),
            bilateral_sigma_space: self
                .bilateral_sigma_space
                .unwrap_or(base.bilateral_sigma_space),
            edge_threshold1: self.edge_threshold1.unwrap_or(base.edge_threshold1),
            edge_threshold2: self.edge_threshold2.unwrap_or(base.edge_threshold2),
            total_color_levels: self.total_color_levels.unwrap_or(base.total_color_levels),
            seed: self.seed.or(base.seed),
        }
    }
}

/// Range check producing an [`CartoonError::InvalidParameter`] naming
/// the field.
fn check_range<T>(
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) -> Result<(), CartoonError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CartoonError::InvalidParameter {
            field,
            reason: format!(
                "{value} is outside {}..={}",
                range.start(),
                range.end(),
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let p = CartoonParams::default();
        assert_eq!(p.line_size, 7);
        assert_eq!(p.blur_value, 7);
        assert_eq!(p.bilateral_filter_d, 9);
        assert!((p.bilateral_sigma_color - 75.0).abs() < f32::EPSILON);
        assert!((p.bilateral_sigma_space - 75.0).abs() < f32::EPSILON);
        assert!((p.edge_threshold1 - 50.0).abs() < f32::EPSILON);
        assert!((p.edge_threshold2 - 150.0).abs() < f32::EPSILON);
        assert_eq!(p.total_color_levels, 8);
        assert_eq!(p.seed, None);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(CartoonParams::default().validate().is_ok());
    }

    #[test]
    fn patch_changes_only_named_fields() {
        let mut p = CartoonParams::default();
        let before = p.clone();
        p.update(&ParamPatch {
            total_color_levels: Some(4),
            ..ParamPatch::default()
        })
        .unwrap();

        assert_eq!(p.total_color_levels, 4);
        assert_eq!(p.line_size, before.line_size);
        assert_eq!(p.blur_value, before.blur_value);
        assert_eq!(p.bilateral_filter_d, before.bilateral_filter_d);
        assert_eq!(p.bilateral_sigma_color, before.bilateral_sigma_color);
        assert_eq!(p.bilateral_sigma_space, before.bilateral_sigma_space);
        assert_eq!(p.edge_threshold1, before.edge_threshold1);
        assert_eq!(p.edge_threshold2, before.edge_threshold2);
        assert_eq!(p.seed, before.seed);
    }

    #[test]
    fn empty_patch_is_identity() {
        let mut p = CartoonParams::default();
        let before = p.clone();
        p.update(&ParamPatch::default()).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn even_line_size_rejected() {
        let mut p = CartoonParams::default();
        let result = p.update(&ParamPatch {
            line_size: Some(4),
            ..ParamPatch::default()
        });
        assert!(
            matches!(result, Err(CartoonError::InvalidParameter { field: "line_size", .. })),
            "expected line_size rejection, got {result:?}",
        );
    }

    #[test]
    fn out_of_range_line_size_rejected() {
        let p = CartoonParams {
            line_size: 17,
            ..CartoonParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(CartoonError::InvalidParameter {
                field: "line_size",
                ..
            }),
        ));
    }

    #[test]
    fn swapped_thresholds_rejected() {
        let p = CartoonParams {
            edge_threshold1: 90.0,
            edge_threshold2: 60.0,
            ..CartoonParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(CartoonError::InvalidParameter {
                field: "edge_threshold1",
                ..
            }),
        ));
    }

    #[test]
    fn equal_thresholds_accepted() {
        let p = CartoonParams {
            edge_threshold1: 60.0,
            edge_threshold2: 60.0,
            ..CartoonParams::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn degenerate_color_levels_rejected() {
        for levels in [0, 1, 17] {
            let p = CartoonParams {
                total_color_levels: levels,
                ..CartoonParams::default()
            };
            assert!(
                matches!(
                    p.validate(),
                    Err(CartoonError::InvalidParameter {
                        field: "total_color_levels",
                        ..
                    }),
                ),
                "expected rejection of total_color_levels = {levels}",
            );
        }
    }

    #[test]
    fn rejected_patch_leaves_params_untouched() {
        let mut p = CartoonParams::default();
        let before = p.clone();
        // total_color_levels is valid but line_size is not: nothing
        // may be committed.
        let result = p.update(&ParamPatch {
            line_size: Some(4),
            total_color_levels: Some(4),
            ..ParamPatch::default()
        });
        assert!(result.is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn patch_sets_seed() {
        let mut p = CartoonParams::default();
        p.update(&ParamPatch {
            seed: Some(42),
            ..ParamPatch::default()
        })
        .unwrap();
        assert_eq!(p.seed, Some(42));
    }

    #[test]
    fn params_serde_round_trip() {
        let p = CartoonParams {
            total_color_levels: 12,
            seed: Some(7),
            ..CartoonParams::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: CartoonParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn params_json_without_seed_defaults_to_none() {
        // Parameter files written before the seed field existed must
        // still parse.
        let json = r#"{
            "line_size": 7,
            "blur_value": 7,
            "bilateral_filter_d": 9,
            "bilateral_sigma_color": 75.0,
            "bilateral_sigma_space": 75.0,
            "edge_threshold1": 50.0,
            "edge_threshold2": 150.0,
            "total_color_levels": 8
        }"#;
        let p: CartoonParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.seed, None);
    }
}
