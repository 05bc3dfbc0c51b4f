//! Divisor-constrained design search.
//!
//! Builds a dense grid of candidate parameter sets around a base design,
//! keeps the candidates whose light count is a multiple of the divisor,
//! and picks the one closest to the base in squared distance over the
//! adjusted fields.
//!
//! The grid holds `samples_per_axis ^ |adjust|` candidates, so only two
//! or three fields should be adjusted at once. Candidates are produced on
//! demand from their grid index rather than materialized up front.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{DesignError, Result};
use crate::geometry::RingLightDesign;
use crate::types::{Adjustment, ParamField, ParameterSet, SearchRequest, SearchResult};

/// `n` evenly spaced values from `start` to `stop` inclusive. The last
/// value is pinned to `stop`; a single sample is `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => return Vec::new(),
        1 => return vec![start],
        _ => {}
    }
    let step = (stop - start) / (n - 1) as f64;
    let mut values: Vec<f64> = (0..n).map(|i| i as f64 * step + start).collect();
    if let Some(last) = values.last_mut() {
        *last = stop;
    }
    values
}

/// Lazily enumerated Cartesian product of per-field sample values.
///
/// Candidate `i` decodes `i` as a mixed-radix number whose least
/// significant digit indexes the first adjusted field, so the first field
/// varies fastest.
#[derive(Debug, Clone)]
pub struct CandidateGrid {
    base: ParameterSet,
    axes: Vec<(ParamField, Vec<f64>)>,
    grid_size: usize,
    cursor: usize,
}

impl CandidateGrid {
    pub fn new(base: &ParameterSet, adjust: &[Adjustment], samples_per_axis: usize) -> Result<Self> {
        if samples_per_axis == 0 {
            return Err(DesignError::invalid_named(
                "samples_per_axis",
                "at least one sample per axis is required",
            ));
        }
        let mut seen = HashSet::new();
        let mut axes = Vec::with_capacity(adjust.len());
        for adj in adjust {
            if !adj.field.is_continuous() {
                return Err(DesignError::invalid(adj.field, "integer field cannot be adjusted"));
            }
            if !seen.insert(adj.field) {
                return Err(DesignError::invalid(adj.field, "adjusted more than once"));
            }
            if !(adj.width.is_finite() && adj.width >= 0.0) {
                return Err(DesignError::invalid(
                    adj.field,
                    format!("adjustment width must be finite and non-negative, got {}", adj.width),
                ));
            }
            let center = base.value(adj.field);
            let values = linspace(
                center - 0.5 * adj.width,
                center + 0.5 * adj.width,
                samples_per_axis,
            );
            axes.push((adj.field, values));
        }

        let exponent = u32::try_from(axes.len()).ok();
        let grid_size = exponent
            .and_then(|e| samples_per_axis.checked_pow(e))
            .ok_or_else(|| {
                DesignError::invalid_named(
                    "samples_per_axis",
                    format!("grid of {samples_per_axis}^{} candidates is too large", axes.len()),
                )
            })?;

        Ok(CandidateGrid {
            base: base.clone(),
            axes,
            grid_size,
            cursor: 0,
        })
    }

    /// Total number of candidates, independent of iteration progress.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn base(&self) -> &ParameterSet {
        &self.base
    }

    pub fn adjust_fields(&self) -> Vec<ParamField> {
        self.axes.iter().map(|(f, _)| *f).collect()
    }

    pub fn axis_values(&self, field: ParamField) -> Option<&[f64]> {
        self.axes
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_slice())
    }

    /// Candidate at a grid index, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<ParameterSet> {
        if index >= self.grid_size {
            return None;
        }
        let mut out = self.base.clone();
        let mut rest = index;
        for (field, values) in &self.axes {
            out.set_value(*field, values[rest % values.len()]);
            rest /= values.len();
        }
        Some(out)
    }
}

impl Iterator for CandidateGrid {
    type Item = ParameterSet;

    fn next(&mut self) -> Option<ParameterSet> {
        let item = self.get(self.cursor)?;
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid_size - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CandidateGrid {}

/// Grid of candidates around `base`, varying each adjusted field over
/// `[base - width/2, base + width/2]` and holding the rest fixed.
pub fn enumerate_candidates(
    base: &ParameterSet,
    adjust: &[Adjustment],
    samples_per_axis: usize,
) -> Result<CandidateGrid> {
    CandidateGrid::new(base, adjust, samples_per_axis)
}

/// Light count of a candidate if its count is a multiple of `divisor`.
/// Candidates that do not form a valid design are never divisible.
fn divisible_light_count(candidate: &ParameterSet, divisor: u32) -> Option<usize> {
    match RingLightDesign::new(candidate.clone()) {
        Ok(design) => {
            let count = design.light_count();
            (count % divisor as usize == 0).then_some(count)
        }
        Err(err) => {
            debug!(error = %err, "skipping candidate");
            None
        }
    }
}

/// Candidates whose light count is divisible by `divisor`, in input order.
pub fn filter_divisible<I>(candidates: I, divisor: u32) -> Result<Vec<ParameterSet>>
where
    I: IntoIterator<Item = ParameterSet>,
{
    if divisor == 0 {
        return Err(DesignError::InvalidDivisor(divisor));
    }
    Ok(candidates
        .into_iter()
        .filter(|c| divisible_light_count(c, divisor).is_some())
        .collect())
}

/// Same as [`filter_divisible`] over a whole grid, evaluating candidates
/// on the rayon pool. Collecting an indexed range keeps grid order.
fn filter_divisible_grid(grid: &CandidateGrid, divisor: u32) -> Vec<ParameterSet> {
    (0..grid.grid_size())
        .into_par_iter()
        .filter_map(|i| {
            let candidate = grid.get(i)?;
            divisible_light_count(&candidate, divisor).map(|_| candidate)
        })
        .collect()
}

/// Sum of squared differences from `base` over the adjusted fields.
pub fn cost(candidate: &ParameterSet, base: &ParameterSet, adjust_fields: &[ParamField]) -> f64 {
    let mut total = 0.0;
    for &field in adjust_fields {
        let d = base.value(field) - candidate.value(field);
        total += d * d;
    }
    total
}

/// Lowest-cost candidate; the first one wins ties.
pub fn select_best(
    candidates: &[ParameterSet],
    base: &ParameterSet,
    adjust_fields: &[ParamField],
) -> Result<(ParameterSet, f64)> {
    let mut best: Option<(&ParameterSet, f64)> = None;
    for c in candidates {
        let c_cost = cost(c, base, adjust_fields);
        match best {
            Some((_, best_cost)) if c_cost >= best_cost => {}
            _ => best = Some((c, c_cost)),
        }
    }
    best.map(|(p, c)| (p.clone(), c))
        .ok_or(DesignError::NoFeasibleDesign {
            divisor: None,
            grid_size: candidates.len(),
        })
}

/// Run the full search: enumerate, filter by divisibility, select.
///
/// The winning parameter set carries the divisor it was chosen for.
pub fn find_min_divisible_design(request: &SearchRequest) -> Result<SearchResult> {
    let divisor = request.divisor;
    if divisor == 0 {
        return Err(DesignError::InvalidDivisor(divisor));
    }
    request.base.validate()?;

    let grid = enumerate_candidates(&request.base, &request.adjust, request.samples_per_axis)?;
    let grid_size = grid.grid_size();
    let adjust_fields = grid.adjust_fields();
    debug!(grid_size, divisor, "evaluating candidate grid");

    let feasible = filter_divisible_grid(&grid, divisor);
    if feasible.is_empty() {
        return Err(DesignError::NoFeasibleDesign {
            divisor: Some(divisor),
            grid_size,
        });
    }

    let (mut params, cost) = select_best(&feasible, &request.base, &adjust_fields)?;
    params.divisor = Some(divisor);
    let light_count = RingLightDesign::new(params.clone())?.light_count();

    info!(
        divisor,
        grid_size,
        feasible = feasible.len(),
        cost,
        light_count,
        "design search complete"
    );

    Ok(SearchResult {
        params,
        cost,
        light_count,
        grid_size,
        feasible_count: feasible.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::light_count;
    use crate::types::tests::base_params;

    fn spacing_adjust() -> Vec<Adjustment> {
        vec![
            Adjustment {
                field: ParamField::RadialSpacing,
                width: 1.0,
            },
            Adjustment {
                field: ParamField::CircumSpacing,
                width: 1.0,
            },
        ]
    }

    fn make_request(divisor: u32) -> SearchRequest {
        SearchRequest {
            divisor,
            base: base_params(),
            adjust: spacing_adjust(),
            samples_per_axis: 10,
        }
    }

    #[test]
    fn linspace_endpoints() {
        let v = linspace(4.0, 5.0, 10);
        assert_eq!(v.len(), 10);
        assert_eq!(v[0], 4.0);
        assert_eq!(v[9], 5.0);
        assert!((v[1] - 4.111111111111111).abs() < 1e-15);
        for w in v.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert_eq!(linspace(2.0, 2.0, 3), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn grid_size_is_samples_to_the_power_of_fields() {
        let three = vec![
            Adjustment {
                field: ParamField::RadialSpacing,
                width: 1.0,
            },
            Adjustment {
                field: ParamField::CircumSpacing,
                width: 0.5,
            },
            Adjustment {
                field: ParamField::InnerMargin,
                width: 2.0,
            },
        ];
        for samples in [1, 2, 5, 10] {
            for k in 0..=3 {
                let grid = enumerate_candidates(&base_params(), &three[..k], samples).unwrap();
                let expected = samples.pow(k as u32);
                assert_eq!(grid.grid_size(), expected);
                assert_eq!(grid.len(), expected);
                assert_eq!(grid.count(), expected);
            }
        }
    }

    #[test]
    fn grid_values_stay_in_window() {
        let base = base_params();
        let grid = enumerate_candidates(&base, &spacing_adjust(), 10).unwrap();
        for c in grid {
            assert!(c.radial_spacing >= 4.0 && c.radial_spacing <= 5.0);
            assert!(c.circum_spacing >= 2.5 && c.circum_spacing <= 3.5);
            assert_eq!(c.inner_diameter, base.inner_diameter);
            assert_eq!(c.number_rows, base.number_rows);
            assert_eq!(c.part_width, base.part_width);
        }
    }

    #[test]
    fn first_field_varies_fastest() {
        let grid = enumerate_candidates(&base_params(), &spacing_adjust(), 10).unwrap();
        let c0 = grid.get(0).unwrap();
        let c1 = grid.get(1).unwrap();
        let c10 = grid.get(10).unwrap();
        assert_eq!((c0.radial_spacing, c0.circum_spacing), (4.0, 2.5));
        assert_eq!(c1.circum_spacing, 2.5);
        assert!(c1.radial_spacing > c0.radial_spacing);
        assert_eq!(c10.radial_spacing, 4.0);
        assert!(c10.circum_spacing > c0.circum_spacing);
        assert!(grid.get(100).is_none());
        assert_eq!(grid.axis_values(ParamField::RadialSpacing).unwrap().len(), 10);
        assert!(grid.axis_values(ParamField::PartWidth).is_none());
    }

    #[test]
    fn empty_adjustment_yields_base() {
        let mut grid = enumerate_candidates(&base_params(), &[], 10).unwrap();
        assert_eq!(grid.grid_size(), 1);
        assert_eq!(grid.next(), Some(base_params()));
        assert_eq!(grid.next(), None);
    }

    #[test]
    fn invalid_adjustments_rejected() {
        let base = base_params();
        assert!(enumerate_candidates(&base, &spacing_adjust(), 0).is_err());

        let rows = [Adjustment {
            field: ParamField::NumberRows,
            width: 2.0,
        }];
        assert!(matches!(
            enumerate_candidates(&base, &rows, 10),
            Err(DesignError::InvalidParameter { ref field, .. }) if field == "number_rows"
        ));

        let twice = [spacing_adjust()[0], spacing_adjust()[0]];
        assert!(enumerate_candidates(&base, &twice, 10).is_err());

        let negative = [Adjustment {
            field: ParamField::PartWidth,
            width: -1.0,
        }];
        assert!(enumerate_candidates(&base, &negative, 10).is_err());
    }

    #[test]
    fn divisor_one_keeps_everything() {
        let grid = enumerate_candidates(&base_params(), &spacing_adjust(), 10).unwrap();
        let kept = filter_divisible(grid, 1).unwrap();
        assert_eq!(kept.len(), 100);
    }

    #[test]
    fn filter_keeps_only_divisible() {
        let grid = enumerate_candidates(&base_params(), &spacing_adjust(), 10).unwrap();
        let kept = filter_divisible(grid.clone(), 7).unwrap();
        assert!(!kept.is_empty());
        assert!(kept.len() < 100);
        for c in &kept {
            assert_eq!(light_count(c).unwrap() % 7, 0);
        }
        assert_eq!(kept, filter_divisible_grid(&grid, 7));
    }

    #[test]
    fn zero_divisor_rejected() {
        let grid = enumerate_candidates(&base_params(), &spacing_adjust(), 10).unwrap();
        assert!(matches!(
            filter_divisible(grid, 0),
            Err(DesignError::InvalidDivisor(0))
        ));
        assert!(matches!(
            find_min_divisible_design(&make_request(0)),
            Err(DesignError::InvalidDivisor(0))
        ));
    }

    #[test]
    fn degenerate_candidates_are_skipped() {
        let mut base = base_params();
        base.inner_diameter = 1.0;
        base.inner_margin = 0.0;
        let kept = filter_divisible(vec![base, base_params()], 1).unwrap();
        assert_eq!(kept, vec![base_params()]);
    }

    #[test]
    fn select_best_on_empty_fails() {
        let err = select_best(&[], &base_params(), &[ParamField::RadialSpacing]).unwrap_err();
        assert!(matches!(
            err,
            DesignError::NoFeasibleDesign {
                divisor: None,
                grid_size: 0
            }
        ));
    }

    #[test]
    fn select_best_first_wins_ties() {
        let base = base_params();
        let fields = [ParamField::RadialSpacing];
        let below = base.with_value(ParamField::RadialSpacing, 4.25).unwrap();
        let above = base.with_value(ParamField::RadialSpacing, 4.75).unwrap();
        let far = base.with_value(ParamField::RadialSpacing, 5.0).unwrap();

        let (best, c) = select_best(&[far.clone(), below.clone(), above.clone()], &base, &fields).unwrap();
        assert_eq!(best, below);
        assert_eq!(c, 0.0625);

        let (best, _) = select_best(&[far, above.clone(), below], &base, &fields).unwrap();
        assert_eq!(best, above);
    }

    #[test]
    fn cost_ignores_fixed_fields() {
        let base = base_params();
        let mut c = base.with_value(ParamField::RadialSpacing, 5.0).unwrap();
        c.part_width = 100.0;
        assert_eq!(cost(&c, &base, &[ParamField::RadialSpacing]), 0.25);
        assert_eq!(cost(&base, &base, &[ParamField::RadialSpacing, ParamField::CircumSpacing]), 0.0);
    }

    #[test]
    fn reference_search_divisor_7() {
        let result = find_min_divisible_design(&make_request(7)).unwrap();
        assert!((result.params.radial_spacing - 4.555555555555555).abs() < 1e-12);
        assert!((result.params.circum_spacing - 3.0555555555555554).abs() < 1e-12);
        assert!((result.cost - 0.006172839506172796).abs() < 1e-15);
        assert_eq!(result.light_count, 168);
        assert_eq!(result.light_count % 7, 0);
        assert_eq!(result.params.divisor, Some(7));
        assert_eq!(result.grid_size, 100);

        // No feasible grid point is cheaper.
        let grid = enumerate_candidates(&base_params(), &spacing_adjust(), 10).unwrap();
        let fields = grid.adjust_fields();
        for c in filter_divisible(grid, 7).unwrap() {
            assert!(cost(&c, &base_params(), &fields) >= result.cost);
        }
    }

    #[test]
    fn reference_search_divisor_11() {
        let result = find_min_divisible_design(&make_request(11)).unwrap();
        assert!((result.params.radial_spacing - 4.444444444444445).abs() < 1e-12);
        assert!((result.params.circum_spacing - 3.1666666666666665).abs() < 1e-12);
        assert_eq!(result.light_count, 165);
    }

    #[test]
    fn parallel_matches_serial() {
        for divisor in [1, 2, 3, 5, 7, 13] {
            let req = make_request(divisor);
            let result = find_min_divisible_design(&req).unwrap();

            let grid = enumerate_candidates(&req.base, &req.adjust, req.samples_per_axis).unwrap();
            let kept = filter_divisible(grid, divisor).unwrap();
            let (best, c) = select_best(&kept, &req.base, &req.adjust_fields()).unwrap();

            assert_eq!(result.feasible_count, kept.len());
            assert_eq!(result.params.radial_spacing, best.radial_spacing);
            assert_eq!(result.params.circum_spacing, best.circum_spacing);
            assert_eq!(result.cost, c);
        }
    }

    #[test]
    fn infeasible_grid_reports_context() {
        let err = find_min_divisible_design(&make_request(1000)).unwrap_err();
        assert!(matches!(
            err,
            DesignError::NoFeasibleDesign {
                divisor: Some(1000),
                grid_size: 100
            }
        ));
        assert!(err.to_string().contains("100 candidates"));
    }

    #[test]
    fn base_already_divisible_costs_nothing() {
        let mut req = make_request(7);
        req.adjust.clear();
        let result = find_min_divisible_design(&req).unwrap();
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.light_count, 168);
        assert_eq!(result.grid_size, 1);
    }

    #[test]
    fn window_crossing_zero_skips_negative_spacing() {
        let mut base = base_params();
        base.circum_spacing = 0.2;
        let adjust = vec![Adjustment {
            field: ParamField::CircumSpacing,
            width: 1.0,
        }];
        let grid = enumerate_candidates(&base, &adjust, 10).unwrap();
        let values = grid.axis_values(ParamField::CircumSpacing).unwrap();
        assert_eq!(values.iter().filter(|&&v| v < 0.0).count(), 3);

        let kept = filter_divisible(grid, 1).unwrap();
        assert_eq!(kept.len(), 7);
        assert!(kept.iter().all(|c| c.circum_spacing >= 0.0));

        let req = SearchRequest {
            divisor: 1,
            base,
            adjust,
            samples_per_axis: 10,
        };
        let result = find_min_divisible_design(&req).unwrap();
        assert_eq!(result.grid_size, 10);
        assert_eq!(result.feasible_count, 7);
        assert!(result.params.circum_spacing >= 0.0);
        assert!((result.params.circum_spacing - 0.2).abs() < 0.06);
        assert!(result.cost < 1.0 / 18.0 * (1.0 / 18.0) + 1e-12);
    }

    #[test]
    fn oversized_candidates_are_skipped() {
        let mut base = base_params();
        base.part_width = 1e-300;
        base.circum_spacing = 0.0;
        let req = SearchRequest {
            divisor: 7,
            base,
            adjust: vec![Adjustment {
                field: ParamField::RadialSpacing,
                width: 1.0,
            }],
            samples_per_axis: 10,
        };
        assert!(matches!(
            find_min_divisible_design(&req),
            Err(DesignError::NoFeasibleDesign {
                divisor: Some(7),
                grid_size: 10
            })
        ));
    }

    #[test]
    fn invalid_base_rejected_before_search() {
        let mut req = make_request(7);
        req.base.number_rows = 0;
        assert!(matches!(
            find_min_divisible_design(&req),
            Err(DesignError::InvalidParameter { .. })
        ));
    }
}
