//! Treaty layering for a single risk: how much of the total insured value
//! each reinsurance group carries.

use serde::{Deserialize, Serialize};

use crate::models::enums::{HazardLevel, ReinsuranceProgram};
use crate::models::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReinsuranceInput {
    pub program: ReinsuranceProgram,
    pub hazard: HazardLevel,
    pub tiv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupCapacities {
    pub group1: f64,
    pub group2: f64,
    pub group3: f64,
    pub max_capacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSplit<T> {
    pub group1: T,
    pub group2: T,
    pub group3: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReinsuranceResult {
    pub program: ReinsuranceProgram,
    pub hazard: HazardLevel,
    pub tiv: f64,
    pub capacities: GroupCapacities,
    pub amounts: GroupSplit<f64>,
    /// `None` when the risk is over the line.
    pub percentages: GroupSplit<Option<f64>>,
    pub over_line: bool,
    pub g3_warning: bool,
}

impl ReinsuranceProgram {
    /// (group 1, group 3) capacity for a hazard grade.
    fn base_capacities(&self, hazard: HazardLevel) -> (f64, f64) {
        match (self, hazard) {
            (ReinsuranceProgram::Standard, HazardLevel::Low) => (3_000_000.0, 5_000_000.0),
            (ReinsuranceProgram::Standard, HazardLevel::BelowAverage) => (2_400_000.0, 5_000_000.0),
            (ReinsuranceProgram::Standard, HazardLevel::Average) => (1_800_000.0, 5_000_000.0),
            (ReinsuranceProgram::Standard, HazardLevel::AboveAverage) => (1_200_000.0, 4_800_000.0),
            (ReinsuranceProgram::Standard, HazardLevel::High) => (600_000.0, 2_400_000.0),
            (ReinsuranceProgram::Surplus, HazardLevel::Low) => (2_000_000.0, 5_000_000.0),
            (ReinsuranceProgram::Surplus, HazardLevel::BelowAverage) => (1_600_000.0, 5_000_000.0),
            (ReinsuranceProgram::Surplus, HazardLevel::Average) => (1_200_000.0, 5_000_000.0),
            (ReinsuranceProgram::Surplus, HazardLevel::AboveAverage) => (800_000.0, 5_000_000.0),
            (ReinsuranceProgram::Surplus, HazardLevel::High) => (400_000.0, 2_800_000.0),
        }
    }

    /// Group 2 capacity as a multiple of group 1.
    pub fn group2_multiplier(&self) -> f64 {
        match self {
            ReinsuranceProgram::Standard => 3.0,
            ReinsuranceProgram::Surplus => 2.0,
        }
    }

    /// Group 3 share above which the placement is flagged.
    pub fn g3_threshold(&self) -> f64 {
        match self {
            ReinsuranceProgram::Standard => 0.5,
            ReinsuranceProgram::Surplus => 0.7,
        }
    }

    pub fn capacities(&self, hazard: HazardLevel) -> GroupCapacities {
        let (group1, group3) = self.base_capacities(hazard);
        let group2 = self.group2_multiplier() * group1;
        GroupCapacities {
            group1,
            group2,
            group3,
            max_capacity: group1 + group2 + group3,
        }
    }
}

pub fn exceeds_g3_threshold(program: ReinsuranceProgram, g3_pct: f64) -> bool {
    g3_pct > program.g3_threshold()
}

/// Round to three decimals.
fn r3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn calculate(input: &ReinsuranceInput) -> Result<ReinsuranceResult, ValidationError> {
    let tiv = input.tiv;
    if !tiv.is_finite() || tiv < 0.0 {
        return Err(ValidationError::new(
            "tiv",
            "must be a finite, non-negative amount",
        ));
    }

    let zero = GroupSplit {
        group1: 0.0,
        group2: 0.0,
        group3: 0.0,
    };
    let mut result = ReinsuranceResult {
        program: input.program,
        hazard: input.hazard,
        tiv,
        capacities: GroupCapacities {
            group1: 0.0,
            group2: 0.0,
            group3: 0.0,
            max_capacity: 0.0,
        },
        amounts: zero,
        percentages: GroupSplit {
            group1: Some(0.0),
            group2: Some(0.0),
            group3: Some(0.0),
        },
        over_line: false,
        g3_warning: false,
    };
    if tiv == 0.0 {
        return Ok(result);
    }

    let caps = input.program.capacities(input.hazard);
    result.capacities = caps;

    if tiv > caps.max_capacity {
        result.over_line = true;
        result.percentages = GroupSplit {
            group1: None,
            group2: None,
            group3: None,
        };
        return Ok(result);
    }

    let g1 = tiv.min(caps.group1);
    let g2 = (tiv - g1).max(0.0).min(caps.group2);
    let g3 = (tiv - g1 - g2).max(0.0).min(caps.group3);

    let g1_pct = r3(g1 / tiv);
    let g2_pct = r3((1.0 - g1_pct).min(r3(input.program.group2_multiplier() * g1_pct)));
    let g3_pct = r3((1.0 - g1_pct - g2_pct).max(0.0));

    result.amounts = GroupSplit {
        group1: g1,
        group2: g2,
        group3: g3,
    };
    result.percentages = GroupSplit {
        group1: Some(g1_pct),
        group2: Some(g2_pct),
        group3: Some(g3_pct),
    };
    result.g3_warning = exceeds_g3_threshold(input.program, g3_pct);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(program: ReinsuranceProgram, hazard: HazardLevel, tiv: f64) -> ReinsuranceResult {
        calculate(&ReinsuranceInput {
            program,
            hazard,
            tiv,
        })
        .unwrap()
    }

    #[test]
    fn small_risk_sits_in_group_one() {
        let r = run(ReinsuranceProgram::Standard, HazardLevel::Low, 1_000_000.0);
        assert_eq!(r.amounts.group1, 1_000_000.0);
        assert_eq!(r.amounts.group2, 0.0);
        assert_eq!(r.percentages.group1, Some(1.0));
        assert_eq!(r.percentages.group2, Some(0.0));
        assert_eq!(r.percentages.group3, Some(0.0));
        assert!(!r.over_line);
        assert!(!r.g3_warning);
    }

    #[test]
    fn standard_waterfall_with_rounding() {
        // average hazard: g1 1.8M, g2 5.4M, g3 5M
        let r = run(ReinsuranceProgram::Standard, HazardLevel::Average, 10_000_000.0);
        assert_eq!(r.capacities.group2, 5_400_000.0);
        assert_eq!(r.capacities.max_capacity, 12_200_000.0);
        assert_eq!(r.amounts.group1, 1_800_000.0);
        assert_eq!(r.amounts.group2, 5_400_000.0);
        assert_eq!(r.amounts.group3, 2_800_000.0);
        assert_eq!(r.percentages.group1, Some(0.18));
        assert_eq!(r.percentages.group2, Some(0.54));
        assert_eq!(r.percentages.group3, Some(0.28));
        assert!(!r.g3_warning);
    }

    #[test]
    fn high_hazard_flags_group_three() {
        // g1 600k, g2 1.8M, g3 2.4M; tiv 4.8M -> g1% 0.125, g2% 0.375, g3% 0.5
        let r = run(ReinsuranceProgram::Standard, HazardLevel::High, 4_800_000.0);
        assert_eq!(r.percentages.group3, Some(0.5));
        assert!(!r.g3_warning);

        let r = run(ReinsuranceProgram::Standard, HazardLevel::High, 4_000_000.0);
        // g1% 0.15, g2% 0.45, g3% 0.4
        assert_eq!(r.percentages.group3, Some(0.4));

        let surplus = run(ReinsuranceProgram::Surplus, HazardLevel::High, 3_600_000.0);
        // g1% 0.111, g2% 0.222, g3% 0.667
        assert_eq!(surplus.percentages.group1, Some(0.111));
        assert_eq!(surplus.percentages.group2, Some(0.222));
        assert_eq!(surplus.percentages.group3, Some(0.667));
        assert!(!surplus.g3_warning);
    }

    #[test]
    fn full_line_stays_within_g3_threshold() {
        // Surplus high at capacity: g1% 0.1, g2% 0.2, g3% 0.7
        let at = run(ReinsuranceProgram::Surplus, HazardLevel::High, 4_000_000.0);
        assert_eq!(at.percentages.group3, Some(0.7));
        assert!(!at.g3_warning);

        // g1 800k: g1% 0.108, g2% 0.216, g3% 0.676
        let above = run(ReinsuranceProgram::Surplus, HazardLevel::AboveAverage, 7_400_000.0);
        assert_eq!(above.percentages.group3, Some(0.676));
        assert!(!above.g3_warning);
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!exceeds_g3_threshold(ReinsuranceProgram::Standard, 0.5));
        assert!(exceeds_g3_threshold(ReinsuranceProgram::Standard, 0.501));
        assert!(!exceeds_g3_threshold(ReinsuranceProgram::Surplus, 0.7));
        assert!(exceeds_g3_threshold(ReinsuranceProgram::Surplus, 0.701));
    }

    #[test]
    fn over_line_zeroes_amounts() {
        let r = run(ReinsuranceProgram::Surplus, HazardLevel::High, 4_000_001.0);
        assert!(r.over_line);
        assert_eq!(r.amounts.group1, 0.0);
        assert_eq!(r.percentages.group1, None);
        assert_eq!(r.capacities.max_capacity, 4_000_000.0);
        assert!(!r.g3_warning);
    }

    #[test]
    fn zero_tiv_is_all_zeros() {
        let r = run(ReinsuranceProgram::Standard, HazardLevel::Low, 0.0);
        assert_eq!(r.capacities.max_capacity, 0.0);
        assert_eq!(r.percentages.group3, Some(0.0));
        assert!(!r.over_line);
    }

    #[test]
    fn invalid_tiv_is_rejected() {
        for tiv in [-1.0, f64::NAN, f64::INFINITY] {
            let err = calculate(&ReinsuranceInput {
                program: ReinsuranceProgram::Standard,
                hazard: HazardLevel::Low,
                tiv,
            })
            .unwrap_err();
            assert_eq!(err.field, "tiv");
        }
    }

    #[test]
    fn input_uses_snake_case_names() {
        let input: ReinsuranceInput = serde_json::from_str(
            r#"{"program":"surplus","hazard":"above_average","tiv":2500000}"#,
        )
        .unwrap();
        assert_eq!(input.hazard, HazardLevel::AboveAverage);
    }
}
