//! `POST /calculate-cumulative-ss-optimization` (C14), wrapping the
//! claim-age optimizer (C12).

use axum::Json;
use retire_core::optimization::social_security::DEFAULT_REAL_DISCOUNT_RATE;
use retire_core::optimization::{optimize_claim_age, optimize_couple_claim_ages};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInput {
    pub annual_income: f64,
    pub birth_year: i32,
    pub current_age: u32,
    pub life_expectancy: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsOptimizationRequest {
    pub user: PersonInput,
    pub spouse: Option<PersonInput>,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
}

fn default_discount_rate() -> f64 {
    DEFAULT_REAL_DISCOUNT_RATE
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonOptimizationSummary {
    pub optimal_age: u32,
    pub max_lifetime_benefit: f64,
    pub monthly_at_optimal: f64,
    pub monthly_at_retirement: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeAnalysisRow {
    pub user_age: u32,
    pub spouse_age: Option<u32>,
    pub user_monthly: f64,
    pub spouse_monthly: f64,
    pub combined_monthly: f64,
    pub user_cumulative: f64,
    pub spouse_cumulative: f64,
    pub combined_cumulative: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedOptimum {
    pub optimal_user_age: u32,
    pub optimal_spouse_age: Option<u32>,
    pub max_lifetime_benefit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SsOptimizationResponse {
    pub user: PersonOptimizationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse: Option<PersonOptimizationSummary>,
    pub age_analysis: Vec<AgeAnalysisRow>,
    pub combined: CombinedOptimum,
}

pub async fn calculate_cumulative_ss_optimization(
    Json(req): Json<SsOptimizationRequest>,
) -> ApiResult<Json<SsOptimizationResponse>> {
    let user_result = optimize_claim_age(
        req.user.annual_income,
        req.user.birth_year,
        req.user.current_age,
        req.user.life_expectancy,
        req.discount_rate,
    );

    let user_summary = PersonOptimizationSummary {
        optimal_age: user_result.optimal_age,
        max_lifetime_benefit: user_result.max_lifetime_benefit,
        monthly_at_optimal: user_result.monthly_at_optimal,
        monthly_at_retirement: user_result.monthly_at_current_age,
    };

    let (spouse_summary, combined, age_analysis) = if let Some(spouse) = &req.spouse {
        let couple = optimize_couple_claim_ages(
            req.user.annual_income,
            req.user.birth_year,
            req.user.current_age,
            req.user.life_expectancy,
            spouse.annual_income,
            spouse.birth_year,
            spouse.current_age,
            spouse.life_expectancy,
            req.discount_rate,
        );

        let spouse_summary = PersonOptimizationSummary {
            optimal_age: couple.spouse.optimal_age,
            max_lifetime_benefit: couple.spouse.max_lifetime_benefit,
            monthly_at_optimal: couple.spouse.monthly_at_optimal,
            monthly_at_retirement: couple.spouse.monthly_at_current_age,
        };

        let mut analysis = Vec::with_capacity(couple.user.grid.len());
        for (user_point, spouse_point) in couple.user.grid.iter().zip(couple.spouse.grid.iter()) {
            analysis.push(AgeAnalysisRow {
                user_age: user_point.claim_age,
                spouse_age: Some(spouse_point.claim_age),
                user_monthly: user_point.monthly_benefit,
                spouse_monthly: spouse_point.monthly_benefit,
                combined_monthly: user_point.monthly_benefit + spouse_point.monthly_benefit,
                user_cumulative: user_point.npv,
                spouse_cumulative: spouse_point.npv,
                combined_cumulative: user_point.npv + spouse_point.npv,
            });
        }

        let combined = CombinedOptimum {
            optimal_user_age: couple.user.optimal_age,
            optimal_spouse_age: Some(couple.spouse.optimal_age),
            max_lifetime_benefit: couple.combined_max_lifetime_benefit,
        };

        (Some(spouse_summary), combined, analysis)
    } else {
        let analysis = user_result
            .grid
            .iter()
            .map(|point| AgeAnalysisRow {
                user_age: point.claim_age,
                spouse_age: None,
                user_monthly: point.monthly_benefit,
                spouse_monthly: 0.0,
                combined_monthly: point.monthly_benefit,
                user_cumulative: point.npv,
                spouse_cumulative: 0.0,
                combined_cumulative: point.npv,
            })
            .collect();

        let combined = CombinedOptimum {
            optimal_user_age: user_result.optimal_age,
            optimal_spouse_age: None,
            max_lifetime_benefit: user_result.max_lifetime_benefit,
        };

        (None, combined, analysis)
    };

    Ok(Json(SsOptimizationResponse {
        user: user_summary,
        spouse: spouse_summary,
        age_analysis,
        combined,
    }))
}
