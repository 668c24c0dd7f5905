//! The per-year cashflow record emitted by the scenario kernel (C9) and
//! consumed by the aggregator (C13) and the cashflow-map RPC (C14).

use serde::{Deserialize, Serialize};

use crate::model::state::Regime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentType {
    None,
    GuardrailCut,
    GuardrailRaise,
    SkipInflationAdjustment,
    RmdForced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentReason {
    None,
    CapitalPreservationRule,
    ProsperityRule,
    PortfolioManagementRule,
    RequiredMinimumDistribution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyCashflow {
    pub year: u32,
    pub age: u32,
    pub portfolio_balance: f64,
    pub contributions: f64,
    pub withdrawal: f64,
    pub guaranteed_income: f64,
    pub healthcare_cost: f64,
    pub ltc_cost: f64,
    pub federal_tax: f64,
    pub state_tax: f64,
    pub medicare_premium: f64,
    pub net_cash_flow: f64,
    pub regime: Regime,
    pub adjustment_type: AdjustmentType,
    pub adjustment_reason: AdjustmentReason,
}
