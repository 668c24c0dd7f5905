//! Criterion benchmarks for retire_core.
//!
//! Run with: cargo bench -p retire_core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use retire_core::cma::Cma;
use retire_core::model::params::{AssetBuckets, OwnerMap, RetirementParams, SocialSecurityParams, TaxConfig};
use retire_core::model::profile::{Allocation, FilingStatus, HealthStatus, TaxBracket};
use retire_core::returns::ReturnGeneratorConfig;
use retire_core::simulation::{self, SimulationConfig};
use retire_core::taxes;

fn base_params(seed: u32) -> RetirementParams {
    RetirementParams {
        current_age: 55,
        retirement_age: 65,
        life_expectancy: 90,
        spouse_current_age: None,
        spouse_retirement_age: None,
        spouse_life_expectancy: None,
        gender: None,
        spouse_gender: None,
        health_status: HealthStatus::Good,
        spouse_health_status: None,
        current_retirement_assets: 900_000.0,
        annual_savings: 25_000.0,
        annual_wage_income: 130_000.0,
        annual_retirement_expenses: 70_000.0,
        annual_healthcare_costs: Some(11_000.0),
        expected_return: 0.06,
        return_volatility: 0.12,
        inflation_rate: 0.025,
        allocation: Allocation {
            us_stocks: 0.55,
            intl_stocks: 0.1,
            bonds: 0.3,
            cash: 0.05,
            alternatives: 0.0,
        },
        spouse_allocation: None,
        withdrawal_rate: 0.04,
        use_guardrails: true,
        tax_config: TaxConfig {
            federal_brackets: vec![
                TaxBracket { threshold: 0.0, rate: 0.10 },
                TaxBracket { threshold: 47_150.0, rate: 0.22 },
            ],
            state_rate: 0.05,
            capital_gains_brackets: taxes::default_ltcg_brackets(FilingStatus::Single),
            standard_deduction: 14_600.0,
            fica_rate: taxes::FICA_RATE,
        },
        filing_status: FilingStatus::Single,
        retirement_state: "CA".to_string(),
        asset_buckets: OwnerMap {
            user: AssetBuckets {
                tax_deferred: 600_000.0,
                tax_free: 150_000.0,
                capital_gains: 100_000.0,
                cash_equivalents: 50_000.0,
            },
            spouse: AssetBuckets::default(),
            joint: AssetBuckets::default(),
        },
        social_security: Some(SocialSecurityParams {
            monthly_benefit: 2_600.0,
            claim_age: 67,
        }),
        spouse_social_security: None,
        annual_pension: 0.0,
        spouse_annual_pension: 0.0,
        annual_part_time_income: 0.0,
        has_ltc_insurance: false,
        legacy_goal: 0.0,
        rmd_age: 73,
        roth_conversions_enabled: false,
        roth_conversion_bracket_ceiling: 0.0,
        random_seed: seed,
    }
}

fn bench_single_trial(c: &mut Criterion) {
    let params = base_params(1);
    let cma = Cma::baked_in_defaults();
    let return_config = ReturnGeneratorConfig::default();

    c.bench_function("single_trial_with_ltc_counterfactual", |b| {
        b.iter(|| simulation::run_one_trial(black_box(&params), black_box(&cma), black_box(&return_config), black_box(0)))
    });
}

fn bench_batch_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_batch");
    let cma = Cma::baked_in_defaults();
    let return_config = ReturnGeneratorConfig::default();

    for iterations in [100, 500, 1_000].iter() {
        let params = base_params(2);
        let config = SimulationConfig {
            iterations: *iterations,
            worker_count: 1,
            timeout: None,
        };

        group.bench_with_input(BenchmarkId::new("iterations", iterations), iterations, |b, _| {
            b.iter(|| {
                simulation::run_sequential(
                    black_box(&params),
                    black_box(&cma),
                    black_box(&return_config),
                    black_box(&config),
                )
            })
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_batch_parallel_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_vs_sequential");
    let params = base_params(3);
    let cma = Cma::baked_in_defaults();
    let return_config = ReturnGeneratorConfig::default();

    let seq_config = SimulationConfig {
        iterations: 1_000,
        worker_count: 1,
        timeout: None,
    };
    group.bench_function("sequential_1000", |b| {
        b.iter(|| simulation::run_sequential(black_box(&params), black_box(&cma), black_box(&return_config), black_box(&seq_config)))
    });

    let par_config = SimulationConfig {
        iterations: 1_000,
        worker_count: 8,
        timeout: None,
    };
    group.bench_function("parallel_1000_workers_8", |b| {
        b.iter(|| simulation::run_parallel(black_box(&params), black_box(&cma), black_box(&return_config), black_box(&par_config)))
    });

    group.finish();
}

fn bench_full_simulation(c: &mut Criterion) {
    let params = base_params(4);
    let cma = Cma::baked_in_defaults();
    let return_config = ReturnGeneratorConfig::default();
    let config = SimulationConfig {
        iterations: 1_000,
        worker_count: 1,
        timeout: None,
    };

    c.bench_function("run_simulation_with_aggregation", |b| {
        b.iter(|| {
            simulation::run_simulation(
                black_box(&params),
                black_box(&cma),
                black_box(&return_config),
                black_box(&config),
            )
        })
    });
}

#[cfg(feature = "parallel")]
criterion_group!(
    benches,
    bench_single_trial,
    bench_batch_sequential,
    bench_batch_parallel_vs_sequential,
    bench_full_simulation,
);

#[cfg(not(feature = "parallel"))]
criterion_group!(
    benches,
    bench_single_trial,
    bench_batch_sequential,
    bench_full_simulation,
);

criterion_main!(benches);
