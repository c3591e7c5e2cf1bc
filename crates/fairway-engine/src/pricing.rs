//! Pricing engine: world ranking → salary.
//!
//! ```text
//! factor  = piecewise-linear(ranking)            ∈ [0, 1]
//! base    = MIN + (MAX - MIN) × factor
//! salary  = clean(base × form × field_size)      clamped to [MIN, MAX]
//! ```
//!
//! All arithmetic is done in [`Decimal`], so the same field prices to the
//! same salaries on every machine.
//!
//! After pricing a whole field, the cheapest full lineup is cross-checked
//! against the cap. If it would eat more than the configured share of the
//! cap, every salary is scaled down by the same ratio.

use std::collections::BTreeMap;

use fairway_types::{
    FairwayError, Form, Player, PlayerId, PricingConfig, Result, Salary, constants,
};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// `(ranking, factor in hundredths)` anchors. Rankings past the last anchor
/// get the last factor.
const FACTOR_CURVE: [(u32, i64); 9] = [
    (1, 100),
    (2, 93),
    (5, 87),
    (10, 75),
    (25, 55),
    (50, 35),
    (100, 22),
    (200, 8),
    (300, 0),
];

/// `(largest field size, multiplier in hundredths)`. Larger fields get the
/// 0.95 floor.
const FIELD_SIZE_TIERS: [(usize, i64); 4] = [(30, 115), (50, 110), (75, 105), (120, 100)];
const LARGE_FIELD_MULTIPLIER: i64 = 95;

fn hundredths(n: i64) -> Decimal {
    Decimal::new(n, 2)
}

/// Salary factor for a ranking. Unranked (and the invalid rank 0) get the
/// floor factor.
#[must_use]
pub fn ranking_factor(ranking: Option<u32>) -> Decimal {
    let floor = hundredths(FACTOR_CURVE[FACTOR_CURVE.len() - 1].1);
    let Some(rank) = ranking.filter(|r| *r > 0) else {
        return floor;
    };

    let (best_rank, best_factor) = FACTOR_CURVE[0];
    if rank <= best_rank {
        return hundredths(best_factor);
    }

    for pair in FACTOR_CURVE.windows(2) {
        let (r0, f0) = pair[0];
        let (r1, f1) = pair[1];
        if rank <= r1 {
            let (f0, f1) = (hundredths(f0), hundredths(f1));
            return f0 + (f1 - f0) * Decimal::from(rank - r0) / Decimal::from(r1 - r0);
        }
    }
    floor
}

/// Field-size multiplier: smaller fields make each golfer pricier.
#[must_use]
pub fn field_size_multiplier(field_size: usize) -> Decimal {
    FIELD_SIZE_TIERS
        .iter()
        .find(|(max, _)| field_size <= *max)
        .map_or(hundredths(LARGE_FIELD_MULTIPLIER), |(_, m)| hundredths(*m))
}

fn clean_candidates(value: Salary) -> impl Iterator<Item = Salary> {
    let base = value.div_euclid(100) * 100;
    constants::PERMITTED_SALARY_REMAINDERS
        .iter()
        .map(move |r| base + r)
        .chain(std::iter::once(base + 100))
}

/// Nearest value whose last two digits are a permitted remainder.
/// Ties round up.
#[must_use]
pub fn snap_to_clean(value: Salary) -> Salary {
    clean_candidates(value)
        .min_by_key(|c| ((c - value).abs(), std::cmp::Reverse(*c)))
        .unwrap_or(value)
}

/// Largest permitted value not above `value`.
#[must_use]
pub fn snap_down_to_clean(value: Salary) -> Salary {
    clean_candidates(value)
        .filter(|c| *c <= value)
        .max()
        .unwrap_or(value)
}

/// Whether `salary` ends in a permitted remainder.
#[must_use]
pub fn is_clean(salary: Salary) -> bool {
    constants::PERMITTED_SALARY_REMAINDERS.contains(&salary.rem_euclid(100))
}

/// Summary numbers for a priced field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryStats {
    pub count: usize,
    pub min: Salary,
    pub max: Salary,
    pub mean: Salary,
    /// Cheapest full lineup before any rescale.
    pub unscaled_cheapest_lineup_sum: Salary,
    /// Cheapest full lineup in the final salaries.
    pub cheapest_lineup_sum: Salary,
    pub cheapest_lineup_target: Salary,
    /// False only when clamping to the salary floor makes the target unreachable.
    pub target_reachable: bool,
}

/// Salaries for a whole field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryReport {
    pub salaries: BTreeMap<PlayerId, Salary>,
    pub stats: SalaryStats,
    pub needs_scaling: bool,
}

/// Prices golfers from ranking, form and field size.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    #[must_use]
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Salary for a single golfer.
    ///
    /// Non-increasing as `ranking` worsens, always within
    /// `[min_salary, max_salary]`, always clean.
    #[must_use]
    pub fn calculate_salary(&self, ranking: Option<u32>, form: Form, field_size: usize) -> Salary {
        let (min, max) = (self.config.min_salary, self.config.max_salary);
        let base = Decimal::from(min) + Decimal::from(max - min) * ranking_factor(ranking);
        let adjusted = base * form.multiplier() * field_size_multiplier(field_size);
        let raw = adjusted
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(max);
        snap_to_clean(raw).clamp(min, max)
    }

    /// Price every player and cross-check the cheapest lineup against the cap.
    pub fn calculate_all_salaries(
        &self,
        players: &[Player],
        field_size: usize,
    ) -> Result<SalaryReport> {
        let mut salaries = BTreeMap::new();
        for p in players {
            if p.ranking == Some(0) {
                return Err(FairwayError::InvalidRanking {
                    player: p.id,
                    ranking: 0,
                });
            }
            salaries.insert(p.id, self.calculate_salary(p.ranking, p.form, field_size));
        }

        let target = self.cheapest_lineup_target();
        let unscaled = self.cheapest_lineup_sum(&salaries);
        let needs_scaling = players.len() >= self.config.roster_size && unscaled > target;

        if needs_scaling {
            tracing::warn!(
                players = players.len(),
                cheapest_lineup = unscaled,
                target,
                "Cheapest lineup exceeds cap share, rescaling field"
            );
            for salary in salaries.values_mut() {
                *salary = self.rescale(*salary, target, unscaled);
            }
        }

        let cheapest = self.cheapest_lineup_sum(&salaries);
        let target_reachable = !needs_scaling || cheapest <= target;
        if !target_reachable {
            tracing::warn!(
                cheapest_lineup = cheapest,
                target,
                "Salary floor keeps cheapest lineup above target"
            );
        }

        let stats = SalaryStats {
            count: salaries.len(),
            min: salaries.values().copied().min().unwrap_or(0),
            max: salaries.values().copied().max().unwrap_or(0),
            mean: mean(salaries.values().copied()),
            unscaled_cheapest_lineup_sum: unscaled,
            cheapest_lineup_sum: cheapest,
            cheapest_lineup_target: target,
            target_reachable,
        };

        tracing::debug!(
            players = stats.count,
            min = stats.min,
            max = stats.max,
            needs_scaling,
            "Field priced"
        );

        Ok(SalaryReport {
            salaries,
            stats,
            needs_scaling,
        })
    }

    /// `floor(cap × cheapest_lineup_fraction)`.
    #[must_use]
    pub fn cheapest_lineup_target(&self) -> Salary {
        (Decimal::from(self.config.salary_cap) * self.config.cheapest_lineup_fraction)
            .floor()
            .to_i64()
            .unwrap_or(self.config.salary_cap)
    }

    fn cheapest_lineup_sum(&self, salaries: &BTreeMap<PlayerId, Salary>) -> Salary {
        let mut all: Vec<Salary> = salaries.values().copied().collect();
        all.sort_unstable();
        all.iter().take(self.config.roster_size).sum()
    }

    /// Scale by `target / total` and snap down so the bound holds after
    /// rounding. Multiply before dividing to keep the ratio exact.
    fn rescale(&self, salary: Salary, target: Salary, total: Salary) -> Salary {
        let scaled = (Decimal::from(salary) * Decimal::from(target) / Decimal::from(total))
            .floor()
            .to_i64()
            .unwrap_or(salary);
        snap_down_to_clean(scaled).clamp(self.config.min_salary, self.config.max_salary)
    }
}

fn mean(values: impl Iterator<Item = Salary>) -> Salary {
    let (sum, n) = values.fold((0i64, 0i64), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0 } else { sum / n }
}

/// Write computed salaries back onto the players' cached salary field.
pub fn apply_report(players: &mut [Player], report: &SalaryReport) {
    for p in players {
        if let Some(salary) = report.salaries.get(&p.id) {
            p.salary = Some(*salary);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    const FORMS: [Form; 5] = [Form::Hot, Form::Good, Form::Average, Form::Poor, Form::Cold];

    fn engine() -> PricingEngine {
        PricingEngine::default()
    }

    #[test]
    fn anchor_salaries() {
        let e = engine();
        assert_eq!(e.calculate_salary(Some(1), Form::Average, 100), 12_500);
        assert_eq!(e.calculate_salary(Some(300), Form::Average, 100), 5_000);
        assert_eq!(e.calculate_salary(Some(1_000), Form::Average, 100), 5_000);
        assert_eq!(e.calculate_salary(None, Form::Average, 100), 5_000);
    }

    #[test]
    fn factor_curve_anchors_and_interpolation() {
        assert_eq!(ranking_factor(Some(1)), Decimal::ONE);
        assert_eq!(ranking_factor(Some(10)), Decimal::new(75, 2));
        assert_eq!(ranking_factor(Some(300)), Decimal::ZERO);
        assert_eq!(ranking_factor(None), Decimal::ZERO);
        assert_eq!(ranking_factor(Some(0)), Decimal::ZERO);
        // Halfway between 50 (0.35) and 100 (0.22).
        assert_eq!(ranking_factor(Some(75)), Decimal::new(285, 3));
    }

    #[test]
    fn field_size_tiers() {
        assert_eq!(field_size_multiplier(20), Decimal::new(115, 2));
        assert_eq!(field_size_multiplier(50), Decimal::new(110, 2));
        assert_eq!(field_size_multiplier(100), Decimal::ONE);
        assert_eq!(field_size_multiplier(156), Decimal::new(95, 2));
        assert!(field_size_multiplier(30) > field_size_multiplier(150));
    }

    #[test]
    fn snapping() {
        assert_eq!(snap_to_clean(8_705), 8_700);
        assert_eq!(snap_to_clean(8_712), 8_700);
        assert_eq!(snap_to_clean(8_725), 8_750); // tie goes up
        assert_eq!(snap_to_clean(8_744), 8_750);
        assert_eq!(snap_to_clean(8_784), 8_780);
        assert_eq!(snap_to_clean(8_796), 8_800);
        assert_eq!(snap_to_clean(8_790), 8_790);

        assert_eq!(snap_down_to_clean(8_749), 8_700);
        assert_eq!(snap_down_to_clean(8_799), 8_790);
        assert_eq!(snap_down_to_clean(8_800), 8_800);
        assert!(is_clean(12_500));
        assert!(!is_clean(12_510));
    }

    #[test]
    fn form_extremes_stay_clamped() {
        let e = engine();
        assert_eq!(e.calculate_salary(Some(1), Form::Hot, 20), 12_500);
        assert_eq!(e.calculate_salary(Some(400), Form::Cold, 156), 5_000);
    }

    #[test]
    fn monotonic_bounded_and_clean() {
        let e = engine();
        for form in FORMS {
            for field_size in [20, 45, 70, 100, 156] {
                let mut previous = Salary::MAX;
                for rank in 1..=450 {
                    let s = e.calculate_salary(Some(rank), form, field_size);
                    assert!(
                        s <= previous,
                        "rank {rank} {form} field {field_size}: {s} > {previous}"
                    );
                    assert!((5_000..=12_500).contains(&s));
                    assert!(is_clean(s), "{s} is not clean");
                    previous = s;
                }
                assert!(e.calculate_salary(None, form, field_size) <= previous);
            }
        }
    }

    #[test]
    fn random_pairs_are_monotonic() {
        let e = engine();
        let mut rng = rand::thread_rng();
        for _ in 0..2_000 {
            let a: u32 = rng.gen_range(1..=500);
            let b: u32 = rng.gen_range(1..=500);
            let (better, worse) = if a <= b { (a, b) } else { (b, a) };
            let form = FORMS[rng.gen_range(0..FORMS.len())];
            let field = rng.gen_range(10..=200);
            assert!(
                e.calculate_salary(Some(better), form, field)
                    >= e.calculate_salary(Some(worse), form, field)
            );
        }
    }

    #[test]
    fn realistic_field_needs_no_scaling() {
        let e = engine();
        let mut players: Vec<Player> = (1..=150).map(|r| Player::dummy(Some(r * 2))).collect();
        players.push(Player::dummy(None));
        let report = e.calculate_all_salaries(&players, 151).unwrap();
        assert!(!report.needs_scaling);
        assert_eq!(report.stats.count, 151);
        assert_eq!(report.stats.min, 5_000);
        assert_eq!(report.stats.cheapest_lineup_sum, 30_000);
        assert!(report.stats.target_reachable);
    }

    #[test]
    fn expensive_field_is_rescaled_under_target() {
        // Rank 32 prices to 8,700; six of them cost 52,200 = 87% of 60,000.
        let e = engine();
        let mut players: Vec<Player> = (0..6).map(|_| Player::dummy(Some(32))).collect();
        players.push(Player::dummy(Some(1)));
        players.push(Player::dummy(Some(10)));
        assert_eq!(e.calculate_salary(Some(32), Form::Average, 100), 8_700);

        let report = e.calculate_all_salaries(&players, 100).unwrap();
        assert!(report.needs_scaling);
        assert_eq!(report.stats.unscaled_cheapest_lineup_sum, 52_200);
        assert_eq!(report.stats.cheapest_lineup_target, 51_000);
        assert!(report.stats.cheapest_lineup_sum <= 51_000);
        assert!(report.stats.target_reachable);
        for salary in report.salaries.values() {
            assert!(is_clean(*salary), "{salary}");
            assert!((5_000..=12_500).contains(salary));
        }
        assert_eq!(report.salaries[&players[0].id], 8_500);
        assert_eq!(report.salaries[&players[6].id], 12_200);
    }

    #[test]
    fn unreachable_target_is_reported() {
        let config = PricingConfig {
            salary_cap: 30_000,
            ..PricingConfig::default()
        };
        let e = PricingEngine::new(config);
        let players: Vec<Player> = (0..6).map(|_| Player::dummy(Some(300))).collect();
        let report = e.calculate_all_salaries(&players, 100).unwrap();
        assert!(report.needs_scaling);
        assert!(!report.stats.target_reachable);
        assert!(report.salaries.values().all(|s| *s == 5_000));
    }

    #[test]
    fn small_field_skips_cross_check() {
        let e = engine();
        let players: Vec<Player> = (0..3).map(|_| Player::dummy(Some(1))).collect();
        let report = e.calculate_all_salaries(&players, 3).unwrap();
        assert!(!report.needs_scaling);
    }

    #[test]
    fn rank_zero_rejected() {
        let e = engine();
        let players = vec![Player::dummy(Some(0))];
        let err = e.calculate_all_salaries(&players, 100).unwrap_err();
        assert!(matches!(err, FairwayError::InvalidRanking { ranking: 0, .. }));
    }

    #[test]
    fn apply_report_sets_cached_salary() {
        let e = engine();
        let mut players = vec![Player::dummy(Some(1)), Player::dummy(Some(300))];
        let report = e.calculate_all_salaries(&players, 100).unwrap();
        apply_report(&mut players, &report);
        assert_eq!(players[0].salary, Some(12_500));
        assert_eq!(players[1].salary, Some(5_000));
    }
}
