//! Configuration types for the Fairway contest core.
//!
//! Every value has a default matching current business rules; a deployment
//! overrides them with a JSON document.

use std::{collections::BTreeMap, path::Path};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ContestFormat, FairwayError, Result, Round, constants};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FairwayConfig {
    pub registration: RegistrationPolicy,
    pub pricing: PricingConfig,
    pub lineup: LineupRules,
    pub matchmaking: RetryPolicy,
    pub ledger: LedgerConfig,
}

impl FairwayConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.registration.validate()?;
        self.pricing.validate()?;
        self.lineup.validate()?;
        self.matchmaking.validate()?;
        if self.ledger.max_apply_attempts == 0 {
            return Err(FairwayError::Configuration(
                "ledger.max_apply_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Which round gates registration for each format, and by how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationPolicy {
    /// Registration closes this many minutes before the gating round starts.
    pub buffer_minutes: i64,
    /// Format → gating round. Formats not listed gate on the first round.
    pub gating_rounds: BTreeMap<ContestFormat, Round>,
}

impl RegistrationPolicy {
    /// The round whose start gates registration for `format`.
    #[must_use]
    pub fn gating_round(&self, format: ContestFormat) -> Round {
        self.gating_rounds
            .get(&format)
            .copied()
            .unwrap_or(Round::First)
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_minutes < 0 {
            return Err(FairwayError::Configuration(format!(
                "registration.buffer_minutes must be >= 0, got {}",
                self.buffer_minutes
            )));
        }
        Ok(())
    }
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            buffer_minutes: constants::REGISTRATION_BUFFER_MINUTES,
            gating_rounds: BTreeMap::from([
                (ContestFormat::Standard, Round::First),
                (ContestFormat::HeadToHead, Round::First),
            ]),
        }
    }
}

/// Salary curve bounds and the cheapest-lineup cross-check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub min_salary: i64,
    pub max_salary: i64,
    pub salary_cap: i64,
    pub roster_size: usize,
    /// The cheapest `roster_size` salaries may sum to at most this share of the cap.
    pub cheapest_lineup_fraction: Decimal,
}

impl PricingConfig {
    fn validate(&self) -> Result<()> {
        if self.min_salary <= 0 || self.min_salary >= self.max_salary {
            return Err(FairwayError::Configuration(format!(
                "pricing salary bounds invalid: min {} max {}",
                self.min_salary, self.max_salary
            )));
        }
        if self.min_salary % 100 != 0 || self.max_salary % 100 != 0 {
            return Err(FairwayError::Configuration(
                "pricing salary bounds must be multiples of 100".into(),
            ));
        }
        if self.roster_size == 0 {
            return Err(FairwayError::Configuration(
                "pricing.roster_size must be > 0".into(),
            ));
        }
        if self.cheapest_lineup_fraction <= Decimal::ZERO
            || self.cheapest_lineup_fraction > Decimal::ONE
        {
            return Err(FairwayError::Configuration(format!(
                "pricing.cheapest_lineup_fraction must be in (0, 1], got {}",
                self.cheapest_lineup_fraction
            )));
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_salary: constants::MIN_SALARY,
            max_salary: constants::MAX_SALARY,
            salary_cap: constants::DEFAULT_SALARY_CAP,
            roster_size: constants::ROSTER_SIZE,
            cheapest_lineup_fraction: Decimal::new(constants::CHEAPEST_LINEUP_CAP_PERCENT, 2),
        }
    }
}

/// Lineup shape and cap rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineupRules {
    pub roster_size: usize,
    pub salary_cap: i64,
    /// No single pick may exceed `salary_cap × max_player_fraction`.
    pub max_player_fraction: Decimal,
    pub tight_budget_threshold: i64,
    pub unused_budget_threshold: i64,
}

impl LineupRules {
    /// The same rules against a different cap (contests carry their own).
    #[must_use]
    pub fn with_cap(&self, salary_cap: i64) -> Self {
        Self {
            salary_cap,
            ..self.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.salary_cap <= 0 || self.roster_size == 0 {
            return Err(FairwayError::Configuration(
                "lineup cap and roster size must be positive".into(),
            ));
        }
        if self.max_player_fraction <= Decimal::ZERO || self.max_player_fraction > Decimal::ONE {
            return Err(FairwayError::Configuration(format!(
                "lineup.max_player_fraction must be in (0, 1], got {}",
                self.max_player_fraction
            )));
        }
        Ok(())
    }
}

impl Default for LineupRules {
    fn default() -> Self {
        Self {
            roster_size: constants::ROSTER_SIZE,
            salary_cap: constants::DEFAULT_SALARY_CAP,
            max_player_fraction: Decimal::new(constants::MAX_PLAYER_CAP_PERCENT, 2),
            tight_budget_threshold: constants::TIGHT_BUDGET_THRESHOLD,
            unused_budget_threshold: constants::UNUSED_BUDGET_THRESHOLD,
        }
    }
}

/// Bounded retry for optimistic allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_micros: u64,
    pub max_backoff_micros: u64,
}

impl RetryPolicy {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(FairwayError::Configuration(
                "matchmaking.max_attempts must be > 0".into(),
            ));
        }
        if self.base_backoff_micros > self.max_backoff_micros {
            return Err(FairwayError::Configuration(
                "matchmaking base backoff exceeds max backoff".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_ALLOCATION_ATTEMPTS,
            base_backoff_micros: constants::DEFAULT_BASE_BACKOFF_MICROS,
            max_backoff_micros: constants::DEFAULT_MAX_BACKOFF_MICROS,
        }
    }
}

/// Ledger application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Attempts at the balance increment before leaving the row pending for
    /// reconciliation.
    pub max_apply_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_apply_attempts: constants::DEFAULT_LEDGER_APPLY_ATTEMPTS,
        }
    }
}
