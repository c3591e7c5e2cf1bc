//! Golfer model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Salary in salary units (the lineup cap is expressed in the same units).
pub type Salary = i64;

/// Recent-form bucket applied as a discrete salary multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Form {
    Hot,
    Good,
    #[default]
    Average,
    Poor,
    Cold,
}

impl Form {
    /// Salary multiplier for this form.
    #[must_use]
    pub fn multiplier(self) -> Decimal {
        match self {
            Self::Hot => Decimal::new(120, 2),
            Self::Good => Decimal::new(110, 2),
            Self::Average => Decimal::ONE,
            Self::Poor => Decimal::new(95, 2),
            Self::Cold => Decimal::new(90, 2),
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hot => write!(f, "hot"),
            Self::Good => write!(f, "good"),
            Self::Average => write!(f, "average"),
            Self::Poor => write!(f, "poor"),
            Self::Cold => write!(f, "cold"),
        }
    }
}

/// A golfer in a tournament field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// World ranking, lower is better. `None` means unranked.
    pub ranking: Option<u32>,
    #[serde(default)]
    pub form: Form,
    /// Last computed salary. Derived by the pricing engine; cache only.
    #[serde(default)]
    pub salary: Option<Salary>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl Player {
    /// An average-form player with the given ranking and no salary yet.
    #[must_use]
    pub fn dummy(ranking: Option<u32>) -> Self {
        Self {
            id: PlayerId::new(),
            name: format!(
                "Golfer #{}",
                ranking.map_or_else(|| "NR".to_string(), |r| r.to_string())
            ),
            ranking,
            form: Form::Average,
            salary: None,
        }
    }

    /// A player with a salary already set.
    #[must_use]
    pub fn dummy_priced(salary: Salary) -> Self {
        let mut p = Self::dummy(None);
        p.salary = Some(salary);
        p
    }

    /// A random field of `n` players with rankings in `1..=400` (about one in
    /// ten unranked) and random form.
    #[must_use]
    pub fn random_field(n: usize) -> Vec<Self> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let forms = [Form::Hot, Form::Good, Form::Average, Form::Poor, Form::Cold];
        (0..n)
            .map(|_| {
                let ranking = if rng.gen_ratio(1, 10) {
                    None
                } else {
                    Some(rng.gen_range(1..=400))
                };
                let mut p = Self::dummy(ranking);
                p.form = forms[rng.gen_range(0..forms.len())];
                p
            })
            .collect()
    }
}
