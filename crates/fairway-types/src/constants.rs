//! System-wide constants for the Fairway contest core.

/// Minutes between the gating round's first tee time and registration close.
pub const REGISTRATION_BUFFER_MINUTES: i64 = 15;

/// Picks per entry for every observed format.
pub const ROSTER_SIZE: usize = 6;

/// Players per head-to-head slot.
pub const HEAD_TO_HEAD_SEATS: u8 = 2;

/// Cheapest possible salary, in salary units.
pub const MIN_SALARY: i64 = 5_000;

/// Most expensive possible salary, in salary units.
pub const MAX_SALARY: i64 = 12_500;

/// Default lineup salary cap.
pub const DEFAULT_SALARY_CAP: i64 = 60_000;

/// Largest share of the cap a single pick may take, in percent.
pub const MAX_PLAYER_CAP_PERCENT: i64 = 30;

/// The cheapest full lineup may spend at most this share of the cap, in percent.
pub const CHEAPEST_LINEUP_CAP_PERCENT: i64 = 85;

/// Allowed last-two-digit remainders of a computed salary.
pub const PERMITTED_SALARY_REMAINDERS: [i64; 6] = [0, 50, 60, 70, 80, 90];

/// Remaining budget below which a lineup gets a "tight budget" warning.
pub const TIGHT_BUDGET_THRESHOLD: i64 = 500;

/// Remaining budget above which a lineup gets an "upgrade" suggestion.
pub const UNUSED_BUDGET_THRESHOLD: i64 = 5_000;

/// Default allocation attempts before surfacing a conflict.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 16;

/// Default base backoff between allocation attempts, in microseconds.
pub const DEFAULT_BASE_BACKOFF_MICROS: u64 = 50;

/// Default backoff ceiling, in microseconds.
pub const DEFAULT_MAX_BACKOFF_MICROS: u64 = 5_000;

/// Default attempts for the balance half of a ledger application.
pub const DEFAULT_LEDGER_APPLY_ATTEMPTS: u32 = 3;

/// Provider tag used for internal balance adjustments.
pub const INTERNAL_PROVIDER: &str = "internal";

/// Provider tag used for head-to-head cancellation refunds.
pub const H2H_REFUND_PROVIDER: &str = "h2h-refund";
