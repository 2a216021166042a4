//! The seeded library of historical halt windows (§3, §4.1). Engine-triggered halts (circuit
//! breakers) are created at runtime by the controls module and are not part of this catalog.

use crate::time::{instant, Halt, HaltScope};

/// Historical trading halts, in chronological order.
pub fn seed() -> Vec<Halt> {
    vec![
        // Black Monday, October 19 1987: NYSE specialists fell behind on order flow through the
        // afternoon; trading was effectively frozen into the next session's open.
        Halt::new(
            "black_monday_1987",
            instant(1987, 10, 19, 14, 30, 0),
            instant(1987, 10, 20, 10, 0, 0),
            HaltScope::Full,
        ),
        // Flash Crash, May 6 2010: a handful of names traded to a penny or to $100,000 within
        // minutes; exchanges broke the trades and halted the affected tickers only.
        Halt::new(
            "flash_crash_2010",
            instant(2010, 5, 6, 18, 47, 0),
            instant(2010, 5, 6, 19, 5, 0),
            HaltScope::Partial(vec!["ACN".into(), "PG".into()]),
        ),
        // Four market-wide circuit breakers tripped across four sessions in March 2020.
        Halt::new(
            "level1_circuit_breaker_2020_03_09",
            instant(2020, 3, 9, 14, 45, 0),
            instant(2020, 3, 9, 15, 0, 0),
            HaltScope::Full,
        ),
        Halt::new(
            "level1_circuit_breaker_2020_03_12",
            instant(2020, 3, 12, 14, 35, 0),
            instant(2020, 3, 12, 14, 50, 0),
            HaltScope::Full,
        ),
        Halt::new(
            "level1_circuit_breaker_2020_03_16",
            instant(2020, 3, 16, 13, 35, 0),
            instant(2020, 3, 16, 13, 50, 0),
            HaltScope::Full,
        ),
        Halt::new(
            "level1_circuit_breaker_2020_03_18",
            instant(2020, 3, 18, 13, 35, 0),
            instant(2020, 3, 18, 13, 50, 0),
            HaltScope::Full,
        ),
    ]
}
