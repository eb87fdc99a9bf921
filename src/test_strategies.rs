#[cfg(test)]
pub mod strategies {
    use proptest::prelude::*;

    /// Arbitrary log end offset; zero (an empty partition) is common enough
    /// to deserve its own weight
    pub fn arb_log_end() -> impl Strategy<Value = i64> {
        prop_oneof![
            1 => Just(0i64),
            4 => 1..1_000_000i64,
        ]
    }

    /// (log_end, committed) pair; committed may be absent, and may exceed
    /// log_end (consumer past a truncated log end)
    pub fn arb_log_end_and_committed() -> impl Strategy<Value = (i64, Option<i64>)> {
        (arb_log_end(), proptest::option::of(0..1_100_000i64))
    }

    /// Arbitrary non-empty group ID
    pub fn arb_group_id() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9._-]{0,48}"
    }
}
