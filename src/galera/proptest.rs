//! Property-Based Tests for the Option Codecs
//!
//! # Test Properties
//!
//! 1. **Roundtrip**: unmarshal(marshal(k, v, quoted)) = (k, v, quoted)
//! 2. **Determinism**: provider options marshal identically regardless of
//!    insertion order
//! 3. **Set preservation**: unmarshal(marshal(opts)) = opts

#![cfg(test)]

use proptest::prelude::*;

use super::kv_option::{marshal, KvOption};
use super::provider_options::ProviderOptions;

// =============================================================================
// Property Strategies
// =============================================================================

/// Keys as used by MariaDB and the Galera provider
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.]{0,24}"
}

/// Values without quotes or delimiters, and without surrounding whitespace
fn value_strategy() -> impl Strategy<Value = String> {
    "([a-zA-Z0-9:/.=_-][a-zA-Z0-9:/.=_ -]{0,30}[a-zA-Z0-9:/.=_-])?"
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 1..12)
        .prop_map(|m| m.into_iter().collect())
}

// =============================================================================
// KvOption Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: quoting and value survive a round trip.
    #[test]
    fn prop_kv_option_roundtrip(
        key in key_strategy(),
        value in value_strategy(),
        quoted in any::<bool>(),
    ) {
        let text = marshal(&key, &value, quoted);
        let opt = KvOption::unmarshal(&text)?;

        prop_assert_eq!(opt, KvOption::new(key, value, quoted));
    }

    /// Property: re-marshalling a parsed option reproduces the text.
    #[test]
    fn prop_kv_option_text_is_stable(
        key in key_strategy(),
        value in value_strategy(),
        quoted in any::<bool>(),
    ) {
        let text = marshal(&key, &value, quoted);
        prop_assert_eq!(KvOption::unmarshal(&text)?.marshal(), text);
    }
}

// =============================================================================
// ProviderOptions Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: insertion order never changes the marshalled text.
    #[test]
    fn prop_provider_options_order_independent(
        entries in entries_strategy(),
        seed in any::<u64>(),
    ) {
        let forward: ProviderOptions = entries.iter().cloned().collect();

        let mut shuffled = entries.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();
        let backward: ProviderOptions = shuffled.into_iter().collect();

        prop_assert_eq!(forward.marshal(), backward.marshal());
    }

    /// Property: the key/value set survives a round trip.
    #[test]
    fn prop_provider_options_roundtrip(entries in entries_strategy()) {
        let opts: ProviderOptions = entries.into_iter().collect();
        let parsed = ProviderOptions::unmarshal(&opts.marshal())?;

        prop_assert_eq!(parsed, opts);
    }

    /// Property: marshalled keys are sorted.
    #[test]
    fn prop_provider_options_sorted(entries in entries_strategy()) {
        let opts: ProviderOptions = entries.into_iter().collect();
        let text = opts.marshal();
        let keys: Vec<&str> = text
            .split(';')
            .filter_map(|clause| clause.split_once('=').map(|(k, _)| k))
            .collect();

        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}
