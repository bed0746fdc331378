use proptest::prelude::*;

use lvote_types::{AmountError, Budget, NativeAmount, VoteOption, Weight};

proptest! {
    /// Every positive integer written as text parses back to itself.
    #[test]
    fn weight_accepts_positive_text(n in 1u64..u64::MAX) {
        let text = n.to_string();
        let weight = Weight::parse(text.as_str()).unwrap();
        prop_assert_eq!(weight.get(), n as u128);
    }

    /// Surrounding whitespace is ignored.
    #[test]
    fn weight_trims_whitespace(n in 1u32..u32::MAX, pad in 0usize..4) {
        let text = format!("{}{}{}", " ".repeat(pad), n, "\t".repeat(pad));
        prop_assert_eq!(Weight::parse(text.as_str()).unwrap().get(), n as u128);
    }

    /// Negative numbers are never a valid weight, as text or as integers.
    #[test]
    fn weight_rejects_negative(n in i64::MIN..=0i64) {
        prop_assert!(matches!(Weight::parse(n), Err(AmountError::NotPositive(_))));
        let text = n.to_string();
        prop_assert!(Weight::parse(text.as_str()).is_err());
    }

    /// Any string containing a non-digit (after trimming) is rejected.
    #[test]
    fn weight_rejects_letters(s in "[0-9]{0,4}[a-zA-Z.,_][0-9a-z]{0,4}") {
        prop_assert!(Weight::parse(s.as_str()).is_err());
    }

    /// Budget and weight share one parser.
    #[test]
    fn budget_matches_weight(s in "[ 0-9-]{0,12}") {
        let w = Weight::parse(s.as_str()).map(|w| w.get());
        let b = Budget::parse(s.as_str()).map(|b| b.get());
        prop_assert_eq!(w, b);
    }

    /// Decimal display round-trips through the decimal parser.
    #[test]
    fn native_display_roundtrip(raw in 0u128..10u128.pow(30)) {
        let amount = NativeAmount::from_base_units(raw);
        let reparsed = NativeAmount::parse_decimal(&amount.to_string()).unwrap();
        prop_assert_eq!(reparsed, amount);
    }

    /// Option positions always equal ledger order.
    #[test]
    fn option_positions_are_indices(names in prop::collection::vec("[A-Za-z]{1,6}", 0..12)) {
        let options = VoteOption::from_names(names.clone());
        prop_assert_eq!(options.len(), names.len());
        for (i, option) in options.iter().enumerate() {
            prop_assert_eq!(option.position, i);
            prop_assert_eq!(&option.name, &names[i]);
        }
    }
}
