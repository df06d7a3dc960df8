/// Keep the characters a RUT can be typed with: digits, the `K` check
/// character in either case, and the `-` separator.
pub fn clean_identity_number(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(ch, 'k' | 'K' | '-'))
        .collect()
}

pub fn clean_phone_number(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

const ZERO_WIDTH: [char; 2] = ['\u{feff}', '\u{200b}'];

/// Address text as handed to the availability gateway.
pub fn normalize_address(raw: &str) -> String {
    let cleaned = raw.replace(ZERO_WIDTH, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length of the address as typed, in characters. Invisible zero-width
/// characters do not count; whitespace does.
pub fn address_length(raw: &str) -> usize {
    raw.chars().filter(|ch| !ZERO_WIDTH.contains(ch)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_cleaning_keeps_digits_k_and_hyphen() {
        assert_eq!(clean_identity_number("12.345.678-k"), "12345678-k");
        assert_eq!(clean_identity_number(" 7a6b5K "), "765K");
        assert_eq!(clean_identity_number("RUT: 9.876.543-2"), "9876543-2");
        assert_eq!(clean_identity_number(""), "");
    }

    #[test]
    fn identity_cleaning_is_idempotent() {
        for raw in ["12.345.678-5", "abc-xyz", "--kK--", "1 2 3", "ñ9-8"] {
            let once = clean_identity_number(raw);
            assert_eq!(clean_identity_number(&once), once);
            assert!(once
                .chars()
                .all(|ch| ch.is_ascii_digit() || matches!(ch, 'k' | 'K' | '-')));
        }
    }

    #[test]
    fn phone_cleaning_keeps_only_digits() {
        assert_eq!(clean_phone_number("+56 9 1234 5678"), "56912345678");
        assert_eq!(clean_phone_number("(9) 8592-3283"), "985923283");
        assert_eq!(clean_phone_number("sin número"), "");
        let once = clean_phone_number("9-1-2");
        assert_eq!(clean_phone_number(&once), once);
    }

    #[test]
    fn address_normalization_collapses_whitespace() {
        assert_eq!(
            normalize_address("  Av. Hernando   de\tAguirre\u{200b} 1133 "),
            "Av. Hernando de Aguirre 1133"
        );
    }

    #[test]
    fn address_length_counts_typed_characters() {
        assert_eq!(address_length("Calle  1234"), 11);
        assert_eq!(address_length("\u{feff}Calle 1234\u{200b}"), 10);
        assert_eq!(address_length("Ñuñoa 1234"), 10);
    }

    proptest! {
        #[test]
        fn identity_cleaning_is_idempotent_for_any_text(raw in any::<String>()) {
            let once = clean_identity_number(&raw);
            prop_assert_eq!(clean_identity_number(&once), once.clone());
            prop_assert!(once
                .chars()
                .all(|ch| ch.is_ascii_digit() || matches!(ch, 'k' | 'K' | '-')));
        }

        #[test]
        fn phone_cleaning_is_idempotent_for_any_text(raw in any::<String>()) {
            let once = clean_phone_number(&raw);
            prop_assert_eq!(clean_phone_number(&once), once.clone());
            prop_assert!(once.chars().all(|ch| ch.is_ascii_digit()));
        }

        #[test]
        fn cleaning_preserves_order(raw in "[0-9kK.\\- a-z]{0,24}") {
            let expected: String = raw
                .chars()
                .filter(|ch| ch.is_ascii_digit() || matches!(ch, 'k' | 'K' | '-'))
                .collect();
            prop_assert_eq!(clean_identity_number(&raw), expected);
        }
    }
}
