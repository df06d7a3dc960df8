use super::normalizer::{clean_identity_number, clean_phone_number};

/// Display form of a RUT as typed so far: `12.345.678-5`.
///
/// A single `-` directly before the check character is read as the
/// separator. Input with hyphens anywhere else is returned cleaned but
/// ungrouped, so re-formatting any output is a no-op. The check character
/// keeps the case it was typed with; uppercasing belongs to
/// [`Rut`](super::validation::Rut)'s canonical form.
pub fn format_identity_number(raw: &str) -> String {
    let cleaned = clean_identity_number(raw);
    if cleaned.chars().count() < 2 {
        return cleaned;
    }

    match split_identity(&cleaned) {
        Some((body, check))
            if !body.is_empty() && !body.contains('-') && check != '-' =>
        {
            format!("{}-{}", group_thousands(body), check)
        }
        _ => cleaned,
    }
}

/// Split cleaned RUT text into body and check character, dropping one
/// separator hyphen in front of the check character. The body is returned
/// as-is and may still hold stray hyphens.
pub(crate) fn split_identity(cleaned: &str) -> Option<(&str, char)> {
    let mut chars = cleaned.chars();
    let check = chars.next_back()?;
    let rest = chars.as_str();
    Some((rest.strip_suffix('-').unwrap_or(rest), check))
}

pub fn format_phone_number(raw: &str) -> String {
    clean_phone_number(raw)
}

pub(crate) fn group_thousands(body: &str) -> String {
    let len = body.chars().count();
    let mut grouped = String::with_capacity(len + len / 3);
    for (idx, ch) in body.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_rut_with_thousands_groups() {
        assert_eq!(format_identity_number("123456785"), "12.345.678-5");
        assert_eq!(format_identity_number("12345678-5"), "12.345.678-5");
        assert_eq!(format_identity_number("7654321k"), "7.654.321-k");
        assert_eq!(format_identity_number("1009"), "100-9");
        assert_eq!(format_identity_number("19"), "1-9");
    }

    #[test]
    fn short_input_is_returned_cleaned() {
        assert_eq!(format_identity_number(""), "");
        assert_eq!(format_identity_number("5"), "5");
        assert_eq!(format_identity_number("x5y"), "5");
        assert_eq!(format_identity_number("-5"), "-5");
    }

    #[test]
    fn misplaced_hyphens_are_not_grouped() {
        assert_eq!(format_identity_number("1-2-3-6"), "1-2-3-6");
        assert_eq!(format_identity_number("12-345678-5"), "12-345678-5");
        assert_eq!(format_identity_number("12345678-"), "12345678-");
        assert_eq!(format_identity_number("12345678--5"), "12345678--5");
    }

    #[test]
    fn rut_formatting_is_idempotent() {
        let samples = [
            "123456785",
            "12.345.678-5",
            "1-2-3-4",
            "--",
            "-5",
            "k",
            "kk",
            "1k23-4",
            "99.999.999-9",
            "abc",
            "  76.086.428-K ",
        ];
        for raw in samples {
            let once = format_identity_number(raw);
            assert_eq!(format_identity_number(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn phone_format_is_clean_digits() {
        assert_eq!(format_phone_number("9 8592 3283"), "985923283");
        assert_eq!(format_phone_number(""), "");
        assert_eq!(format_phone_number(&format_phone_number("+56 9")), "569");
    }

    #[test]
    fn groups_from_the_right() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1.234");
        assert_eq!(group_thousands("12345678"), "12.345.678");
    }

    proptest! {
        #[test]
        fn rut_formatting_is_idempotent_for_any_text(raw in any::<String>()) {
            let once = format_identity_number(&raw);
            prop_assert_eq!(format_identity_number(&once), once);
        }

        #[test]
        fn rut_formatting_is_idempotent_for_rut_like_text(raw in "[0-9kK.\\- ]{0,16}") {
            let once = format_identity_number(&raw);
            prop_assert_eq!(format_identity_number(&once), once);
        }

        #[test]
        fn grouped_body_keeps_its_digits(body in "[1-9][0-9]{0,7}", check in "[0-9kK]") {
            let formatted = format_identity_number(&format!("{body}{check}"));
            let (grouped, tail) = formatted.rsplit_once('-').expect("separator present");
            prop_assert_eq!(tail, check.as_str());
            prop_assert_eq!(grouped.replace('.', ""), body);
        }

        #[test]
        fn phone_formatting_is_idempotent(raw in any::<String>()) {
            let once = format_phone_number(&raw);
            prop_assert_eq!(format_phone_number(&once), once);
        }
    }
}
