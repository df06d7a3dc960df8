use std::fmt;

use serde::{Deserialize, Serialize};

use super::format::{group_thousands, split_identity};
use super::normalizer::{clean_identity_number, clean_phone_number};

/// Smallest RUT body accepted by the check.
pub const RUT_BODY_MIN: u32 = 1;
/// Largest RUT body accepted by the check.
pub const RUT_BODY_MAX: u32 = 99_999_999;
/// Number of digits in a Chilean mobile number without the country code.
pub const MOBILE_NUMBER_LEN: usize = 9;
/// Leading digit shared by every Chilean mobile number.
pub const MOBILE_PREFIX: char = '9';

/// Reason a field failed validation. The `Display` text is surfaced verbatim
/// to the person filling in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    #[error("invalid identifier")]
    MalformedIdentifier,
    #[error("identifier must contain only numbers")]
    NonNumericBody,
    #[error("identifier out of valid range")]
    BodyOutOfRange,
    #[error("incorrect check digit")]
    IncorrectCheckDigit,
    #[error("phone number must have 9 digits")]
    PhoneLength,
    #[error("mobile phone must start with 9")]
    MissingMobilePrefix,
}

impl InvalidReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedIdentifier => "malformed_identifier",
            Self::NonNumericBody => "non_numeric_body",
            Self::BodyOutOfRange => "body_out_of_range",
            Self::IncorrectCheckDigit => "incorrect_check_digit",
            Self::PhoneLength => "phone_length",
            Self::MissingMobilePrefix => "missing_mobile_prefix",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(InvalidReason),
}

impl ValidationResult {
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub const fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(*reason),
        }
    }

    pub fn view(&self) -> ValidationView {
        ValidationView {
            valid: self.is_valid(),
            code: self.reason().map(InvalidReason::code),
            message: self.reason().map(|reason| reason.to_string()),
        }
    }
}

impl<T> From<Result<T, InvalidReason>> for ValidationResult {
    fn from(value: Result<T, InvalidReason>) -> Self {
        match value {
            Ok(_) => Self::Valid,
            Err(reason) => Self::Invalid(reason),
        }
    }
}

/// Serializable shape of a [`ValidationResult`] for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationView {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A RUT whose body is in range and whose check character matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rut {
    body: u32,
    check: char,
}

impl Rut {
    pub fn parse(raw: &str) -> Result<Self, InvalidReason> {
        let cleaned = clean_identity_number(raw);
        if cleaned.chars().count() < 2 {
            return Err(InvalidReason::MalformedIdentifier);
        }

        let (digits, check) =
            split_identity(&cleaned).ok_or(InvalidReason::MalformedIdentifier)?;
        let check = check.to_ascii_uppercase();

        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(InvalidReason::NonNumericBody);
        }

        // Overlong bodies fail to parse and are out of range all the same.
        let body = digits
            .parse::<u64>()
            .ok()
            .filter(|value| (u64::from(RUT_BODY_MIN)..=u64::from(RUT_BODY_MAX)).contains(value))
            .and_then(|value| u32::try_from(value).ok())
            .ok_or(InvalidReason::BodyOutOfRange)?;

        if check != Self::check_character(body) {
            return Err(InvalidReason::IncorrectCheckDigit);
        }

        Ok(Self { body, check })
    }

    /// Modulus-11 check character for a RUT body.
    ///
    /// Digits are weighted 2 through 7 cyclically starting from the least
    /// significant one; `11 - sum % 11` maps 11 to `0` and 10 to `K`.
    pub fn check_character(body: u32) -> char {
        let mut sum = 0u32;
        let mut weight = 2u32;
        let mut rest = body;
        while rest > 0 {
            sum += (rest % 10) * weight;
            rest /= 10;
            weight = if weight == 7 { 2 } else { weight + 1 };
        }

        match 11 - (sum % 11) {
            11 => '0',
            10 => 'K',
            digit => char::from(b'0' + digit as u8),
        }
    }

    pub fn body(&self) -> u32 {
        self.body
    }

    pub fn check(&self) -> char {
        self.check
    }

    /// Compact form without separators, e.g. `12345678-5`.
    pub fn compact(&self) -> String {
        format!("{}-{}", self.body, self.check)
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", group_thousands(&self.body.to_string()), self.check)
    }
}

/// A nine digit mobile number starting with `9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MobileNumber(String);

impl MobileNumber {
    pub fn parse(raw: &str) -> Result<Self, InvalidReason> {
        let digits = clean_phone_number(raw);
        if digits.len() != MOBILE_NUMBER_LEN {
            return Err(InvalidReason::PhoneLength);
        }
        if !digits.starts_with(MOBILE_PREFIX) {
            return Err(InvalidReason::MissingMobilePrefix);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_identity_number(raw: &str) -> ValidationResult {
    Rut::parse(raw).into()
}

pub fn validate_phone_number(raw: &str) -> ValidationResult {
    MobileNumber::parse(raw).into()
}
