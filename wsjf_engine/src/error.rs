use thiserror::Error;

/// Errors reported while validating engine inputs.
///
/// Once inputs are validated, no engine function can fail: an all-absent
/// dimension or a zero job size is a valid state, not an error.
#[derive(Eq, PartialEq, Debug, Clone, Error)]
pub enum EngineError {
    /// A sub-value outside the closed estimation scale. The field is the
    /// dotted path of the offending role, e.g. `business_value.dev_technical`.
    #[error("invalid value {value} for {field}: allowed values are 1, 2, 3, 5, 8, 13, 21")]
    InvalidValue { field: String, value: u8 },
}
