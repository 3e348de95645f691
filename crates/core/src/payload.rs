//! Core payload - the domain fields of a payment or revenue
//!
//! Payments and revenues go through the same workflow and differ only
//! in their domain fields. `CorePayload` is the closed union of the two;
//! everything downstream works against the `DomainFields` trait.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::amount::Amount;

/// Errors raised when validating a payload at registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Field '{0}' cannot be empty")]
    EmptyField(&'static str),

    #[error("Amount must be strictly positive, got {0}")]
    NonPositiveAmount(Amount),
}

/// Kind of treasury operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    Revenue,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "payment",
            TransactionKind::Revenue => "revenue",
        }
    }
}

/// Shared view over the domain fields of either kind
pub trait DomainFields {
    fn kind(&self) -> TransactionKind;

    fn amount(&self) -> Amount;

    /// Name of the beneficiary (payment) or taxpayer (revenue)
    fn full_name(&self) -> &str;

    /// The tamper-relevant fields, in a fixed order, as `(name, text)` pairs.
    ///
    /// Amounts are rendered scale-independently so that a value read back
    /// from storage with a different scale digests identically.
    fn canonical_fields(&self) -> Vec<(&'static str, String)>;

    /// Text fields that must be non-empty
    fn required_text(&self) -> Vec<(&'static str, &str)>;

    fn validate(&self) -> Result<(), PayloadError> {
        for (name, value) in self.required_text() {
            if value.trim().is_empty() {
                return Err(PayloadError::EmptyField(name));
            }
        }
        let amount = self.amount();
        if !amount.is_positive() {
            return Err(PayloadError::NonPositiveAmount(amount));
        }
        Ok(())
    }
}

/// Salary or supplier payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFields {
    /// Beneficiary registration code (matricule)
    pub beneficiary_code: String,
    pub full_name: String,
    pub bank_info: String,
    pub amount: Amount,
}

impl DomainFields for PaymentFields {
    fn kind(&self) -> TransactionKind {
        TransactionKind::Payment
    }

    fn amount(&self) -> Amount {
        self.amount
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn canonical_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("beneficiary_code", self.beneficiary_code.clone()),
            ("full_name", self.full_name.clone()),
            ("bank_info", self.bank_info.clone()),
            ("amount", self.amount.canonical()),
        ]
    }

    fn required_text(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("beneficiary_code", self.beneficiary_code.as_str()),
            ("full_name", self.full_name.as_str()),
            ("bank_info", self.bank_info.as_str()),
        ]
    }
}

/// Tax or service revenue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueFields {
    pub taxpayer_number: String,
    pub full_name: String,
    /// Tax or service type
    pub tax_type: String,
    pub amount: Amount,
}

impl DomainFields for RevenueFields {
    fn kind(&self) -> TransactionKind {
        TransactionKind::Revenue
    }

    fn amount(&self) -> Amount {
        self.amount
    }

    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn canonical_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("taxpayer_number", self.taxpayer_number.clone()),
            ("full_name", self.full_name.clone()),
            ("tax_type", self.tax_type.clone()),
            ("amount", self.amount.canonical()),
        ]
    }

    fn required_text(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("taxpayer_number", self.taxpayer_number.as_str()),
            ("full_name", self.full_name.as_str()),
            ("tax_type", self.tax_type.as_str()),
        ]
    }
}

/// Domain payload of a record, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorePayload {
    Payment(PaymentFields),
    Revenue(RevenueFields),
}

impl CorePayload {
    fn fields(&self) -> &dyn DomainFields {
        match self {
            CorePayload::Payment(p) => p,
            CorePayload::Revenue(r) => r,
        }
    }

    /// Mutable access to the amount (administrative corrections and tests)
    pub fn amount_mut(&mut self) -> &mut Amount {
        match self {
            CorePayload::Payment(p) => &mut p.amount,
            CorePayload::Revenue(r) => &mut r.amount,
        }
    }
}

impl DomainFields for CorePayload {
    fn kind(&self) -> TransactionKind {
        self.fields().kind()
    }

    fn amount(&self) -> Amount {
        self.fields().amount()
    }

    fn full_name(&self) -> &str {
        match self {
            CorePayload::Payment(p) => &p.full_name,
            CorePayload::Revenue(r) => &r.full_name,
        }
    }

    fn canonical_fields(&self) -> Vec<(&'static str, String)> {
        self.fields().canonical_fields()
    }

    fn required_text(&self) -> Vec<(&'static str, &str)> {
        match self {
            CorePayload::Payment(p) => p.required_text(),
            CorePayload::Revenue(r) => r.required_text(),
        }
    }
}

impl From<PaymentFields> for CorePayload {
    fn from(fields: PaymentFields) -> Self {
        CorePayload::Payment(fields)
    }
}

impl From<RevenueFields> for CorePayload {
    fn from(fields: RevenueFields) -> Self {
        CorePayload::Revenue(fields)
    }
}
