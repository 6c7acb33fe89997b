//! Billing
//!
//! Details entered on the billing form. The till collects them for the
//! current sale only: nothing is validated against a registry and nothing is
//! persisted once the form is accepted.

/// Details entered on the billing form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BillingDetails {
    name: String,
    tax_id: String,
}

impl BillingDetails {
    /// Builds details from already-separated fields.
    #[must_use]
    pub fn new(name: impl Into<String>, tax_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: tax_id.into(),
        }
    }

    /// Parses a single prompt line of the shape `name ; tax id`.
    ///
    /// The separator and the tax id are optional. Both fields keep whatever
    /// the shopper typed, trimmed but otherwise unchecked.
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        let mut parts = line.splitn(2, ';');
        let name = parts.next().unwrap_or_default().trim();
        let tax_id = parts.next().unwrap_or_default().trim();

        Self::new(name, tax_id)
    }

    /// Customer name as typed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tax identifier as typed.
    #[must_use]
    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }
}
