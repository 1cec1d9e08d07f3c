use crate::error::EntryError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Share of a positive profit taken as commission.
pub const COMMISSION_RATE: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Date,
    Number,
}

/// The input buffers of the entry form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    InvestorName,
    PortfolioKey,
    SecondaryKey,
    StartDate,
    EndDate,
    InitialValue,
    FinalValue,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::InvestorName,
        FormField::PortfolioKey,
        FormField::SecondaryKey,
        FormField::StartDate,
        FormField::EndDate,
        FormField::InitialValue,
        FormField::FinalValue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::InvestorName => "Investor Name",
            FormField::PortfolioKey => "Portfolio Key",
            FormField::SecondaryKey => "Secondary Key",
            FormField::StartDate => "Start Date",
            FormField::EndDate => "End Date",
            FormField::InitialValue => "Initial Value ($)",
            FormField::FinalValue => "Final Value ($)",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FormField::StartDate | FormField::EndDate => FieldKind::Date,
            FormField::InitialValue | FormField::FinalValue => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            FormField::InvestorName
                | FormField::PortfolioKey
                | FormField::InitialValue
                | FormField::FinalValue
        )
    }

    /// Whether a typed character may go into this field.
    pub fn accepts(self, c: char) -> bool {
        match self.kind() {
            FieldKind::Text => !c.is_control(),
            FieldKind::Date => c.is_ascii_digit() || c == '-',
            FieldKind::Number => c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FormField::InitialValue => "Initial Value",
            FormField::FinalValue => "Final Value",
            other => other.label(),
        };
        f.write_str(label)
    }
}

/// Raw, unvalidated form input. Everything is kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryForm {
    #[serde(deserialize_with = "lenient_string")]
    pub investor_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub portfolio_key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub secondary_key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub initial_value: String,
    #[serde(deserialize_with = "lenient_string")]
    pub final_value: String,
}

// Batch files may carry amounts as JSON numbers, or null for blanks.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

impl EntryForm {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::InvestorName => &self.investor_name,
            FormField::PortfolioKey => &self.portfolio_key,
            FormField::SecondaryKey => &self.secondary_key,
            FormField::StartDate => &self.start_date,
            FormField::EndDate => &self.end_date,
            FormField::InitialValue => &self.initial_value,
            FormField::FinalValue => &self.final_value,
        }
    }

    pub fn get_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::InvestorName => &mut self.investor_name,
            FormField::PortfolioKey => &mut self.portfolio_key,
            FormField::SecondaryKey => &mut self.secondary_key,
            FormField::StartDate => &mut self.start_date,
            FormField::EndDate => &mut self.end_date,
            FormField::InitialValue => &mut self.initial_value,
            FormField::FinalValue => &mut self.final_value,
        }
    }

    /// First required field that is still empty, in form order.
    pub fn first_missing(&self) -> Option<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|f| f.is_required())
            .find(|f| self.get(*f).is_empty())
    }

    /// Metrics the current input would produce, if both values are filled in.
    pub fn preview(&self) -> Option<Metrics> {
        if self.initial_value.is_empty() || self.final_value.is_empty() {
            return None;
        }
        Some(Metrics::compute(
            parse_lenient(&self.initial_value),
            parse_lenient(&self.final_value),
        ))
    }

    pub fn clear(&mut self) {
        *self = EntryForm::default();
    }
}

/// Parses the longest numeric prefix of `input`, skipping leading whitespace.
///
/// Yields `NaN` when there is no numeric prefix at all, so bad input
/// flows through into the derived metrics instead of being rejected.
pub fn parse_lenient(input: &str) -> f64 {
    let s = input.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let candidate = numeric_prefix(rest);
    for len in (1..=candidate.len()).rev() {
        if let Ok(value) = candidate[..len].parse::<f64>() {
            return sign * value;
        }
    }
    f64::NAN
}

fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let b = bytes[end];
        let exponent_sign =
            (b == b'+' || b == b'-') && end > 0 && matches!(bytes[end - 1], b'e' | b'E');
        if !(b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E' || exponent_sign) {
            break;
        }
        end += 1;
    }
    &s[..end]
}

/// Derived figures for a value pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub performance: f64,
    pub profit: f64,
    pub commission: f64,
}

impl Metrics {
    pub fn compute(initial: f64, final_value: f64) -> Metrics {
        let profit = final_value - initial;
        let performance = (final_value - initial) / initial * 100.0;
        // NaN > 0.0 is false, so a NaN profit also carries no commission
        let commission = if profit > 0.0 {
            profit * COMMISSION_RATE
        } else {
            0.0
        };
        Metrics {
            performance,
            profit,
            commission,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub fn new(raw: u64) -> Self {
        EntryId(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// One recorded investment observation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    id: EntryId,
    recorded_on: NaiveDate,
    investor_name: String,
    portfolio_key: String,
    secondary_key: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    initial_value: f64,
    final_value: f64,
    performance: f64,
    profit: f64,
    commission: f64,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl Entry {
    /// Builds an entry from the form, or rejects it when a required field is empty.
    pub fn build(
        form: &EntryForm,
        id: EntryId,
        recorded_on: NaiveDate,
    ) -> Result<Entry, EntryError> {
        if let Some(field) = form.first_missing() {
            return Err(EntryError::MissingField(field));
        }

        let initial_value = parse_lenient(&form.initial_value);
        let final_value = parse_lenient(&form.final_value);
        let metrics = Metrics::compute(initial_value, final_value);

        Ok(Entry {
            id,
            recorded_on,
            investor_name: form.investor_name.clone(),
            portfolio_key: form.portfolio_key.clone(),
            secondary_key: non_empty(&form.secondary_key),
            start_date: non_empty(&form.start_date),
            end_date: non_empty(&form.end_date),
            initial_value,
            final_value,
            performance: metrics.performance,
            profit: metrics.profit,
            commission: metrics.commission,
        })
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn recorded_on(&self) -> NaiveDate {
        self.recorded_on
    }

    pub fn investor_name(&self) -> &str {
        &self.investor_name
    }

    pub fn portfolio_key(&self) -> &str {
        &self.portfolio_key
    }

    pub fn secondary_key(&self) -> Option<&str> {
        self.secondary_key.as_deref()
    }

    /// Portfolio key, followed by the secondary key when there is one.
    pub fn portfolio_label(&self) -> String {
        match self.secondary_key() {
            Some(secondary) => format!("{} / {secondary}", self.portfolio_key),
            None => self.portfolio_key.clone(),
        }
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    pub fn final_value(&self) -> f64 {
        self.final_value
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    /// End date if present, else start date, else the empty string.
    pub fn group_key(&self) -> &str {
        self.end_date()
            .or_else(|| self.start_date())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn form(investor: &str, key: &str, initial: &str, final_value: &str) -> EntryForm {
    EntryForm {
        investor_name: investor.to_string(),
        portfolio_key: key.to_string(),
        initial_value: initial.to_string(),
        final_value: final_value.to_string(),
        ..EntryForm::default()
    }
}
