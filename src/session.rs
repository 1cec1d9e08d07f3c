use crate::aggregate::{aggregate, totals, AggregatePoint, Totals};
use crate::entry::{Entry, EntryForm, EntryId};
use crate::error::EntryError;
use chrono::NaiveDate;

/// Owns the entry list and the form being filled in.
///
/// The list is append-only; the only way in is [`Session::submit`].
#[derive(Debug)]
pub struct Session {
    entries: Vec<Entry>,
    form: EntryForm,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            entries: Vec::new(),
            form: EntryForm::default(),
            next_id: 1,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntryForm {
        &mut self.form
    }

    /// Turns the current form into an entry and clears the form.
    ///
    /// On rejection neither the list nor the form is touched.
    pub fn submit(&mut self, today: NaiveDate) -> Result<&Entry, EntryError> {
        let entry = Entry::build(&self.form, EntryId::new(self.next_id), today)?;
        tracing::debug!(
            id = entry.id().get(),
            investor = entry.investor_name(),
            performance = entry.performance(),
            "entry recorded"
        );
        self.next_id += 1;
        self.form.clear();
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Replaces the form wholesale and submits it.
    pub fn submit_form(
        &mut self,
        form: EntryForm,
        today: NaiveDate,
    ) -> Result<&Entry, EntryError> {
        let previous = std::mem::replace(&mut self.form, form);
        if let Err(e) = self.submit(today) {
            self.form = previous;
            return Err(e);
        }
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn aggregates(&self) -> Vec<AggregatePoint> {
        aggregate(&self.entries)
    }

    pub fn totals(&self) -> Totals {
        totals(&self.entries)
    }
}
