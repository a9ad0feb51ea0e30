//! Terminal implementation of the [`Presentation`] port.
//!
//! Messages are collected while a flow runs and written out once it
//! finishes, so the final output reflects the last clear-then-apply cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::domain::FormField;
use crate::domain::ports::Presentation;

/// Collects form messages and renders them as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolePresenter {
    field_errors: BTreeMap<FormField, String>,
    flagged: BTreeSet<FormField>,
    general: Option<String>,
    success: Option<String>,
}

impl ConsolePresenter {
    /// Presenter with nothing to show.
    pub fn new() -> Self {
        Self::default()
    }

    /// Message currently shown under `field`.
    pub fn field_error(&self, field: FormField) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }

    /// General message currently shown.
    pub fn general(&self) -> Option<&str> {
        self.general.as_deref()
    }

    /// Whether anything error-like is on screen.
    pub fn has_errors(&self) -> bool {
        self.general.is_some() || !self.field_errors.is_empty()
    }

    /// Write the collected messages to `out`.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(message) = &self.general {
            writeln!(out, "error: {message}")?;
        }
        for (field, message) in &self.field_errors {
            writeln!(out, "  {field}: {message}")?;
        }
        for field in self.flagged.iter().filter(|field| !self.field_errors.contains_key(field)) {
            writeln!(out, "  {field}: check this field")?;
        }
        if let Some(message) = &self.success {
            writeln!(out, "{message}")?;
        }
        Ok(())
    }
}

impl Presentation for ConsolePresenter {
    fn display_field_error(&mut self, field: FormField, message: &str) {
        self.field_errors.insert(field, message.to_owned());
    }

    fn clear_field_error(&mut self, field: FormField) {
        self.field_errors.remove(&field);
        self.flagged.remove(&field);
    }

    fn display_general(&mut self, message: &str) {
        self.general = Some(message.to_owned());
    }

    fn clear_general(&mut self) {
        self.general = None;
        self.success = None;
    }

    fn flag_field(&mut self, field: FormField) {
        self.flagged.insert(field);
    }

    fn display_success(&mut self, message: &str) {
        self.success = Some(message.to_owned());
    }
}
