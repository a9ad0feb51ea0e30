//! Presentation port: where user-visible messages go.
//!
//! The domain never touches a concrete UI. Implementations hold at most one
//! message per field plus one general message; displaying replaces whatever
//! was shown before on that channel.

use crate::domain::FormField;

/// Sink for field-level and general messages.
#[cfg_attr(test, mockall::automock)]
pub trait Presentation {
    /// Show `message` under `field`.
    fn display_field_error(&mut self, field: FormField, message: &str);

    /// Remove any message and highlight from `field`.
    fn clear_field_error(&mut self, field: FormField);

    /// Show a message not tied to one field.
    fn display_general(&mut self, message: &str);

    /// Hide the general message.
    fn clear_general(&mut self);

    /// Highlight `field` without attaching a message.
    fn flag_field(&mut self, field: FormField);

    /// Show a confirmation such as `Login successful! Redirecting...`.
    fn display_success(&mut self, message: &str);
}
