//! The calendar document: calendar-level properties plus the ordered events.

use crate::event::NormalizedEvent;

/// iCalendar VERSION written into every document.
pub const CALENDAR_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDocument {
    product_id: String,
    version: &'static str,
    events: Vec<NormalizedEvent>,
}

impl CalendarDocument {
    /// Collect events in the given order under `product_id`.
    pub fn build(
        product_id: impl Into<String>,
        events: impl IntoIterator<Item = NormalizedEvent>,
    ) -> Self {
        CalendarDocument {
            product_id: product_id.into(),
            version: CALENDAR_VERSION,
            events: events.into_iter().collect(),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
