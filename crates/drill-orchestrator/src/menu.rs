//! Selectable lists shown by the session.
//!
//! Tracks, courses, chapters, lessons and answer choices all implement
//! [`Selectable`], and a [`Menu`] is built from any slice of them.

use crate::lesson::{Chapter, Course, LessonSummary, Track};

/// Something that can be listed and picked.
pub trait Selectable {
    /// Text shown in the list.
    fn title(&self) -> &str;

    /// Identifier the session acts on when the item is picked.
    fn value(&self) -> &str;
}

impl Selectable for Track {
    fn title(&self) -> &str {
        &self.title
    }

    fn value(&self) -> &str {
        &self.slug
    }
}

impl Selectable for Course {
    fn title(&self) -> &str {
        &self.title
    }

    fn value(&self) -> &str {
        &self.first_lesson_uuid
    }
}

impl Selectable for Chapter {
    fn title(&self) -> &str {
        &self.title
    }

    fn value(&self) -> &str {
        &self.uuid
    }
}

impl Selectable for LessonSummary {
    fn title(&self) -> &str {
        &self.title
    }

    fn value(&self) -> &str {
        &self.uuid
    }
}

impl Selectable for String {
    fn title(&self) -> &str {
        self
    }

    fn value(&self) -> &str {
        self
    }
}

/// One row of a [`Menu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Text shown in the list.
    pub title: String,
    /// Identifier acted on when picked.
    pub value: String,
}

/// A titled list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    /// Heading shown above the list.
    pub title: String,
    /// Items in display order.
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Builds a menu from any selectable items.
    #[must_use]
    pub fn from_items<T: Selectable>(title: impl Into<String>, items: &[T]) -> Self {
        Self {
            title: title.into(),
            items: items
                .iter()
                .map(|item| MenuItem {
                    title: item.title().to_string(),
                    value: item.value().to_string(),
                })
                .collect(),
        }
    }

    /// The value of the item at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|item| item.value.as_str())
    }

    /// Item titles in display order.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.items.iter().map(|item| item.title.clone()).collect()
    }
}
