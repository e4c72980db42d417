use shared::domain::Document;

/// Result of a selection assignment, consumed by the content loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(Document),
    Cleared,
}

/// Holds the single active document. Assignment is not validated against the
/// registry snapshot.
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<Document>,
}

impl SelectionController {
    pub fn selected(&self) -> Option<&Document> {
        self.selected.as_ref()
    }

    /// Every call is a change notification, including re-selecting the
    /// document already in view.
    pub fn select(&mut self, document: Option<Document>) -> SelectionChange {
        self.selected = document.clone();
        match document {
            Some(document) => SelectionChange::Selected(document),
            None => SelectionChange::Cleared,
        }
    }
}
