use crate::{DiseaseId, Year};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub id: DiseaseId,
    pub name: String,
}

/// Breadcrumb trail of the drill-down page. Never empty: the root crumb is
/// the disease the page was opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrilldownPath {
    crumbs: Vec<Crumb>,
}

impl DrilldownPath {
    pub fn new(id: DiseaseId, name: impl Into<String>) -> Self {
        DrilldownPath {
            crumbs: vec![Crumb {
                id,
                name: name.into(),
            }],
        }
    }

    pub fn crumbs(&self) -> &[Crumb] {
        &self.crumbs
    }

    pub fn current(&self) -> &Crumb {
        // the root crumb is never removed
        &self.crumbs[self.crumbs.len() - 1]
    }

    pub fn can_go_back(&self) -> bool {
        self.crumbs.len() > 1
    }

    pub fn push(&mut self, id: DiseaseId, name: impl Into<String>) {
        self.crumbs.push(Crumb {
            id,
            name: name.into(),
        });
    }

    /// Keep crumbs `0..=index`. Returns the new current crumb.
    pub fn truncate_to(&mut self, index: usize) -> &Crumb {
        self.crumbs.truncate(index + 1);
        self.current()
    }

    /// Drop the current crumb unless it is the root.
    pub fn back(&mut self) -> Option<&Crumb> {
        if !self.can_go_back() {
            return None;
        }
        self.crumbs.pop();
        Some(self.current())
    }

    pub fn title(&self, year: Year) -> String {
        format!("{} Breakdown ({})", self.current().name, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> DrilldownPath {
        let mut path = DrilldownPath::new(294, "All causes");
        path.push(295, "Communicable");
        path.push(297, "Tuberculosis");
        path
    }

    #[test]
    fn push_and_back() {
        let mut path = path();
        assert_eq!(path.current().id, 297);
        assert!(path.can_go_back());
        assert_eq!(path.back().map(|c| c.id), Some(295));
        assert_eq!(path.back().map(|c| c.id), Some(294));
        assert_eq!(path.back(), None);
        assert_eq!(path.crumbs().len(), 1);
    }

    #[test]
    fn truncate_to_breadcrumb() {
        let mut path = path();
        assert_eq!(path.truncate_to(0).id, 294);
        assert!(!path.can_go_back());

        let mut path = self::path();
        assert_eq!(path.truncate_to(7).id, 297);
    }

    #[test]
    fn title_names_current_crumb() {
        assert_eq!(path().title(2019), "Tuberculosis Breakdown (2019)");
    }
}
