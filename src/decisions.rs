use crate::change::{Change, Decision};
use crate::error::SelectError;
use crate::selection::{self, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionCounts {
    pub included: usize,
    pub excluded: usize,
    pub undecided: usize,
}

impl DecisionCounts {
    pub fn total(&self) -> usize {
        self.included + self.excluded + self.undecided
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeList {
    changes: Vec<Change>,
}

impl ChangeList {
    #[cfg(test)]
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn replace(&mut self, changes: Vec<Change>) {
        self.changes = changes;
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[cfg(test)]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn changes_mut(&mut self) -> &mut [Change] {
        &mut self.changes
    }

    pub fn id_width(&self) -> usize {
        self.changes.len().max(1).to_string().len()
    }

    pub fn select(&self, query: &str) -> Result<Selection, SelectError> {
        selection::select(&self.changes, query)
    }

    pub fn selected<'a>(&'a self, selection: &'a Selection) -> impl Iterator<Item = &'a Change> {
        selection
            .indices()
            .iter()
            .filter_map(|&idx| self.changes.get(idx))
    }

    pub fn decide(&mut self, selection: &Selection, decision: Decision) {
        for &idx in selection.indices() {
            let Some(change) = self.changes.get_mut(idx) else {
                continue;
            };
            match decision {
                Decision::Included => change.include(),
                Decision::Excluded => change.exclude(),
                Decision::Undecided => change.reset(),
            }
        }
    }

    pub fn decide_query(&mut self, query: &str, decision: Decision) -> Result<Selection, SelectError> {
        let selection = self.select(query)?;
        self.decide(&selection, decision);
        Ok(selection)
    }

    pub fn counts(&self) -> DecisionCounts {
        let mut counts = DecisionCounts::default();
        for change in &self.changes {
            match change.decision {
                Decision::Included => counts.included += 1,
                Decision::Excluded => counts.excluded += 1,
                Decision::Undecided => counts.undecided += 1,
            }
        }
        counts
    }

    pub fn included(&self) -> impl Iterator<Item = &Change> {
        self.with_decision(Decision::Included)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Change> {
        self.with_decision(Decision::Excluded)
    }

    fn with_decision(&self, decision: Decision) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.decision == decision)
    }
}
