use std::collections::{BTreeMap, BTreeSet};

use crate::sheet::CountSheet;
use fieldgrid_core::{FieldIndex, REFERENCE_FIELDS};

/// Which physical fields end up in the sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldSelection {
    #[default]
    All,
    /// Operator-picked fields; always includes the four corner fields.
    Curated(BTreeSet<FieldIndex>),
}

impl FieldSelection {
    pub fn curated(fields: impl IntoIterator<Item = FieldIndex>) -> Self {
        let mut set: BTreeSet<FieldIndex> = fields.into_iter().collect();
        set.extend(REFERENCE_FIELDS);
        FieldSelection::Curated(set)
    }

    pub fn contains(&self, field: FieldIndex) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::Curated(set) => set.contains(&field),
        }
    }

    /// Selected fields in ascending order.
    pub fn fields(&self) -> Vec<FieldIndex> {
        match self {
            FieldSelection::All => FieldIndex::all().collect(),
            FieldSelection::Curated(set) => set.iter().copied().collect(),
        }
    }
}

/// Write the selected counts; a selected field with no count writes 0 and
/// unselected fields keep the template value.
pub fn fill_sheet(
    sheet: &mut CountSheet,
    counts: &BTreeMap<FieldIndex, u32>,
    selection: &FieldSelection,
) {
    let fields = selection.fields();
    for &field in &fields {
        sheet.set(field, counts.get(&field).copied().unwrap_or(0));
    }
    log::debug!("wrote {} field count(s)", fields.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: u32) -> FieldIndex {
        FieldIndex::new(n).unwrap()
    }

    fn counts() -> BTreeMap<FieldIndex, u32> {
        FieldIndex::all().map(|f| (f, f.get() + 100)).collect()
    }

    #[test]
    fn curated_selection_forces_reference_fields() {
        let selection = FieldSelection::curated([field(1), field(57)]);
        assert_eq!(
            selection.fields(),
            vec![field(1), field(8), field(57), field(64)]
        );

        let mut sheet = CountSheet::template();
        fill_sheet(&mut sheet, &counts(), &selection);

        for (addr, expected) in [("B2", "101"), ("B9", "108"), ("B58", "157"), ("B65", "164")] {
            assert_eq!(sheet.cell(addr).unwrap(), expected);
        }
        let untouched = FieldIndex::all()
            .filter(|&f| !selection.contains(f))
            .all(|f| sheet.count(f) == Some(0));
        assert!(untouched);
    }

    #[test]
    fn all_fields_are_written() {
        let mut sheet = CountSheet::template();
        fill_sheet(&mut sheet, &counts(), &FieldSelection::All);
        assert!(FieldIndex::all().all(|f| sheet.count(f) == Some(f.get() + 100)));
    }

    #[test]
    fn missing_counts_write_zero() {
        let mut sheet = CountSheet::template();
        sheet.set(field(8), 9);
        fill_sheet(&mut sheet, &BTreeMap::new(), &FieldSelection::curated(std::iter::empty()));
        assert_eq!(sheet.count(field(8)), Some(0));
    }
}
