//! # Cluster Tables
//!
//! Append-only storage for cluster rows.
//!
//! A processing pass writes rows through a [`ClusterTableWriter`] and then
//! calls [`ClusterTableWriter::finish`], which hands back a read-only
//! [`ClusterTable`]. There is no way to update or delete a row, and a new
//! pass starts from a fresh writer, so nothing carries over between passes.
//!
//! Two table specs exist: matched clusters (collision reference) and
//! ambiguous clusters (bunch-crossing reference). Each writer checks on
//! append that the row carries its table's reference kind and that the
//! reference is a valid index into the set supplied for the pass.

use crate::cluster::{Association, ClusterRecord, ClusterRow};
use crate::cluster_definition::ClusterDefinition;
use crate::primitives::{
    EMCAL_AMBIGUOUS_CLUSTERS_DESCRIPTION, EMCAL_CLUSTERS_DESCRIPTION, MAX_TABLE_ROWS, TABLE_ORIGIN,
};
use crate::{AodError, AssociationKind, BcId, CollisionId, RowIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// TABLE SPEC
// =============================================================================

/// Static description of a table: data origin, description and which
/// reference column it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub origin: &'static str,
    pub description: &'static str,
    pub kind: AssociationKind,
}

/// Clusters that could be matched to a collision.
pub const EMCAL_CLUSTERS: TableSpec = TableSpec {
    origin: TABLE_ORIGIN,
    description: EMCAL_CLUSTERS_DESCRIPTION,
    kind: AssociationKind::Collision,
};

/// Clusters that could not be matched to a collision.
pub const EMCAL_AMBIGUOUS_CLUSTERS: TableSpec = TableSpec {
    origin: TABLE_ORIGIN,
    description: EMCAL_AMBIGUOUS_CLUSTERS_DESCRIPTION,
    kind: AssociationKind::BunchCrossing,
};

impl TableSpec {
    /// The table spec carrying the given reference kind.
    #[must_use]
    pub const fn for_kind(kind: AssociationKind) -> Self {
        match kind {
            AssociationKind::Collision => EMCAL_CLUSTERS,
            AssociationKind::BunchCrossing => EMCAL_AMBIGUOUS_CLUSTERS,
        }
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Append-only writer for one table in one processing pass.
#[derive(Debug, Clone)]
pub struct ClusterTableWriter {
    spec: TableSpec,
    reference_bound: u32,
    rows: Vec<ClusterRow>,
    next_index: RowIndex,
}

impl ClusterTableWriter {
    /// Create a writer. `reference_bound` is the size of the collision (or
    /// bunch-crossing) set that rows of this pass may point into.
    #[must_use]
    pub fn new(spec: TableSpec, reference_bound: u32) -> Self {
        Self {
            spec,
            reference_bound,
            rows: Vec::new(),
            next_index: RowIndex::default(),
        }
    }

    /// Append one row. Returns the row's index.
    ///
    /// # Errors
    /// - `AssociationMismatch` if the reference kind does not match the table
    /// - `DanglingReference` if the reference is outside the supplied set
    /// - `TableFull` past `MAX_TABLE_ROWS`
    pub fn append(
        &mut self,
        association: Association,
        record: ClusterRecord,
    ) -> Result<RowIndex, AodError> {
        if association.kind() != self.spec.kind {
            return Err(AodError::AssociationMismatch {
                table: self.spec.description,
                expected: self.spec.kind,
                found: association.kind(),
            });
        }

        if association.index() >= self.reference_bound {
            return Err(AodError::DanglingReference {
                kind: self.spec.kind,
                index: association.index(),
                bound: self.reference_bound,
            });
        }

        if self.rows.len() >= MAX_TABLE_ROWS {
            return Err(AodError::TableFull(self.spec.description));
        }

        let index = self.next_index;
        self.rows.push(ClusterRow {
            index,
            association,
            record,
        });
        self.next_index = index.next();
        Ok(index)
    }

    /// Number of rows appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Close the pass and hand out the read-only table.
    #[must_use]
    pub fn finish(self) -> ClusterTable {
        ClusterTable {
            spec: self.spec,
            reference_bound: self.reference_bound,
            rows: self.rows,
        }
    }
}

// =============================================================================
// READ-ONLY TABLE
// =============================================================================

/// A finished table. Rows are in insertion order and never change.
#[derive(Debug, Clone)]
pub struct ClusterTable {
    spec: TableSpec,
    reference_bound: u32,
    rows: Vec<ClusterRow>,
}

impl ClusterTable {
    /// An empty table of the given spec.
    #[must_use]
    pub fn empty(spec: TableSpec) -> Self {
        ClusterTableWriter::new(spec, 0).finish()
    }

    /// The table's spec.
    #[must_use]
    pub fn spec(&self) -> TableSpec {
        self.spec
    }

    /// Which reference column this table carries.
    #[must_use]
    pub fn kind(&self) -> AssociationKind {
        self.spec.kind
    }

    /// Size of the referenced set the table was built against.
    #[must_use]
    pub fn reference_bound(&self) -> u32 {
        self.reference_bound
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in insertion order. Each call starts from the first row.
    pub fn iter(&self) -> std::slice::Iter<'_, ClusterRow> {
        self.rows.iter()
    }

    /// Get a row by its index.
    #[must_use]
    pub fn get(&self, index: RowIndex) -> Option<&ClusterRow> {
        usize::try_from(index.value())
            .ok()
            .and_then(|i| self.rows.get(i))
    }

    /// Rows produced by the given cluster definition.
    pub fn with_definition<'a>(
        &'a self,
        definition: &ClusterDefinition,
    ) -> impl Iterator<Item = &'a ClusterRow> + 'a {
        let id = definition.definition_id();
        self.rows.iter().filter(move |row| row.record.definition == id)
    }

    /// Rows of a matched table that belong to the given collision.
    pub fn for_collision(&self, collision: CollisionId) -> impl Iterator<Item = &ClusterRow> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.association.collision() == Some(collision))
    }

    /// Rows of an ambiguous table that belong to the given bunch crossing.
    pub fn for_bunch_crossing(&self, bc: BcId) -> impl Iterator<Item = &ClusterRow> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.association.bunch_crossing() == Some(bc))
    }

    /// Rows grouped by referenced index, groups ordered by index, rows in
    /// insertion order within a group.
    #[must_use]
    pub fn grouped_by_reference(&self) -> BTreeMap<u32, Vec<&ClusterRow>> {
        let mut groups: BTreeMap<u32, Vec<&ClusterRow>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.association.index()).or_default().push(row);
        }
        groups
    }
}

impl<'a> IntoIterator for &'a ClusterTable {
    type Item = &'a ClusterRow;
    type IntoIter = std::slice::Iter<'a, ClusterRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// PROCESSING PASS
// =============================================================================

/// Both cluster tables of one processing pass.
#[derive(Debug, Clone)]
pub struct ClusterPass {
    matched: ClusterTableWriter,
    ambiguous: ClusterTableWriter,
}

impl ClusterPass {
    /// Start a pass over `n_collisions` collisions and `n_bcs` bunch crossings.
    #[must_use]
    pub fn new(n_collisions: u32, n_bcs: u32) -> Self {
        Self {
            matched: ClusterTableWriter::new(EMCAL_CLUSTERS, n_collisions),
            ambiguous: ClusterTableWriter::new(EMCAL_AMBIGUOUS_CLUSTERS, n_bcs),
        }
    }

    /// Append a row to whichever table carries its reference kind.
    pub fn append(
        &mut self,
        association: Association,
        record: ClusterRecord,
    ) -> Result<RowIndex, AodError> {
        match association.kind() {
            AssociationKind::Collision => self.matched.append(association, record),
            AssociationKind::BunchCrossing => self.ambiguous.append(association, record),
        }
    }

    /// Append a matched cluster.
    pub fn append_matched(
        &mut self,
        collision: CollisionId,
        record: ClusterRecord,
    ) -> Result<RowIndex, AodError> {
        self.matched
            .append(Association::Collision(collision), record)
    }

    /// Append an ambiguous cluster.
    pub fn append_ambiguous(
        &mut self,
        bc: BcId,
        record: ClusterRecord,
    ) -> Result<RowIndex, AodError> {
        self.ambiguous
            .append(Association::BunchCrossing(bc), record)
    }

    /// Close the pass.
    #[must_use]
    pub fn finish(self) -> ClusterTables {
        ClusterTables {
            matched: self.matched.finish(),
            ambiguous: self.ambiguous.finish(),
        }
    }
}

/// The finished output of one pass.
#[derive(Debug, Clone)]
pub struct ClusterTables {
    pub matched: ClusterTable,
    pub ambiguous: ClusterTable,
}

impl ClusterTables {
    /// Two empty tables.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matched: ClusterTable::empty(EMCAL_CLUSTERS),
            ambiguous: ClusterTable::empty(EMCAL_AMBIGUOUS_CLUSTERS),
        }
    }

    /// Total rows across both tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.matched.len() + self.ambiguous.len()
    }
}

impl Default for ClusterTables {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// SERIALIZABLE FORM
// =============================================================================

/// Plain-data form of a table, used by the persistence format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableTable {
    pub kind: AssociationKind,
    pub reference_bound: u32,
    pub rows: Vec<(Association, ClusterRecord)>,
}

impl From<&ClusterTable> for SerializableTable {
    fn from(table: &ClusterTable) -> Self {
        Self {
            kind: table.kind(),
            reference_bound: table.reference_bound,
            rows: table
                .rows
                .iter()
                .map(|row| (row.association, row.record.clone()))
                .collect(),
        }
    }
}

impl SerializableTable {
    /// Rebuild the table, re-checking every row on the way in.
    pub fn into_table(self) -> Result<ClusterTable, AodError> {
        let mut writer = ClusterTableWriter::new(TableSpec::for_kind(self.kind), self.reference_bound);
        for (association, record) in self.rows {
            writer.append(association, record)?;
        }
        Ok(writer.finish())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefinitionId;
    use crate::cluster_definition::{K_V3_DEFAULT, K_V3_VARIATION1};

    fn record(id: i32, energy: f32, definition: i32) -> ClusterRecord {
        ClusterRecord {
            id,
            energy,
            core_energy: energy * 0.8,
            eta: 0.1,
            phi: 2.0,
            m02: 0.3,
            m20: 0.1,
            n_cells: 4,
            time: 5.0,
            is_exotic: false,
            distance_to_bad_channel: 3.0,
            nlm: 1,
            definition: DefinitionId(definition),
        }
    }

    #[test]
    fn append_assigns_sequential_indices() {
        let mut writer = ClusterTableWriter::new(EMCAL_CLUSTERS, 2);
        let a = writer
            .append(Association::Collision(CollisionId(0)), record(1, 1.0, 10))
            .expect("append");
        let b = writer
            .append(Association::Collision(CollisionId(1)), record(2, 2.0, 10))
            .expect("append");
        assert_eq!(a, RowIndex(0));
        assert_eq!(b, RowIndex(1));
        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn matched_table_rejects_bunch_crossing_reference() {
        let mut writer = ClusterTableWriter::new(EMCAL_CLUSTERS, 4);
        let result = writer.append(Association::BunchCrossing(BcId(0)), record(1, 1.0, 10));
        assert!(matches!(
            result,
            Err(AodError::AssociationMismatch {
                expected: AssociationKind::Collision,
                found: AssociationKind::BunchCrossing,
                ..
            })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn ambiguous_table_rejects_collision_reference() {
        let mut writer = ClusterTableWriter::new(EMCAL_AMBIGUOUS_CLUSTERS, 4);
        let result = writer.append(Association::Collision(CollisionId(0)), record(1, 1.0, 10));
        assert!(matches!(result, Err(AodError::AssociationMismatch { .. })));
    }

    #[test]
    fn dangling_reference_rejected() {
        let mut writer = ClusterTableWriter::new(EMCAL_CLUSTERS, 2);
        let result = writer.append(Association::Collision(CollisionId(2)), record(1, 1.0, 10));
        assert!(matches!(
            result,
            Err(AodError::DanglingReference {
                index: 2,
                bound: 2,
                ..
            })
        ));
    }

    #[test]
    fn get_by_index() {
        let mut pass = ClusterPass::new(1, 0);
        pass.append_matched(CollisionId(0), record(7, 1.5, 10))
            .expect("append");
        let tables = pass.finish();
        let row = tables.matched.get(RowIndex(0)).expect("row");
        assert_eq!(row.record.id, 7);
        assert!(tables.matched.get(RowIndex(1)).is_none());
    }

    #[test]
    fn iteration_is_restartable() {
        let mut pass = ClusterPass::new(3, 0);
        for i in 0..3 {
            pass.append_matched(CollisionId(i), record(i as i32, 1.0, 10))
                .expect("append");
        }
        let table = pass.finish().matched;

        let first: Vec<i32> = table.iter().map(|r| r.record.id).collect();
        let second: Vec<i32> = (&table).into_iter().map(|r| r.record.id).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn pass_routes_by_kind() {
        let mut pass = ClusterPass::new(2, 5);
        pass.append(Association::Collision(CollisionId(1)), record(1, 1.0, 10))
            .expect("matched");
        pass.append(Association::BunchCrossing(BcId(4)), record(2, 1.0, 10))
            .expect("ambiguous");
        let tables = pass.finish();
        assert_eq!(tables.matched.len(), 1);
        assert_eq!(tables.ambiguous.len(), 1);
        assert_eq!(tables.total_rows(), 2);
        assert!(tables.matched.iter().all(|r| r.association.bunch_crossing().is_none()));
        assert!(tables.ambiguous.iter().all(|r| r.association.collision().is_none()));
    }

    #[test]
    fn definition_filter() {
        let mut pass = ClusterPass::new(1, 0);
        pass.append_matched(CollisionId(0), record(1, 1.0, 10))
            .expect("append");
        pass.append_matched(CollisionId(0), record(2, 1.0, 11))
            .expect("append");
        pass.append_matched(CollisionId(0), record(3, 1.0, 10))
            .expect("append");
        let table = pass.finish().matched;

        let v3: Vec<i32> = table.with_definition(&K_V3_DEFAULT).map(|r| r.record.id).collect();
        let v3_var1: Vec<i32> = table
            .with_definition(&K_V3_VARIATION1)
            .map(|r| r.record.id)
            .collect();
        assert_eq!(v3, vec![1, 3]);
        assert_eq!(v3_var1, vec![2]);
    }

    #[test]
    fn grouped_by_reference_orders_groups() {
        let mut pass = ClusterPass::new(3, 0);
        pass.append_matched(CollisionId(2), record(1, 1.0, 10))
            .expect("append");
        pass.append_matched(CollisionId(0), record(2, 1.0, 10))
            .expect("append");
        pass.append_matched(CollisionId(2), record(3, 1.0, 10))
            .expect("append");
        let table = pass.finish().matched;

        let groups = table.grouped_by_reference();
        let keys: Vec<u32> = groups.keys().copied().collect();
        assert_eq!(keys, vec![0, 2]);
        let ids: Vec<i32> = groups[&2].iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(table.for_collision(CollisionId(2)).count(), 2);
    }

    #[test]
    fn serializable_round_trip_revalidates() {
        let mut pass = ClusterPass::new(0, 2);
        pass.append_ambiguous(BcId(1), record(1, 1.0, 10))
            .expect("append");
        let table = pass.finish().ambiguous;

        let mut plain = SerializableTable::from(&table);
        let rebuilt = plain.clone().into_table().expect("rebuild");
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt.kind(), AssociationKind::BunchCrossing);

        plain.reference_bound = 1;
        assert!(plain.into_table().is_err());
    }
}
