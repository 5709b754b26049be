//! Detection session: the tables being edited and their detector round trips.
//!
//! A [`Session`] owns every table by [`TableId`]. Asking the detector about a
//! table hands out a [`DetectionTicket`] carrying the table id and a sequence
//! number. When the answer comes back it is applied only if the ticket is
//! still the table's latest one; answers for removed tables or superseded
//! requests are dropped.

use std::collections::BTreeMap;
use std::fmt;

use tablegrid_core::{
    Crop, ReconcileSettings, ReconcileWarning, ReconcileWarningCode, ReconciledGrid, Reconciler,
    Table,
};

use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::wire::{DetectionRequest, DetectorResponse};

/// Identifier of a table within a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identity of one outstanding detector request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionTicket {
    pub table: TableId,
    pub sequence: u64,
}

/// What happened to a detector response.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// The response replaced the table's grid.
    Applied {
        warnings: Vec<ReconcileWarning>,
        /// Tables created from additional entries of a full-page response.
        added: Vec<TableId>,
    },
    /// The table was removed or a newer request superseded this one.
    Dropped,
}

impl DetectionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DetectionOutcome::Applied { .. })
    }
}

#[derive(Debug)]
struct Entry {
    table: Table,
    grid: Option<ReconciledGrid>,
    pending: Option<u64>,
}

impl Entry {
    fn new(table: Table) -> Self {
        Self {
            table,
            grid: None,
            pending: None,
        }
    }
}

/// Tables under edit plus the bookkeeping for detector requests.
#[derive(Debug, Default)]
pub struct Session {
    settings: ReconcileSettings,
    tables: BTreeMap<TableId, Entry>,
    next_table: u64,
    next_sequence: u64,
}

impl Session {
    pub fn new(settings: ReconcileSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ReconcileSettings {
        &mut self.settings
    }

    /// Take ownership of `table` and return its id.
    pub fn create_table(&mut self, table: Table) -> TableId {
        let id = TableId(self.next_table);
        self.next_table += 1;
        self.tables.insert(id, Entry::new(table));

        #[cfg(feature = "tracing")]
        tracing::debug!(table = %id, "table created");

        id
    }

    /// Create a uniform `rows` x `cols` grid with its top-left node at `(x, y)`.
    pub fn create_uniform(
        &mut self,
        x: i32,
        y: i32,
        rows: usize,
        cols: usize,
        cell_size: i32,
    ) -> Result<TableId> {
        let table = Table::grid(self.settings.grid, x, y, rows, cols, cell_size)?;
        Ok(self.create_table(table))
    }

    /// Remove a table. Any detection still in flight for it will be dropped.
    pub fn remove_table(&mut self, id: TableId) -> Result<Table> {
        let entry = self.tables.remove(&id).ok_or(Error::UnknownTable(id))?;

        #[cfg(feature = "tracing")]
        {
            if entry.pending.is_some() {
                tracing::debug!(table = %id, "table removed with a detection in flight");
            }
        }

        Ok(entry.table)
    }

    pub fn table(&self, id: TableId) -> Result<&Table> {
        self.tables
            .get(&id)
            .map(|e| &e.table)
            .ok_or(Error::UnknownTable(id))
    }

    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables
            .get_mut(&id)
            .map(|e| &mut e.table)
            .ok_or(Error::UnknownTable(id))
    }

    /// The reconciled cells the table was last built from, if any.
    pub fn grid(&self, id: TableId) -> Option<&ReconciledGrid> {
        self.tables.get(&id).and_then(|e| e.grid.as_ref())
    }

    /// Ids of all live tables, ascending.
    pub fn table_ids(&self) -> impl Iterator<Item = TableId> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Start a detector request for `id`.
    ///
    /// Only one request per table may be outstanding; a second call before
    /// the first is applied or cancelled fails with
    /// [`Error::DetectionPending`].
    pub fn begin_detection(&mut self, id: TableId) -> Result<DetectionTicket> {
        let entry = self.tables.get_mut(&id).ok_or(Error::UnknownTable(id))?;
        if entry.pending.is_some() {
            return Err(Error::DetectionPending(id));
        }
        self.next_sequence += 1;
        entry.pending = Some(self.next_sequence);

        #[cfg(feature = "tracing")]
        tracing::debug!(table = %id, sequence = self.next_sequence, "detection started");

        Ok(DetectionTicket {
            table: id,
            sequence: self.next_sequence,
        })
    }

    /// Forget the outstanding request for `id`. Its response will be dropped.
    ///
    /// Returns whether a request was outstanding.
    pub fn cancel_detection(&mut self, id: TableId) -> Result<bool> {
        let entry = self.tables.get_mut(&id).ok_or(Error::UnknownTable(id))?;
        Ok(entry.pending.take().is_some())
    }

    /// The outstanding request for `id`, if any.
    pub fn pending(&self, id: TableId) -> Option<DetectionTicket> {
        let entry = self.tables.get(&id)?;
        entry.pending.map(|sequence| DetectionTicket { table: id, sequence })
    }

    /// Request data for a full-page detection.
    pub fn request(&self, config: &DetectorConfig) -> DetectionRequest {
        DetectionRequest::new(config)
    }

    /// Request data for re-splitting `crops` of the image.
    ///
    /// Crops are in display space, so the request carries the display to
    /// image ratio and the detector answers with a hybrid response.
    pub fn crop_request(&self, config: &DetectorConfig, crops: &[Crop]) -> DetectionRequest {
        let request = DetectionRequest::new(config).with_crops(crops);
        match self.settings.scale_ratio() {
            Some(ratio) => request.with_scale_ratio(ratio),
            None => request,
        }
    }

    /// Apply a detector response to the table named by `ticket`.
    ///
    /// The first table of the response replaces the grid of the requesting
    /// table; further tables of a full-page response become new tables. A
    /// response without usable cells leaves the table as it was and reports
    /// the reason as a warning.
    pub fn apply_detection(
        &mut self,
        ticket: DetectionTicket,
        response: &DetectorResponse,
    ) -> Result<DetectionOutcome> {
        let current = self.tables.get(&ticket.table).and_then(|e| e.pending);
        if current != Some(ticket.sequence) {
            #[cfg(feature = "tracing")]
            tracing::info!(
                table = %ticket.table,
                sequence = ticket.sequence,
                "dropping stale detector response"
            );
            return Ok(DetectionOutcome::Dropped);
        }
        // The ticket is spent whether or not the response builds.
        if let Some(entry) = self.tables.get_mut(&ticket.table) {
            entry.pending = None;
        }

        let mut settings = self.settings.clone();
        settings.hybrid = response.is_hybrid();
        let reconciler = Reconciler::new(settings);

        let mut built = Vec::new();
        let mut warnings = Vec::new();
        for wire in response.tables() {
            let result = reconciler.reconcile(&wire.to_output());
            warnings.extend(result.warnings);
            if result.value.cells.is_empty() {
                continue;
            }
            let table = reconciler.build_table(&result.value)?;
            built.push((table, result.value));
        }
        if response.tables().is_empty() {
            warnings.push(ReconcileWarning::with_code(
                ReconcileWarningCode::EmptyResponse,
                "detector found no tables",
            ));
        }

        let mut built = built.into_iter();
        if let Some((table, grid)) = built.next() {
            if let Some(entry) = self.tables.get_mut(&ticket.table) {
                entry.table = table;
                entry.grid = Some(grid);
            }
        }
        let mut added = Vec::new();
        for (table, grid) in built {
            let id = self.create_table(table);
            if let Some(entry) = self.tables.get_mut(&id) {
                entry.grid = Some(grid);
            }
            added.push(id);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            table = %ticket.table,
            added = added.len(),
            warnings = warnings.len(),
            "detector response applied"
        );

        Ok(DetectionOutcome::Applied { warnings, added })
    }
}
