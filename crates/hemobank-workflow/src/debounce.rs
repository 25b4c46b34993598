// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keystroke-debounced serial lookups keyed by row.
//!
//! Each row has at most one lookup in flight. Scheduling a new lookup for a
//! row cancels the previous one, and a result is only delivered if it is
//! still the newest for its row.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hemobank_core::HemoError;

use crate::resolution::{LookupTarget, Resolution, SerialResolver};
use crate::rows::RowId;

/// A delivered lookup result.
#[derive(Debug)]
pub struct RowLookup {
    pub row: RowId,
    pub serial_id: String,
    pub result: Result<Resolution, HemoError>,
}

struct Pending {
    generation: u64,
    token: CancellationToken,
}

pub struct DebouncedLookup {
    resolver: SerialResolver,
    delay: Duration,
    pending: HashMap<RowId, Pending>,
    next_generation: u64,
    tx: mpsc::UnboundedSender<(u64, RowLookup)>,
    rx: mpsc::UnboundedReceiver<(u64, RowLookup)>,
}

impl DebouncedLookup {
    pub fn new(resolver: SerialResolver, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            resolver,
            delay,
            pending: HashMap::new(),
            next_generation: 0,
            tx,
            rx,
        }
    }

    /// Start the debounce timer for `row`, superseding any earlier lookup.
    ///
    /// Blank serials cancel the pending lookup and schedule nothing. The task
    /// is a child of `parent`, so cancelling the workflow stops it too.
    ///
    /// The timer runs on the current Tokio runtime. Outside a runtime nothing
    /// is scheduled and the row waits for an explicit resolve.
    pub fn schedule(
        &mut self,
        row: RowId,
        serial_id: &str,
        target: LookupTarget,
        parent: &CancellationToken,
    ) {
        self.cancel_row(row);
        let serial_id = serial_id.trim().to_string();
        if serial_id.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(row = %row, "no runtime, lookup not scheduled");
            return;
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let token = parent.child_token();
        self.pending.insert(
            row,
            Pending {
                generation,
                token: token.clone(),
            },
        );

        let resolver = self.resolver.clone();
        let tx = self.tx.clone();
        let delay = self.delay;
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = resolver.resolve(&serial_id, target) => result,
            };
            if token.is_cancelled() {
                return;
            }
            let _ = tx.send((
                generation,
                RowLookup {
                    row,
                    serial_id,
                    result,
                },
            ));
        });
        debug!(row = %row, generation, "lookup scheduled");
    }

    /// Cancel the pending lookup for a row, if any.
    pub fn cancel_row(&mut self, row: RowId) {
        if let Some(pending) = self.pending.remove(&row) {
            pending.token.cancel();
        }
    }

    /// Cancel every pending lookup and drop undelivered results.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.token.cancel();
        }
        while self.rx.try_recv().is_ok() {}
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, row: RowId) -> bool {
        self.pending.contains_key(&row)
    }

    fn accept(&mut self, generation: u64, lookup: RowLookup) -> Option<RowLookup> {
        match self.pending.get(&lookup.row) {
            Some(pending) if pending.generation == generation => {
                self.pending.remove(&lookup.row);
                Some(lookup)
            }
            _ => None,
        }
    }

    /// Wait for the next current result. Returns `None` once nothing is
    /// pending.
    pub async fn next(&mut self) -> Option<RowLookup> {
        while !self.pending.is_empty() {
            let (generation, lookup) = self.rx.recv().await?;
            if let Some(lookup) = self.accept(generation, lookup) {
                return Some(lookup);
            }
        }
        None
    }

    /// A result that is already available, without waiting.
    pub fn try_next(&mut self) -> Option<RowLookup> {
        while let Ok((generation, lookup)) = self.rx.try_recv() {
            if let Some(lookup) = self.accept(generation, lookup) {
                return Some(lookup);
            }
        }
        None
    }
}

impl Drop for DebouncedLookup {
    fn drop(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.token.cancel();
        }
    }
}
