use slotmap::{new_key_type, SlotMap};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{OperationError, Result};
use crate::geometry::{Contour, Structure};
use crate::math::slice::{cluster_positions, median_spacing};
use crate::operations::blob::{Blob, BlobGrouper};

new_key_type! {
    /// Handle to a structure owned by a [`StructureSet`].
    pub struct StructureId;
}

/// Blob counts around a destructive edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditReport {
    pub blobs_before: usize,
    pub blobs_after: usize,
    /// The edit raised the blob count above one.
    pub disconnected: bool,
}

impl EditReport {
    fn new(blobs_before: usize, blobs_after: usize) -> Self {
        Self {
            blobs_before,
            blobs_after,
            disconnected: blobs_after > 1 && blobs_after > blobs_before,
        }
    }
}

/// Arena that owns every structure of one image series.
///
/// Structures are addressed by generational ids. Operations never mutate a
/// structure in place from the outside: callers take a [`snapshot`], compute
/// a new contour list and [`commit`] it as one swap.
///
/// [`snapshot`]: StructureSet::snapshot
/// [`commit`]: StructureSet::commit
#[derive(Debug, Default)]
pub struct StructureSet {
    structures: SlotMap<StructureId, Structure>,
    config: EngineConfig,
    slice_spacing: Option<f64>,
}

impl StructureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            structures: SlotMap::with_key(),
            config,
            slice_spacing: None,
        }
    }

    /// Slice spacing of the image series, used to tell a missing slice from
    /// a regular gap when grouping blobs.
    #[must_use]
    pub fn with_slice_spacing(mut self, mm: f64) -> Self {
        self.slice_spacing = Some(mm);
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Inserts a structure and returns its ID.
    pub fn add(&mut self, structure: Structure) -> StructureId {
        self.structures.insert(structure)
    }

    /// Returns a reference to the structure, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if `id` is stale.
    pub fn get(&self, id: StructureId) -> Result<&Structure> {
        self.structures
            .get(id)
            .ok_or_else(|| OperationError::NotFound("structure".into()).into())
    }

    fn get_mut(&mut self, id: StructureId) -> Result<&mut Structure> {
        self.structures
            .get_mut(id)
            .ok_or_else(|| OperationError::NotFound("structure".into()).into())
    }

    /// Independent copy of a structure, safe to hand to a background job.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if `id` is stale.
    pub fn snapshot(&self, id: StructureId) -> Result<Structure> {
        self.get(id).cloned()
    }

    /// Swaps in a new contour list for a structure.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if `id` is stale; the set is left
    /// untouched in that case.
    pub fn commit(&mut self, id: StructureId, contours: Vec<Contour>) -> Result<()> {
        let structure = self.get_mut(id)?;
        structure.contours = contours;
        Ok(())
    }

    #[must_use]
    pub fn find_by_roi_number(&self, roi_number: i32) -> Option<StructureId> {
        self.structures
            .iter()
            .find(|(_, s)| s.roi_number == roi_number)
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StructureId, &Structure)> {
        self.structures.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Blobs of a structure, smallest first.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if `id` is stale.
    pub fn blobs(&self, id: StructureId) -> Result<Vec<Blob>> {
        Ok(self.group(&self.get(id)?.contours, self.slice_spacing))
    }

    fn group(&self, contours: &[Contour], spacing: Option<f64>) -> Vec<Blob> {
        let grouper = BlobGrouper::new(contours)
            .with_tolerance(self.config.slice_tol_mm)
            .with_default_thickness(self.config.default_slice_thickness_mm);
        match spacing {
            Some(mm) => grouper.with_slice_spacing(mm).execute(),
            None => grouper.execute(),
        }
    }

    /// Applies `edit` to a copy of the structure's contours, commits it and
    /// reports the change in blob count. Both groupings use the spacing in
    /// force before the edit, so a deleted slice reads as a gap.
    fn edit_with_report<F>(&mut self, id: StructureId, edit: F) -> Result<EditReport>
    where
        F: FnOnce(&mut Vec<Contour>) -> Result<()>,
    {
        let mut contours = self.get(id)?.contours.clone();
        let spacing = self.slice_spacing.or_else(|| {
            median_spacing(&cluster_positions(
                contours.iter().map(|c| c.z),
                self.config.slice_tol_mm,
            ))
        });
        let before = self.group(&contours, spacing).len();
        edit(&mut contours)?;
        let after = self.group(&contours, spacing).len();
        self.commit(id, contours)?;

        let report = EditReport::new(before, after);
        if report.disconnected {
            info!(
                blobs_before = before,
                blobs_after = after,
                "edit disconnected structure"
            );
        }
        Ok(report)
    }

    /// Deletes every contour on slice `z`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if `id` is stale.
    pub fn remove_slice(&mut self, id: StructureId, z: f64) -> Result<EditReport> {
        let tol = self.config.slice_tol_mm;
        self.edit_with_report(id, |contours| {
            contours.retain(|c| (c.z - z).abs() > tol);
            Ok(())
        })
    }

    /// Deletes one contour by index.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `index` is out of range.
    pub fn delete_contour(&mut self, id: StructureId, index: usize) -> Result<EditReport> {
        self.edit_with_report(id, |contours| {
            if index >= contours.len() {
                return Err(OperationError::InvalidInput(format!(
                    "contour index {index} out of range ({})",
                    contours.len()
                ))
                .into());
            }
            contours.remove(index);
            Ok(())
        })
    }

    /// Deletes every contour of one blob.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `blob_index` is out of range.
    pub fn delete_blob(&mut self, id: StructureId, blob_index: usize) -> Result<EditReport> {
        let blob = self.blob_at(id, blob_index)?;
        self.edit_with_report(id, |contours| {
            *contours = take_except(contours, &blob.contour_indices);
            Ok(())
        })
    }

    /// Moves one blob into a new structure with the same color.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `blob_index` is out of range.
    pub fn separate_blob(
        &mut self,
        id: StructureId,
        blob_index: usize,
        name: impl Into<String>,
        roi_number: i32,
    ) -> Result<StructureId> {
        let blob = self.blob_at(id, blob_index)?;
        let source = self.get(id)?;
        let moved: Vec<Contour> = blob
            .contour_indices
            .iter()
            .filter_map(|&i| source.contours.get(i).cloned())
            .collect();
        let kept = take_except(&source.contours, &blob.contour_indices);

        let mut separated = Structure::new(roi_number, name, source.color);
        separated.contours = moved;
        self.commit(id, kept)?;
        Ok(self.add(separated))
    }

    fn blob_at(&self, id: StructureId, blob_index: usize) -> Result<Blob> {
        let mut blobs = self.blobs(id)?;
        if blob_index >= blobs.len() {
            return Err(OperationError::InvalidInput(format!(
                "blob index {blob_index} out of range ({})",
                blobs.len()
            ))
            .into());
        }
        Ok(blobs.swap_remove(blob_index))
    }
}

fn take_except(contours: &[Contour], indices: &[usize]) -> Vec<Contour> {
    contours
        .iter()
        .enumerate()
        .filter(|(i, _)| !indices.contains(i))
        .map(|(_, c)| c.clone())
        .collect()
}
