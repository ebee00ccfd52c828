//! Build results and cross-manifestation state.
//!
//! Most resources build independently of their position in the package
//! tree. Two shapes cannot: multi-copy works, whose grouping is only known
//! once every sibling has been seen, and old-workflow AV works, where one
//! manifestation holds the video and another its transcript. The batch
//! build accumulates [`State`] across manifestations and fixes those up in
//! a second pass.

use std::collections::BTreeMap;

use stacks_mets::PhysicalFile;

use crate::presentation::IiifResource;

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Success,
    Failure { message: String },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// The outcome of building one resource. Failures carry their message here
/// rather than aborting the batch.
#[derive(Debug)]
pub struct BuildResult {
    pub id: String,
    pub outcome: BuildOutcome,
    pub resource: Option<IiifResource>,
    /// Set when a single build was refused because it needs package-wide
    /// state; the caller should rebuild through the batch path.
    pub requires_multiple_build: bool,
    pub image_count: usize,
    pub time_based_count: usize,
    pub file_count: usize,
}

impl BuildResult {
    pub fn success(id: impl Into<String>, resource: IiifResource) -> BuildResult {
        BuildResult {
            id: id.into(),
            outcome: BuildOutcome::Success,
            resource: Some(resource),
            requires_multiple_build: false,
            image_count: 0,
            time_based_count: 0,
            file_count: 0,
        }
    }

    pub fn failure(id: impl Into<String>, message: impl Into<String>) -> BuildResult {
        BuildResult {
            id: id.into(),
            outcome: BuildOutcome::Failure {
                message: message.into(),
            },
            resource: None,
            requires_multiple_build: false,
            image_count: 0,
            time_based_count: 0,
            file_count: 0,
        }
    }
}

/// The results of one package build, in the order resources were built.
#[derive(Debug, Default)]
pub struct MultipleBuildResult {
    pub identifier: String,
    results: Vec<BuildResult>,
}

impl MultipleBuildResult {
    pub fn new(identifier: impl Into<String>) -> MultipleBuildResult {
        MultipleBuildResult {
            identifier: identifier.into(),
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: BuildResult) {
        self.results.push(result);
    }

    pub fn get(&self, id: &str) -> Option<&BuildResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BuildResult> {
        self.results.iter_mut().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildResult> {
        self.results.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BuildResult> {
        self.results.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    /// Replaces the whole result list; the AV second pass collapses a
    /// multiple manifestation down to one manifest this way.
    pub fn replace_all(&mut self, results: Vec<BuildResult>) {
        self.results = results;
    }

    pub fn take_all(&mut self) -> Vec<BuildResult> {
        std::mem::take(&mut self.results)
    }
}

/// Copy and volume numbering for one manifestation of a multi-copy work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyAndVolume {
    pub id: String,
    pub copy_number: i32,
    pub volume_number: Option<i32>,
}

#[derive(Debug, Default)]
pub struct MultiCopyState {
    /// Keyed by manifestation identifier, ordered for stable grouping.
    pub copy_and_volumes: BTreeMap<String, CopyAndVolume>,
}

#[derive(Debug, Default)]
pub struct AvState {
    /// Canvas ids of time-based canvases seen so far, per manifestation.
    pub canvas_count: usize,
}

#[derive(Debug, Default)]
pub struct FileState {
    /// Non-AV physical files (PDF transcripts, mostly) found in sibling
    /// manifestations, to be attached to AV canvases afterwards.
    pub found_files: Vec<PhysicalFile>,
}

/// State shared across one package's sequential builds.
#[derive(Debug, Default)]
pub struct State {
    pub multi_copy: Option<MultiCopyState>,
    pub av: Option<AvState>,
    pub file: Option<FileState>,
}

impl State {
    pub fn has_state(&self) -> bool {
        self.multi_copy.is_some() || self.av.is_some() || self.file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{LanguageMap, Manifest};

    #[test]
    fn results_keep_insertion_order_and_find_by_id() {
        let mut results = MultipleBuildResult::new("b12345678");
        let manifest = Manifest::new("https://iiif.test/presentation/b12345678_0001", LanguageMap::en("V1"));
        results.add(BuildResult::success(
            "b12345678_0001",
            IiifResource::Manifest(Box::new(manifest)),
        ));
        results.add(BuildResult::failure("b12345678_0002", "broken METS"));

        assert_eq!(results.len(), 2);
        assert!(!results.all_succeeded());
        assert!(results.get("b12345678_0002").is_some());
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b12345678_0001", "b12345678_0002"]);
    }

    #[test]
    fn state_is_empty_until_a_pass_needs_it() {
        let mut state = State::default();
        assert!(!state.has_state());
        state.multi_copy = Some(MultiCopyState::default());
        assert!(state.has_state());
    }
}
