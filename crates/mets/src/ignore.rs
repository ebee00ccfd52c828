//! Which assets a delivery platform should not receive.

use crate::physical_file::PhysicalFile;

/// Policy for excluding assets from synchronisation, keyed by the
/// manifestation type.
pub trait IgnoreAssetFilter {
    fn storage_identifiers_to_ignore(
        &self,
        manifestation_type: &str,
        sequence: &[PhysicalFile],
    ) -> Vec<String>;
}

/// Current policy: a Video manifestation may carry a poster image and an
/// MXF master in its sequence; neither should be delivered as video.
#[derive(Debug, Default)]
pub struct DefaultIgnoreFilter;

impl IgnoreAssetFilter for DefaultIgnoreFilter {
    fn storage_identifiers_to_ignore(
        &self,
        manifestation_type: &str,
        sequence: &[PhysicalFile],
    ) -> Vec<String> {
        let mut ignored = Vec::new();
        if manifestation_type == "Video" {
            for file in sequence {
                let is_video = file
                    .mime_type
                    .as_deref()
                    .is_some_and(|m| m.starts_with("video/"));
                if !is_video {
                    ignored.push(file.storage_identifier.clone());
                }
            }
        }
        ignored
    }
}
