//! Player options and the legacy license-operations table.
//!
//! Newer METS files carry a single integer in
//! `mods:accessCondition type="player"` that bit-compares against
//! [`PlayerOptions`] flags. Older files only have a single-character license
//! code, for which [`LicenseOptions`] maps (section type, code) to the
//! operations the player may offer.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Bit flags for operations the player may offer against an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions(u32);

impl PlayerOptions {
    pub const CURRENT_VIEW_AS_JPG: PlayerOptions = PlayerOptions(1);
    pub const WHOLE_IMAGE_LOW_RES_AS_JPG: PlayerOptions = PlayerOptions(2);
    pub const WHOLE_IMAGE_HIGH_RES_AS_JPG: PlayerOptions = PlayerOptions(4);
    pub const ENTIRE_DOCUMENT_AS_PDF: PlayerOptions = PlayerOptions(8);
    pub const ENTIRE_FILE_AS_ORIGINAL: PlayerOptions = PlayerOptions(16);
    /// Embed is not authorised per request like the others.
    pub const EMBED: PlayerOptions = PlayerOptions(32);

    const ALL: [(PlayerOptions, &'static str); 6] = [
        (PlayerOptions::CURRENT_VIEW_AS_JPG, "currentViewAsJpg"),
        (PlayerOptions::WHOLE_IMAGE_LOW_RES_AS_JPG, "wholeImageLowResAsJpg"),
        (PlayerOptions::WHOLE_IMAGE_HIGH_RES_AS_JPG, "wholeImageHighResAsJpg"),
        (PlayerOptions::ENTIRE_DOCUMENT_AS_PDF, "entireDocumentAsPdf"),
        (PlayerOptions::ENTIRE_FILE_AS_ORIGINAL, "entireFileAsOriginal"),
        (PlayerOptions::EMBED, "embed"),
    ];

    /// Interprets a raw `type="player"` integer for a given asset type.
    ///
    /// For historical reasons `entireFileAsOriginal` is present in the flags
    /// of most monographs even when it should not be, so it is stripped for
    /// deep-zoom asset types.
    pub fn from_code(code: i32, asset_type: &str) -> PlayerOptions {
        let mut flags = PlayerOptions(code.max(0) as u32);
        if asset_type == "seadragon/dzi" || asset_type == "image/jp2" {
            flags.0 &= !PlayerOptions::ENTIRE_FILE_AS_ORIGINAL.0;
        }
        flags
    }

    pub fn contains(&self, flag: PlayerOptions) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// The names of the set flags, in flag order.
    pub fn permitted_operations(&self) -> Vec<&'static str> {
        PlayerOptions::ALL
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Download operations indexed by the positions used in the license table.
const DOWNLOAD_OPTIONS: [&str; 5] = [
    "currentViewAsJpg",
    "wholeImageHighResAsJpg",
    "wholeImageLowResAsJpg",
    "entireDocumentAsPdf",
    "entireFileAsOriginal",
];

/// (section type, license code) to indexes into [`DOWNLOAD_OPTIONS`].
static LICENSE_OPTIONS: LazyLock<HashMap<&'static str, HashMap<&'static str, &'static [usize]>>> =
    LazyLock::new(|| {
        let mut map: HashMap<&str, HashMap<&str, &[usize]>> = HashMap::new();
        map.insert(
            "monograph",
            HashMap::from([
                ("a", &[0, 1, 2, 3][..]),
                ("b", &[0, 1, 2, 3][..]),
                ("c", &[0, 1, 2, 3][..]),
                ("d", &[0, 1, 2, 3][..]),
                ("e", &[0, 1, 2][..]),
                ("f", &[0, 1, 2][..]),
                ("g", &[0, 1, 2][..]),
                ("k", &[0, 1, 2, 3][..]),
                ("r", &[0, 1, 2, 3][..]),
                ("s", &[0, 1, 2, 3][..]),
            ]),
        );
        map.insert(
            "archive",
            HashMap::from([("j", &[0, 1, 2, 3][..]), ("a", &[0, 1, 2, 3][..])]),
        );
        map.insert(
            "boundmanuscript",
            HashMap::from([("a", &[0, 1, 2][..]), ("j", &[0, 1, 2][..])]),
        );
        map.insert(
            "video",
            HashMap::from([
                ("a", &[4][..]),
                ("b", &[4][..]),
                ("c", &[4][..]),
                ("d", &[4][..]),
                ("k", &[4][..]),
            ]),
        );
        map.insert(
            "audio",
            HashMap::from([
                ("a", &[4][..]),
                ("b", &[4][..]),
                ("c", &[4][..]),
                ("d", &[4][..]),
                ("k", &[4][..]),
            ]),
        );
        map.insert(
            "artwork",
            HashMap::from([
                ("a", &[0, 1, 2, 4][..]),
                ("b", &[0, 1, 2][..]),
                ("c", &[0, 1, 2][..]),
                ("d", &[0, 1, 2][..]),
                ("j", &[0, 1, 2][..]),
                ("k", &[0, 1, 2][..]),
                ("l", &[0, 2][..]),
                ("m", &[0, 2][..]),
                ("n", &[0, 2][..]),
                ("o", &[0, 2][..]),
                ("p", &[0, 2][..]),
                ("q", &[0, 2][..]),
            ]),
        );
        map
    });

/// The legacy (license code, section type) operations lookup.
pub struct LicenseOptions;

impl LicenseOptions {
    /// The operations permitted for a single-character license code given a
    /// section type ("Monograph", "Artwork", ...) and asset type
    /// ("seadragon/dzi", "application/pdf", ...). Lookup is
    /// case-insensitive; unknown combinations permit nothing.
    pub fn permitted_operations(
        dz_license_code: &str,
        section_type: &str,
        asset_type: &str,
    ) -> Vec<&'static str> {
        let section = section_type.to_lowercase();
        let code = dz_license_code.to_lowercase();
        let Some(for_type) = LICENSE_OPTIONS.get(section.as_str()) else {
            return Vec::new();
        };
        let Some(indexes) = for_type.get(code.as_str()) else {
            return Vec::new();
        };
        // A "monograph" is still assumed to be an image sequence, so a PDF
        // asset under the in-copyright codes only gets the original file.
        let indexes: &[usize] = if (code == "r" || code == "s")
            && section == "monograph"
            && asset_type.eq_ignore_ascii_case("application/pdf")
        {
            &[4]
        } else {
            indexes
        };
        indexes.iter().map(|&i| DOWNLOAD_OPTIONS[i]).collect()
    }
}
