//! License codes, license URIs, and usage text.
//!
//! Sections carry single-letter legacy license codes; these map to the
//! abbreviations the conditions-of-use texts and URI table are keyed by.
//! An unknown code passes through unchanged so that new codes degrade to
//! "no known license" downstream rather than failing a build.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Maps a legacy single-letter license code to its abbreviation.
pub fn map_license_code(dz_license_code: &str) -> &str {
    match dz_license_code {
        "S" => "PDM",
        "B" | "R" | "O" => "CC-BY",
        "A" | "C" | "J" | "L" => "CC-BY-NC",
        "E" => "CC-BY-ND",
        "F" => "CC-BY-SA",
        "D" | "K" | "M" => "CC-BY-NC-ND",
        "G" => "CC-BY-NC-SA",
        "H" => "OGL",
        "I" => "OPL",
        other => other,
    }
}

static LICENSE_URIS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("PDM", "https://creativecommons.org/publicdomain/mark/1.0/"),
        ("CC0", "https://creativecommons.org/publicdomain/zero/1.0/"),
        ("CC-BY", "https://creativecommons.org/licenses/by/4.0/"),
        ("CC-BY-NC", "https://creativecommons.org/licenses/by-nc/4.0/"),
        (
            "CC-BY-NC-ND",
            "https://creativecommons.org/licenses/by-nc-nd/4.0/",
        ),
        ("CC-BY-ND", "https://creativecommons.org/licenses/by-nd/4.0/"),
        ("CC-BY-SA", "https://creativecommons.org/licenses/by-sa/4.0/"),
        (
            "CC-BY-NC-SA",
            "https://creativecommons.org/licenses/by-nc-sa/4.0/",
        ),
        (
            "OGL",
            "http://www.nationalarchives.gov.uk/doc/open-government-licence/version/2/",
        ),
        (
            "OPL",
            "http://www.parliament.uk/site-information/copyright/open-parliament-licence/",
        ),
        ("ARR", "https://en.wikipedia.org/wiki/All_rights_reserved"),
    ])
});

pub fn license_uri(abbreviation: &str) -> Option<&'static str> {
    LICENSE_URIS.get(abbreviation).copied()
}

/// The machine-readable rights URI for a legacy license code. The
/// well-known rights vocabularies are published under http ids even though
/// the human pages are https.
pub fn rights_uri(dz_license_code: &str) -> Option<String> {
    let uri = license_uri(map_license_code(dz_license_code))?;
    Some(
        uri.replace("https://creativecommons.org/", "http://creativecommons.org/")
            .replace("https://rightsstatements.org/", "http://rightsstatements.org/"),
    )
}

static CONDITIONS_OF_USE: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (
            "PDM",
            "This work has been identified as being free of known restrictions under \
             copyright law, including all related and neighbouring rights and is being made \
             available under the <a target=\"_top\" \
             href=\"http://creativecommons.org/publicdomain/mark/1.0/\">Creative Commons, \
             Public Domain Mark</a>.<br/><br/>You can copy, modify, distribute and perform \
             the work, even for commercial purposes, without asking permission.",
        ),
        (
            "CC-BY",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by/4.0/\">Creative Commons, \
             Attribution license</a>.<br/><br/>Image source should be attributed as \
             specified in the full catalogue record. If no source is given the image should \
             be attributed to Wellcome Collection.",
        ),
        (
            "CC-BY-NC",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by-nc/4.0/\">Creative Commons, \
             Attribution, Non-commercial license</a>.<br/><br/>Image source should be \
             attributed as specified in the full catalogue record. If no source is given \
             the image should be attributed to Wellcome Collection.",
        ),
        (
            "CC-BY-NC-ND",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by-nc-nd/4.0/\">Creative Commons, \
             Attribution, Non-commercial, No-derivatives license</a>.<br/><br/>Altering, \
             adapting, modifying or translating the work is prohibited.",
        ),
        (
            "CC-BY-ND",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by-nd/4.0/\">Creative Commons, \
             Attribution, No-derivatives license</a>.<br/><br/>Altering, adapting, \
             modifying or translating the work is prohibited.",
        ),
        (
            "CC-BY-SA",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by-sa/4.0/\">Creative Commons, \
             Attribution, Share-Alike license</a>.<br/><br/>If you remix, transform, or \
             build upon the material, you must distribute your contributions under the \
             same license as the original.",
        ),
        (
            "CC-BY-NC-SA",
            "You have permission to make copies of this work under a <a target=\"_top\" \
             href=\"http://creativecommons.org/licenses/by-nc-sa/4.0/\">Creative Commons, \
             Attribution, Non-commercial, Share-Alike license</a>.<br/><br/>You may not use \
             the material for commercial purposes.",
        ),
        (
            "OGL",
            "You have permission to make copies of this work under an <a target=\"_top\" \
             href=\"http://www.nationalarchives.gov.uk/doc/open-government-licence/version/2/\">Open \
             Government license</a>.",
        ),
        (
            "OPL",
            "You have permission to make copies of this work under an <a target=\"_top\" \
             href=\"http://www.parliament.uk/site-information/copyright/open-parliament-licence/\">Open \
             Parliament license</a>.",
        ),
        (
            "ARR",
            "The work has been made available under an \"all rights reserved licence\". \
             See the full catalogue record for further information about what rights you \
             have to make copies of this work.",
        ),
    ])
});

/// The standard conditions-of-use text for a license abbreviation.
pub fn conditions_of_use(abbreviation: &str) -> Option<&'static str> {
    CONDITIONS_OF_USE.get(abbreviation).copied()
}

/// Replaces bare license abbreviations in a usage statement with links to
/// the license. Tokens are matched whole, so CC-BY inside CC-BY-NC is left
/// alone.
pub fn usage_with_html_links(usage: &str) -> String {
    usage
        .split(' ')
        .map(|token| match license_uri(token) {
            Some(uri) => format!("<a href=\"{uri}\">{token}</a>"),
            None => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn wrap_span(text: &str) -> String {
    format!("<span>{text}</span>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_codes_map_to_abbreviations() {
        assert_eq!(map_license_code("S"), "PDM");
        assert_eq!(map_license_code("A"), "CC-BY-NC");
        assert_eq!(map_license_code("G"), "CC-BY-NC-SA");
        assert_eq!(map_license_code("CC-BY"), "CC-BY");
        assert_eq!(map_license_code("Z9"), "Z9");
    }

    #[test]
    fn rights_uris_use_http_for_creative_commons() {
        assert_eq!(
            rights_uri("A").as_deref(),
            Some("http://creativecommons.org/licenses/by-nc/4.0/")
        );
        assert_eq!(
            rights_uri("H").as_deref(),
            Some("http://www.nationalarchives.gov.uk/doc/open-government-licence/version/2/")
        );
        assert_eq!(rights_uri("Z9"), None);
    }

    #[test]
    fn usage_decoration_links_whole_tokens_only() {
        let processed = usage_with_html_links("This is CC-BY-NC hello and CC-BY");
        assert_eq!(
            processed,
            "This is <a href=\"https://creativecommons.org/licenses/by-nc/4.0/\">CC-BY-NC</a> \
             hello and <a href=\"https://creativecommons.org/licenses/by/4.0/\">CC-BY</a>"
        );
    }

    #[test]
    fn repeated_codes_are_each_linked() {
        let processed = usage_with_html_links("OGL and CC-BY-NC and OGL again");
        assert_eq!(processed.matches("<a href=").count(), 3);
    }

    #[test]
    fn conditions_text_exists_for_every_mapped_abbreviation() {
        for code in ["S", "B", "A", "E", "F", "D", "G", "H", "I"] {
            assert!(conditions_of_use(map_license_code(code)).is_some(), "{code}");
        }
    }
}
