//! Package identifiers.
//!
//! An identifier is not an opaque string: its shape tells us what kind of
//! digital object it names. `b19974760` is a whole package, `b19974760_10`
//! a volume within a multiple manifestation, `b19974760_10_10` an issue
//! within that volume, and `b19974760/3` the manifestation at sequence
//! index 3. Anything that does not start with a b number is treated as a
//! born-digital archival identifier such as `PPCRI/A/B/C`.

use std::fmt;

/// What kind of digital object an identifier names, inferred from its form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierForm {
    BNumber,
    Volume,
    Issue,
    BNumberAndSequenceIndex,
    NonBNumber,
}

/// Which storage prefix holds the object's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Digitised,
    BornDigital,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Digitised => "digitised",
            StorageType::BornDigital => "born-digital",
        }
    }
}

/// A parsed package identifier.
///
/// The majority of identifiers are the same string as their package
/// identifier. For multiple manifestations, several identifiers belong to
/// the same package: `b19974760_10` and `b19974760_10_10` both have package
/// identifier `b19974760`, which is what locates the object in storage and
/// in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageId {
    value: String,
    parts: Vec<String>,
    form: IdentifierForm,
    sequence_index: i32,
}

/// `b` followed by 7 to 9 characters of `[0-9x]`, case-insensitive.
fn is_b_number(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !bytes[0].eq_ignore_ascii_case(&b'b') {
        return false;
    }
    let rest = &bytes[1..];
    (7..=9).contains(&rest.len())
        && rest
            .iter()
            .all(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&b'x'))
}

impl PackageId {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let parts: Vec<String> = value
            .split(['_', '/'])
            .map(|p| p.to_string())
            .collect();
        let has_b_number = parts.first().is_some_and(|p| is_b_number(p));

        let mut sequence_index = 0;
        let form = if has_b_number {
            match parts.len() {
                1 => IdentifierForm::BNumber,
                2 if value.starts_with(&format!("{}_", parts[0])) => IdentifierForm::Volume,
                2 => match parts[1].parse::<i32>() {
                    Ok(n) => {
                        sequence_index = n;
                        IdentifierForm::BNumberAndSequenceIndex
                    }
                    Err(_) => IdentifierForm::NonBNumber,
                },
                3 => IdentifierForm::Issue,
                _ => IdentifierForm::NonBNumber,
            }
        } else {
            IdentifierForm::NonBNumber
        };

        PackageId {
            value,
            parts,
            form,
            sequence_index,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn form(&self) -> IdentifierForm {
        self.form
    }

    pub fn has_b_number(&self) -> bool {
        !matches!(self.form, IdentifierForm::NonBNumber) || is_b_number(&self.parts[0])
    }

    /// The b number, if the identifier starts with one.
    pub fn b_number(&self) -> Option<&str> {
        if self.has_b_number() {
            Some(&self.parts[0])
        } else {
            None
        }
    }

    /// The identifier of the stored package this identifier is whole or
    /// part of. For born-digital identifiers underscores are folded back to
    /// the archival `/` form.
    pub fn package_identifier(&self) -> String {
        match self.b_number() {
            Some(b) => b.to_string(),
            None => self.value.replace('_', "/"),
        }
    }

    /// A version of the package identifier safe as a single path element.
    pub fn path_element_safe(&self) -> String {
        self.package_identifier().replace('/', "_")
    }

    pub fn storage_type(&self) -> StorageType {
        if self.has_b_number() {
            StorageType::Digitised
        } else {
            StorageType::BornDigital
        }
    }

    /// The volume identifier, if this identifier is or is part of a volume.
    /// `b19974760_10_10` has volume part `b19974760_10`.
    pub fn volume_part(&self) -> Option<String> {
        if self.has_b_number() && self.parts.len() > 1 {
            Some(format!("{}_{}", self.parts[0], self.parts[1]))
        } else {
            None
        }
    }

    /// The issue identifier, if this identifier names an issue within a
    /// volume. `b19974760_10` has no issue part.
    pub fn issue_part(&self) -> Option<String> {
        if self.has_b_number() && self.parts.len() > 2 {
            Some(format!(
                "{}_{}_{}",
                self.parts[0], self.parts[1], self.parts[2]
            ))
        } else {
            None
        }
    }

    /// Position within the package, for the `bnumber/n` form. Zero otherwise.
    pub fn sequence_index(&self) -> i32 {
        self.sequence_index
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        PackageId::new(value)
    }
}

impl From<String> for PackageId {
    fn from(value: String) -> Self {
        PackageId::new(value)
    }
}
