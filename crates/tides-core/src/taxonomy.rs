//! Controlled classification vocabulary and class→subclass taxonomy.
//!
//! The top-level vocabulary is fixed; sub-classes are free text scoped to a
//! top-level class and may lag behind what pipelines emit. A sub-class miss
//! is therefore always a soft result: lookups return `None`, never an error,
//! so classification recording can proceed while the taxonomy catches up.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label used for classifications outside the controlled vocabulary.
pub const OTHER_LABEL: &str = "Other";

/// A top-level class and its known sub-classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyClass {
    pub name: String,
    pub subclasses: Vec<String>,
}

/// A persisted sub-class row, scoped to its parent class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySubclass {
    pub id: i64,
    pub main_class: String,
    pub name: String,
}

/// In-memory class→subclass taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTaxonomy {
    classes: Vec<TaxonomyClass>,
}

impl ClassTaxonomy {
    /// Build a taxonomy from explicit classes.
    pub fn new(classes: Vec<TaxonomyClass>) -> Self {
        Self { classes }
    }

    /// The survey's default vocabulary, matching the seeded database taxonomy.
    pub fn survey_default() -> Self {
        fn class(name: &str, subclasses: &[&str]) -> TaxonomyClass {
            TaxonomyClass {
                name: name.to_string(),
                subclasses: subclasses.iter().map(|s| s.to_string()).collect(),
            }
        }
        Self::new(vec![
            class(
                "SN",
                &["SN Ia", "SN Ib", "SN Ic", "SN II", "SN IIn", "SN IIb"],
            ),
            class("SLSN", &["SLSN-I", "SLSN-II"]),
            class("TDE", &[]),
            class("KN", &[]),
            class("AGN", &[]),
            class("CV", &[]),
            class("Galaxy", &[]),
            class("Star", &[]),
            class(OTHER_LABEL, &[]),
        ])
    }

    /// All top-level classes.
    pub fn classes(&self) -> &[TaxonomyClass] {
        &self.classes
    }

    /// Whether `name` is a top-level class in the vocabulary.
    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.name == name)
    }

    /// Known sub-classes for a top-level class, or `None` for an unknown class.
    pub fn subclasses(&self, main_class: &str) -> Option<&[String]> {
        self.classes
            .iter()
            .find(|c| c.name == main_class)
            .map(|c| c.subclasses.as_slice())
    }

    /// Resolve a free-text sub-class by exact match, scoped to `main_class`.
    ///
    /// Returns `None` both for an unknown class and for an unknown sub-class;
    /// callers log the miss and continue.
    pub fn resolve_subclass(&self, main_class: &str, subclass: &str) -> Option<&str> {
        self.subclasses(main_class)?
            .iter()
            .find(|s| s.as_str() == subclass)
            .map(|s| s.as_str())
    }

    /// Validate a human submission label against the vocabulary.
    ///
    /// A label is accepted when it names a top-level class; `Other` further
    /// requires a sub-class or free text so the assertion carries content.
    pub fn validate_label(
        &self,
        label: &str,
        subclass: Option<&str>,
        other_text: Option<&str>,
    ) -> Result<()> {
        if !self.contains_class(label) {
            return Err(Error::Validation(format!(
                "label '{label}' is not in the classification vocabulary"
            )));
        }
        if label == OTHER_LABEL
            && subclass.is_none()
            && other_text.map_or(true, |t| t.trim().is_empty())
        {
            return Err(Error::Validation(
                "label 'Other' requires a subclass or free text".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ClassTaxonomy {
    fn default() -> Self {
        Self::survey_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_contains_survey_classes() {
        let tax = ClassTaxonomy::survey_default();
        for name in ["SN", "SLSN", "TDE", "KN", "AGN", "Other"] {
            assert!(tax.contains_class(name), "missing class {name}");
        }
        assert!(!tax.contains_class("FRB"));
    }

    #[test]
    fn test_resolve_subclass_exact_match() {
        let tax = ClassTaxonomy::survey_default();
        assert_eq!(tax.resolve_subclass("SN", "SN Ia"), Some("SN Ia"));
    }

    #[test]
    fn test_resolve_subclass_is_class_scoped() {
        let tax = ClassTaxonomy::survey_default();
        // "SN Ia" exists, but not under TDE.
        assert_eq!(tax.resolve_subclass("TDE", "SN Ia"), None);
    }

    #[test]
    fn test_resolve_subclass_miss_is_soft() {
        let tax = ClassTaxonomy::survey_default();
        assert_eq!(tax.resolve_subclass("SN", "SN Iax"), None);
        assert_eq!(tax.resolve_subclass("NotAClass", "SN Ia"), None);
    }

    #[test]
    fn test_validate_label_vocabulary() {
        let tax = ClassTaxonomy::survey_default();
        assert!(tax.validate_label("SN", None, None).is_ok());
        assert!(tax.validate_label("TDE", None, None).is_ok());
        assert!(tax.validate_label("SNIa", None, None).is_err());
        assert!(tax.validate_label("", None, None).is_err());
    }

    #[test]
    fn test_validate_other_requires_content() {
        let tax = ClassTaxonomy::survey_default();
        assert!(tax.validate_label("Other", None, None).is_err());
        assert!(tax.validate_label("Other", None, Some("  ")).is_err());
        assert!(tax
            .validate_label("Other", None, Some("peculiar Ca-rich"))
            .is_ok());
        assert!(tax.validate_label("Other", Some("ILRT"), None).is_ok());
    }
}
