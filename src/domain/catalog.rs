use once_cell::sync::Lazy;

/// Make → model associations offered by the vehicle-information step. Model
/// choices narrow once a make is chosen; a make unknown to the catalog offers
/// no suggestions and accepts free-text models.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<(String, Vec<String>)>,
}

static DEFAULT_ENTRIES: Lazy<Vec<(String, Vec<String>)>> = Lazy::new(|| {
    [
        (
            "TOYOTA",
            &["Camry", "Corolla", "RAV4", "Highlander", "Sienna", "Hilux"][..],
        ),
        ("HONDA", &["Accord", "Civic", "CR-V", "Pilot", "Odyssey"][..]),
        ("LEXUS", &["RX 350", "ES 350", "GX 460", "LX 570"][..]),
        (
            "MERCEDES-BENZ",
            &["C300", "E350", "GLE 350", "ML 350", "GLK 350"][..],
        ),
        ("FORD", &["Explorer", "Edge", "Escape", "F-150"][..]),
        ("HYUNDAI", &["Elantra", "Sonata", "Tucson", "Santa Fe"][..]),
        ("KIA", &["Optima", "Sorento", "Sportage", "Rio"][..]),
    ]
    .into_iter()
    .map(|(make, models)| {
        (
            make.to_string(),
            models.iter().map(|model| model.to_string()).collect(),
        )
    })
    .collect()
});

impl ModelCatalog {
    /// Catalog of the makes most commonly moving through the terminals.
    pub fn builtin() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.clone(),
        }
    }

    pub fn with_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn makes(&self) -> Vec<&str> {
        self.entries.iter().map(|(make, _)| make.as_str()).collect()
    }

    /// Models associated with a make; empty when the make is unknown.
    pub fn models_for(&self, make: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(make.trim()))
            .map(|(_, models)| models.as_slice())
            .unwrap_or(&[])
    }

    pub fn knows_make(&self, make: &str) -> bool {
        !self.models_for(make).is_empty()
    }

    /// Whether a model is valid for a make. Unknown makes accept any model.
    pub fn permits(&self, make: &str, model: &str) -> bool {
        let models = self.models_for(make);
        if models.is_empty() {
            return true;
        }
        models
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(model.trim()))
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
