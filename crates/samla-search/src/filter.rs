use serde::Serialize;

/// Which catalog field(s) a structured filter is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// No prefix: free text across every searchable field.
    None,
    Box,
    Product,
    Manufacturer,
    Tag,
    Location,
}

/// Recognised query prefixes. Each includes its trailing space, so `@tag`
/// on its own is ordinary free text.
const PREFIXES: &[(&str, FilterKind)] = &[
    ("@box ", FilterKind::Box),
    ("@produkt ", FilterKind::Product),
    ("@product ", FilterKind::Product),
    ("@hersteller ", FilterKind::Manufacturer),
    ("@tag ", FilterKind::Tag),
    ("@ort ", FilterKind::Location),
    ("@standort ", FilterKind::Location),
];

/// A parsed search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub kind: FilterKind,
    pub term: String,
}

impl SearchFilter {
    /// Parse a raw query string.
    ///
    /// A leading prefix (matched case-insensitively) turns the rest of the
    /// string into the filter term; otherwise the whole trimmed string is
    /// free text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let query = raw.trim();

        for (prefix, kind) in PREFIXES {
            let matches = query
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
            if matches {
                return Self {
                    kind: *kind,
                    term: query[prefix.len()..].trim().to_string(),
                };
            }
        }

        Self {
            kind: FilterKind::None,
            term: query.to_string(),
        }
    }

    /// True for an unprefixed, non-empty query: the only case that gets
    /// subsequence refinement.
    #[must_use]
    pub fn is_free_text(&self) -> bool {
        self.kind == FilterKind::None && !self.term.is_empty()
    }
}
