//! Brazilian macro-regions for geographic filtering.
//!
//! A question that names a region ("como vão as vendas na região nordeste?")
//! restricts the working subset to customers in that region's states before
//! any metric runs.

/// A macro-region: the lowercase token matched in question text, the
/// display form used in answers, and the member state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub display_name: &'static str,
    pub states: &'static [&'static str],
}

/// The five regions, in match-priority order.
pub const REGIONS: [Region; 5] = [
    Region {
        name: "norte",
        display_name: "Norte",
        states: &["AM", "RR", "AP", "PA", "TO", "RO", "AC"],
    },
    Region {
        name: "nordeste",
        display_name: "Nordeste",
        states: &["MA", "PI", "CE", "RN", "PB", "PE", "AL", "SE", "BA"],
    },
    Region {
        name: "sudeste",
        display_name: "Sudeste",
        states: &["SP", "RJ", "MG", "ES"],
    },
    Region {
        name: "sul",
        display_name: "Sul",
        states: &["PR", "SC", "RS"],
    },
    Region {
        name: "centro-oeste",
        display_name: "Centro-oeste",
        states: &["MT", "MS", "GO", "DF"],
    },
];

/// Find the region a question refers to, if any.
///
/// Substring match on the lowercased text; the first region in [`REGIONS`]
/// order wins when more than one is named.
pub fn match_region(question: &str) -> Option<&'static Region> {
    let question = question.to_lowercase();
    REGIONS.iter().find(|r| question.contains(r.name))
}

/// Look up a region by its lowercase name (CLI `--region` flag).
pub fn by_name(name: &str) -> Option<&'static Region> {
    let name = name.to_lowercase();
    REGIONS.iter().find(|r| r.name == name)
}

impl Region {
    pub fn contains_state(&self, uf: &str) -> bool {
        self.states.contains(&uf)
    }
}
