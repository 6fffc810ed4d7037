use serde::{Deserialize, Serialize};

/// Page orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_xlsx_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Paper size, as the SpreadsheetML `paperSize` code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSize(pub u16);

impl PaperSize {
    pub const LETTER: PaperSize = PaperSize(1);
    pub const A4: PaperSize = PaperSize(9);
}

impl Default for PaperSize {
    fn default() -> Self {
        PaperSize::LETTER
    }
}

/// Page margins in inches.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        // Excel's "Normal" margin preset.
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Per-sheet print settings.
///
/// Presentation-only: nothing in the report semantics depends on these, they
/// only control how the generated ledger paginates when printed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct PageSetup {
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub paper_size: PaperSize,
    /// Fit-to-page scaling: number of pages wide/tall. `None` disables
    /// fit-to-page for that axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_to_width: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_to_height: Option<u16>,
    /// Center the print area horizontally on the page.
    #[serde(default)]
    pub horizontal_centered: bool,
    #[serde(default)]
    pub margins: PageMargins,
}

impl PageSetup {
    /// Returns true if either fit-to-page axis is enabled.
    pub fn fit_to_page(&self) -> bool {
        self.fit_to_width.is_some() || self.fit_to_height.is_some()
    }

    /// Returns true if every field is at its default (nothing to serialize).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
