//! Page geometry for natively rendered documents

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Uniform margins
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            bottom: length,
            left: length,
            right: length,
        }
    }

    /// One inch on every side, the default for rendered documents
    pub fn one_inch() -> Self {
        Self::uniform(Length::from_inches(1.0))
    }
}

/// A page box with margins applied; all accessors return points.
#[derive(Debug, Clone, Copy)]
pub struct ContentBox {
    pub page: PageDimensions,
    pub margins: Margins,
}

impl ContentBox {
    pub fn new(page: PageDimensions, margins: Margins) -> Self {
        Self { page, margins }
    }

    /// Usable width in points
    pub fn width_pt(&self) -> f64 {
        self.page.width.pt() - self.margins.left.pt() - self.margins.right.pt()
    }

    /// Usable height in points
    pub fn height_pt(&self) -> f64 {
        self.page.height.pt() - self.margins.top.pt() - self.margins.bottom.pt()
    }

    /// X of the left content edge
    pub fn left_pt(&self) -> f64 {
        self.margins.left.pt()
    }

    /// Y of the top content edge (PDF origin is bottom-left)
    pub fn top_pt(&self) -> f64 {
        self.page.height.pt() - self.margins.top.pt()
    }

    /// Y of the bottom content edge
    pub fn bottom_pt(&self) -> f64 {
        self.margins.bottom.pt()
    }
}
