use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One rasterized page of a source PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the source document.
    pub page_number: usize,
    pub image_path: PathBuf,
    pub source_document_id: String,
}

/// Normalized Amazon-style order ID: `DDD-DDDDDDD-DDDDDDD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub const LEN: usize = 19;

    /// Wrap an already-normalized order ID string.
    pub fn new(normalized: impl Into<String>) -> Self {
        OrderId(normalized.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which grammar recovered a tracking number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingFormat {
    /// `TRK# 1234 5678 9012` style, 12 digits.
    Trk12,
    /// `TRACKING #: 1Z ...` style, 18 characters.
    Ups18,
    /// `USPS TRACKING #` style, 22 digits.
    Usps22,
}

impl TrackingFormat {
    pub fn expected_len(&self) -> usize {
        match self {
            TrackingFormat::Trk12 => 12,
            TrackingFormat::Ups18 => 18,
            TrackingFormat::Usps22 => 22,
        }
    }
}

impl fmt::Display for TrackingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingFormat::Trk12 => write!(f, "TRK"),
            TrackingFormat::Ups18 => write!(f, "UPS"),
            TrackingFormat::Usps22 => write!(f, "USPS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingNumber {
    pub value: String,
    pub format: TrackingFormat,
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// One OCR reading of an index line at a given resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpiSample {
    pub resolution_dpi: u32,
    pub recognized_order_id: String,
}

/// A packing slip and its shipping label, joined by order ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub tracking_number: TrackingNumber,
    pub ps_page: Page,
    pub sl_page: Page,
}

/// Role of a PDF, decided from the text of its first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PackingSlip,
    ShippingLabel,
    Unknown,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::PackingSlip => write!(f, "packing slip"),
            DocumentKind::ShippingLabel => write!(f, "shipping label"),
            DocumentKind::Unknown => write!(f, "unknown"),
        }
    }
}
