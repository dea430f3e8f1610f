use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Barcode symbologies the metadata detector is allowed to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Qr,
    Ean8,
    Ean13,
    Pdf417,
    Aztec,
    Code128,
    Code39,
    Code93,
    DataMatrix,
    Interleaved2of5,
    Itf14,
    Upce,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 12] = [
        BarcodeFormat::Qr,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Interleaved2of5,
        BarcodeFormat::Itf14,
        BarcodeFormat::Upce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BarcodeFormat::Qr => "qr",
            BarcodeFormat::Ean8 => "ean8",
            BarcodeFormat::Ean13 => "ean13",
            BarcodeFormat::Pdf417 => "pdf417",
            BarcodeFormat::Aztec => "aztec",
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::Code93 => "code93",
            BarcodeFormat::DataMatrix => "data_matrix",
            BarcodeFormat::Interleaved2of5 => "interleaved2of5",
            BarcodeFormat::Itf14 => "itf14",
            BarcodeFormat::Upce => "upce",
        }
    }

    /// Stable numeric code used across the C ABI.
    pub fn code(self) -> u32 {
        BarcodeFormat::ALL
            .iter()
            .position(|f| *f == self)
            .map(|i| i as u32)
            .unwrap_or(u32::MAX)
    }

    pub fn from_code(code: u32) -> Option<BarcodeFormat> {
        BarcodeFormat::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown barcode format '{}'", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for BarcodeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        BarcodeFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// A value decoded from one machine-readable code in a camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCode {
    pub format: BarcodeFormat,
    pub value: String,
}

impl DecodedCode {
    pub fn new(format: BarcodeFormat, value: impl Into<String>) -> Self {
        Self {
            format,
            value: value.into(),
        }
    }
}

/// One entry of a metadata batch delivered by the detector.
///
/// Detectors can report things that are not machine-readable codes (faces,
/// bodies, salient objects). Those never qualify for acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataObject {
    Code(DecodedCode),
    Other(String),
}

impl MetadataObject {
    /// The decoded code if this entry is a readable machine code with a
    /// non-empty value.
    pub fn readable(&self) -> Option<&DecodedCode> {
        match self {
            MetadataObject::Code(code) if !code.value.is_empty() => Some(code),
            _ => None,
        }
    }
}

impl From<DecodedCode> for MetadataObject {
    fn from(code: DecodedCode) -> Self {
        MetadataObject::Code(code)
    }
}
