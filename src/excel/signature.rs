//! Magic-byte pre-check for uploaded files.
//!
//! A cheap format sniff, not a structural validation: it exists to reject
//! obviously-wrong uploads before paying for a full workbook parse.

/// Maximum accepted upload size: 50 MB.
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// ZIP-family signatures: local file header, empty archive, spanned archive.
/// Modern .xlsx workbooks are ZIP containers.
const ZIP_MAGICS: [[u8; 4]; 3] = [
    [0x50, 0x4B, 0x03, 0x04],
    [0x50, 0x4B, 0x05, 0x06],
    [0x50, 0x4B, 0x07, 0x08],
];

/// OLE2 compound-document signature. Legacy .xls workbooks.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Outcome of the pre-parse sniff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    pub ok: bool,
    pub reason: Option<String>,
}

impl SignatureCheck {
    fn pass() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check that the raw upload is within the size cap and starts with one of
/// the known Excel container signatures.
pub fn check_signature(bytes: &[u8]) -> SignatureCheck {
    if bytes.len() > MAX_UPLOAD_SIZE {
        return SignatureCheck::fail(format!(
            "file exceeds the {} MB limit",
            MAX_UPLOAD_SIZE / (1024 * 1024)
        ));
    }

    if bytes.len() >= 8 && bytes[..8] == OLE_MAGIC {
        return SignatureCheck::pass();
    }
    if bytes.len() >= 4 && ZIP_MAGICS.iter().any(|magic| bytes[..4] == *magic) {
        return SignatureCheck::pass();
    }

    SignatureCheck::fail("not a recognized Excel container (expected a ZIP or OLE2 signature)")
}
