//! Document extraction seam
//!
//! The upload flow hands document bytes to an extractor and feeds the
//! resulting W-2 fields into the same income-declaration transition as a
//! typed message. Real OCR lives behind this trait; the fixture extractor
//! stands in for it.

use async_trait::async_trait;

use taxpilot_common::api::ExtractedFields;
use taxpilot_common::error::{Error, Result};

/// Extracts structured W-2 fields from an uploaded document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_fields(&self, document: &[u8]) -> Result<ExtractedFields>;

    /// Whether the extractor's backing service is configured and reachable.
    fn is_available(&self) -> bool {
        true
    }
}

/// Demo-mode extractor: returns a fixed W-2 regardless of the document.
#[derive(Default)]
pub struct FixtureExtractor;

impl FixtureExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for FixtureExtractor {
    async fn extract_fields(&self, document: &[u8]) -> Result<ExtractedFields> {
        if document.is_empty() {
            return Err(Error::InvalidInput("empty document upload".to_string()));
        }

        Ok(ExtractedFields {
            employer: "Demo Employer Inc.".to_string(),
            ein: "12-3456789".to_string(),
            wages: 75_000.0,
            federal_withheld: 12_500.0,
            state_withheld: 3_750.0,
            social_security_wages: 75_000.0,
            social_security_tax: 4_650.0,
            medicare_wages: 75_000.0,
            medicare_tax: 1_087.5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_extractor_returns_demo_w2() {
        let extractor = FixtureExtractor::new();
        let fields = extractor.extract_fields(b"fake image bytes").await.unwrap();
        assert_eq!(fields.employer, "Demo Employer Inc.");
        assert_eq!(fields.wages, 75_000.0);
        assert_eq!(fields.federal_withheld, 12_500.0);
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let extractor = FixtureExtractor::new();
        let result = extractor.extract_fields(b"").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
