// ── Capability-document parser seam ──
//
// The registry never looks inside a capability document: it hands the
// raw body to a parser collaborator and receives either a structured
// [`Capabilities`] record or an error string. A parse failure is
// treated exactly like a transport failure by the probe sweep.

use crate::model::Capabilities;

/// Turns a raw capability-document body into a [`Capabilities`] record.
///
/// Implementations are injected into [`Registry::start`](crate::Registry::start);
/// the error string is only ever logged, never shown to consumers.
pub trait CapabilityParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Capabilities, String>;
}

/// Serde-backed parser for JSON capability documents.
///
/// Stands in for a full eSCL XML parser: the registry, prober, and
/// option model are format-agnostic, so tests and the CLI drive them
/// through this implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCapabilityParser;

impl CapabilityParser for JsonCapabilityParser {
    fn parse(&self, raw: &[u8]) -> Result<Capabilities, String> {
        serde_json::from_slice(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{ColorMode, Resolutions, Source};

    #[test]
    fn parses_a_well_formed_document() {
        let doc = serde_json::json!({
            "vendor": "ACME",
            "model": "Scan-o-matic 9000",
            "sources": {
                "Platen": {
                    "color_modes": ["Color", "Grayscale"],
                    "resolutions": { "Discrete": [100, 300, 600] },
                    "tl_x": { "min": 0.0, "max": 10.0 },
                    "tl_y": { "min": 0.0, "max": 10.0 },
                    "br_x": { "min": 0.0, "max": 215.9 },
                    "br_y": { "min": 0.0, "max": 297.0 }
                }
            }
        });

        let caps = JsonCapabilityParser
            .parse(doc.to_string().as_bytes())
            .unwrap();
        assert_eq!(caps.vendor, "ACME");
        assert_eq!(caps.first_source(), Some(Source::Platen));

        let src = &caps.sources[&Source::Platen];
        assert_eq!(src.color_modes, vec![ColorMode::Color, ColorMode::Grayscale]);
        assert_eq!(src.resolutions, Resolutions::Discrete(vec![100, 300, 600]));
    }

    #[test]
    fn garbage_is_an_error_string() {
        assert!(JsonCapabilityParser.parse(b"<html>not caps</html>").is_err());
    }
}
