use crate::engine::{DocumentHandle, DocumentService, EngineError};
use crate::SpellError;

/// Turn every flagged span of an open document into a record.
///
/// Records are pushed onto `out` as soon as they are complete, so on error
/// the spans handled before the failure stay in `out`.
pub fn scan_document(
    service: &mut dyn DocumentService,
    doc: DocumentHandle,
    file_name: &str,
    out: &mut Vec<SpellError>,
) -> Result<usize, EngineError> {
    let spans = service.flagged_spans(doc)?;
    let mut count = 0;

    for span in &spans {
        let location = service.span_location(doc, span)?;
        let suggestions = service.suggestions(doc, span)?;

        out.push(SpellError {
            document_file_name: file_name.to_string(),
            misspelled_text: span.text.clone(),
            page_number: location.page.max(1),
            line_number: location.line.max(1),
            position: location.start,
            suggested_words: suggestions.join(", "),
        });
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FlaggedSpan, SpanLocation};
    use std::path::Path;

    /// Flags fixed words; fails when asked for suggestions of `fail_on`.
    struct Scripted {
        words: Vec<&'static str>,
        fail_on: Option<&'static str>,
    }

    impl DocumentService for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }
        fn start(&mut self) -> Result<(), EngineError> {
            Ok(())
        }
        fn open(&mut self, _path: &Path) -> Result<DocumentHandle, EngineError> {
            Ok(DocumentHandle(1))
        }
        fn flagged_spans(&mut self, _doc: DocumentHandle) -> Result<Vec<FlaggedSpan>, EngineError> {
            Ok(self
                .words
                .iter()
                .enumerate()
                .map(|(index, w)| FlaggedSpan {
                    index,
                    text: w.to_string(),
                })
                .collect())
        }
        fn span_location(
            &mut self,
            _doc: DocumentHandle,
            span: &FlaggedSpan,
        ) -> Result<SpanLocation, EngineError> {
            Ok(SpanLocation {
                page: 1,
                line: span.index as u32 + 1,
                start: span.index as u64 * 10,
            })
        }
        fn suggestions(
            &mut self,
            _doc: DocumentHandle,
            span: &FlaggedSpan,
        ) -> Result<Vec<String>, EngineError> {
            if Some(span.text.as_str()) == self.fail_on {
                return Err(EngineError::Protocol("engine crashed".to_string()));
            }
            if span.text == "zzxq" {
                return Ok(Vec::new());
            }
            Ok(vec!["the".to_string(), "tech".to_string()])
        }
        fn close(&mut self, _doc: DocumentHandle) {}
        fn shutdown(&mut self) {}
    }

    #[test]
    fn test_one_record_per_span_in_order() {
        let mut service = Scripted {
            words: vec!["teh", "zzxq", "teh"],
            fail_on: None,
        };
        let mut out = Vec::new();

        let count = scan_document(&mut service, DocumentHandle(1), "report.docx", &mut out).unwrap();

        assert_eq!(count, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].document_file_name, "report.docx");
        assert_eq!(out[0].misspelled_text, "teh");
        assert_eq!(out[0].suggested_words, "the, tech");
        assert_eq!(out[1].suggested_words, "");
        assert_eq!(out[2].line_number, 3);
        assert_eq!(out[2].position, 20);
    }

    #[test]
    fn test_failure_keeps_partial_records() {
        let mut service = Scripted {
            words: vec!["teh", "boom", "later"],
            fail_on: Some("boom"),
        };
        let mut out = Vec::new();

        let result = scan_document(&mut service, DocumentHandle(1), "a.docx", &mut out);

        assert!(result.is_err());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].misspelled_text, "teh");
    }
}
