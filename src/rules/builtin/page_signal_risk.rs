use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

const INLINE_HANDLER_LIMIT: u32 = 50;

const IFRAME_LIMIT: u32 = 10;

/// NAV-006: page structure and collection health.
///
/// A timed-out or failed collection is penalized rather than ignored.
pub struct PageSignalRisk;

impl Extractor for PageSignalRisk {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-006".into(),
            name: "Page Signal Risk".into(),
            description: "Inline handler and iframe density, collection timeouts and errors"
                .into(),
            category: Category::PageStructure,
            signals: vec![
                Signal::InlineHandlers,
                Signal::ManyIframes,
                Signal::TimedOut,
                Signal::CollectionError,
            ],
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        let page = &input.page_signals;
        let hit = |signal| SignalHit::new(Category::PageStructure, signal);
        let mut hits = Vec::new();

        if page.inline_handler_count >= INLINE_HANDLER_LIMIT {
            hits.push(
                hit(Signal::InlineHandlers)
                    .with_detail(format!("{} inline handlers", page.inline_handler_count)),
            );
        }
        if page.iframe_count >= IFRAME_LIMIT {
            hits.push(hit(Signal::ManyIframes).with_detail(format!("{} iframes", page.iframe_count)));
        }
        if page.timed_out {
            hits.push(hit(Signal::TimedOut));
        }
        if let Some(error) = &page.collection_error {
            hits.push(hit(Signal::CollectionError).with_detail(error.clone()));
        }
        hits
    }
}
