use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

static EVAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"eval\s*\(|new Function\(").unwrap());

static DOCUMENT_WRITE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"document\.write\s*\(").unwrap());

static ENDLESS_LOOP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"while\s*\(true\)|for\s*\(;;\)").unwrap());

static BASE64_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9+/]{200,}").unwrap());

/// Scripts shorter than this are never considered obfuscated.
const OBFUSCATION_MIN_CHARS: usize = 5000;

/// NAV-003: script text patterns.
///
/// Plain pattern matches over the script text. The obfuscation check is a
/// length-plus-base64-run approximation; nothing is decoded.
pub struct ScriptRisk;

impl Extractor for ScriptRisk {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-003".into(),
            name: "Script Risk".into(),
            description: "Dynamic code, document rewrites, endless loops and packed payloads"
                .into(),
            category: Category::Script,
            signals: vec![
                Signal::EvalUse,
                Signal::DocumentWrite,
                Signal::EndlessLoop,
                Signal::Obfuscation,
            ],
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        let text = input.script_text.as_str();
        if text.is_empty() {
            return Vec::new();
        }

        let hit = |signal| SignalHit::new(Category::Script, signal);
        let mut hits = Vec::new();

        if let Some(m) = EVAL_RE.find(text) {
            hits.push(hit(Signal::EvalUse).with_detail(m.as_str()));
        }
        if let Some(m) = DOCUMENT_WRITE_RE.find(text) {
            hits.push(hit(Signal::DocumentWrite).with_detail(m.as_str()));
        }
        if let Some(m) = ENDLESS_LOOP_RE.find(text) {
            hits.push(hit(Signal::EndlessLoop).with_detail(m.as_str()));
        }

        let chars = text.chars().count();
        if chars > OBFUSCATION_MIN_CHARS {
            if let Some(m) = BASE64_RUN_RE.find(text) {
                hits.push(hit(Signal::Obfuscation).with_detail(format!(
                    "{} chars with a {}-char base64 run",
                    chars,
                    m.len()
                )));
            }
        }
        hits
    }
}
