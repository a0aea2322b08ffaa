pub mod rules;

use aho_corasick::AhoCorasick;
use std::borrow::Cow;

pub use rules::{Guard, MarkupRule, RuleKind};

use crate::config::VendorSignatures;
use crate::error::{ConfigError, DelovableResult};

/// Upper bound on full rule passes over one document
const MAX_PASSES: usize = 8;

/// Number of fragments one rule removed from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule: RuleKind,
    pub count: usize,
}

/// Outcome of cleaning one markup document
#[derive(Debug, Clone)]
pub struct MarkupCleanup<'a> {
    pub text: Cow<'a, str>,
    pub hits: Vec<RuleHit>,
}

impl MarkupCleanup<'_> {
    pub fn changed(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn removed(&self) -> usize {
        self.hits.iter().map(|h| h.count).sum()
    }

    fn record(&mut self, rule: &RuleKind, count: usize) {
        match self.hits.iter_mut().find(|h| &h.rule == rule) {
            Some(hit) => hit.count += count,
            None => self.hits.push(RuleHit {
                rule: rule.clone(),
                count,
            }),
        }
    }
}

/// Removes vendor script and meta elements from HTML text.
///
/// Rules run one after another, each over the output of the previous one,
/// and the whole sequence repeats until a pass removes nothing. Nothing
/// outside a removed span is touched, and a document without hits is handed
/// back borrowed.
///
/// There is no HTML parser behind this: a tag shape carrying the marker
/// inside a comment or a string literal is removed like any other.
/// Attribute names are only matched outside quoted values.
#[derive(Debug, Clone)]
pub struct MarkupCleaner {
    rules: Vec<MarkupRule>,
    prefilter: AhoCorasick,
}

impl MarkupCleaner {
    pub fn new(signatures: &VendorSignatures) -> DelovableResult<Self> {
        let rules = rules::default_rules(signatures)?;
        let needles = [
            signatures.marker.as_str(),
            signatures.script_attribute.as_str(),
            signatures.init_call.as_str(),
        ];
        Self::with_rules(rules, &needles)
    }

    /// Build from an explicit rule list. Documents containing none of
    /// `needles` (ASCII case-insensitive) skip the rules entirely; pass an
    /// empty slice to always run them.
    pub fn with_rules(rules: Vec<MarkupRule>, needles: &[&str]) -> DelovableResult<Self> {
        let needles: Vec<&str> = needles.iter().copied().filter(|n| !n.is_empty()).collect();
        let prefilter = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&needles)
            .map_err(|e| ConfigError::Invalid(format!("markup prefilter: {}", e)))?;

        Ok(Self { rules, prefilter })
    }

    pub fn clean<'a>(&self, text: &'a str) -> MarkupCleanup<'a> {
        let mut cleanup = MarkupCleanup {
            text: Cow::Borrowed(text),
            hits: Vec::new(),
        };

        if self.prefilter.patterns_len() > 0 && !self.prefilter.is_match(text) {
            return cleanup;
        }

        // a removal can join the halves of another vendor fragment, so
        // repeat the ordered pass until it finds nothing
        for _ in 0..MAX_PASSES {
            let mut pass_hits = 0;

            for rule in &self.rules {
                if let Some((next, count)) = rule.apply(&cleanup.text) {
                    tracing::debug!(rule = %rule.kind, count, "removed vendor markup");
                    cleanup.text = Cow::Owned(next);
                    cleanup.record(&rule.kind, count);
                    pass_hits += count;
                }
            }

            if pass_hits == 0 {
                break;
            }
        }

        cleanup
    }
}

impl Default for MarkupCleaner {
    fn default() -> Self {
        // the built-in signatures always compile
        Self::new(&VendorSignatures::default()).expect("built-in markup rules compile")
    }
}
