use regex::{Captures, Regex};
use std::fmt;

use crate::config::VendorSignatures;
use crate::error::DelovableResult;

/// What a rule removes, used for reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ScriptSource,
    ScriptAttribute,
    InlineInit,
    MetaQualifiedName,
    MetaName,
    MetaProperty,
    Custom(String),
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::ScriptSource => write!(f, "vendor script source"),
            RuleKind::ScriptAttribute => write!(f, "vendor script attribute"),
            RuleKind::InlineInit => write!(f, "inline vendor initialization"),
            RuleKind::MetaQualifiedName => write!(f, "qualified vendor meta name"),
            RuleKind::MetaName => write!(f, "vendor meta name"),
            RuleKind::MetaProperty => write!(f, "vendor meta property"),
            RuleKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Extra condition a matched fragment must satisfy before it is removed
#[derive(Debug, Clone)]
pub enum Guard {
    /// Capture group `group` must contain `needle`
    CaptureContains { group: usize, needle: String },
}

impl Guard {
    fn allows(&self, caps: &Captures<'_>) -> bool {
        match self {
            Guard::CaptureContains { group, needle } => caps
                .get(*group)
                .is_some_and(|m| m.as_str().contains(needle.as_str())),
        }
    }
}

/// One independent removal step. Each pattern spans a whole element, from
/// its opening tag through its closing tag when it has one.
#[derive(Debug, Clone)]
pub struct MarkupRule {
    pub kind: RuleKind,
    pattern: Regex,
    guard: Option<Guard>,
}

impl MarkupRule {
    pub fn new(kind: RuleKind, pattern: &str) -> DelovableResult<Self> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
            guard: None,
        })
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Remove every non-overlapping match. Returns the new text and the
    /// number of fragments removed, or `None` when nothing was removed.
    pub fn apply(&self, text: &str) -> Option<(String, usize)> {
        let mut removed = 0;
        let result = self.pattern.replace_all(text, |caps: &Captures<'_>| {
            let hit = self.guard.as_ref().map_or(true, |guard| guard.allows(caps));
            if hit {
                removed += 1;
                String::new()
            } else {
                caps[0].to_string()
            }
        });

        if removed == 0 {
            None
        } else {
            Some((result.into_owned(), removed))
        }
    }
}

/// Attributes ahead of the one a rule looks for. Quoted values are consumed
/// whole so an attribute name inside a value never matches.
const ATTRS: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*?"#;

/// Rest of the start tag up to and including its `>`
const TAIL: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*>"#;

/// The built-in rule list, in application order. The qualified meta-name
/// rule runs before the broader one so it is never shadowed.
pub fn default_rules(signatures: &VendorSignatures) -> DelovableResult<Vec<MarkupRule>> {
    let marker = regex::escape(&signatures.marker);
    let attribute = regex::escape(&signatures.script_attribute);

    Ok(vec![
        MarkupRule::new(
            RuleKind::ScriptSource,
            &format!(
                r#"(?i)<script\b{ATTRS}\ssrc\s*=\s*["'][^"'>]*{marker}[^"'>]*["']{TAIL}[\s\S]*?</script\s*>"#
            ),
        )?,
        MarkupRule::new(
            RuleKind::ScriptAttribute,
            &format!(r#"(?i)<script\b{ATTRS}\s{attribute}{TAIL}[\s\S]*?</script\s*>"#),
        )?,
        MarkupRule::new(
            RuleKind::InlineInit,
            r#"(?i)<script\b[^>]*>([\s\S]*?)</script\s*>"#,
        )?
        .with_guard(Guard::CaptureContains {
            group: 1,
            needle: signatures.init_call.clone(),
        }),
        MarkupRule::new(
            RuleKind::MetaQualifiedName,
            &format!(r#"(?i)<meta\b{ATTRS}\sname\s*=\s*["']{marker}:[^"']*["']{TAIL}"#),
        )?,
        MarkupRule::new(
            RuleKind::MetaName,
            &format!(r#"(?i)<meta\b{ATTRS}\sname\s*=\s*["']{marker}[^"']*["']{TAIL}"#),
        )?,
        MarkupRule::new(
            RuleKind::MetaProperty,
            &format!(r#"(?i)<meta\b{ATTRS}\sproperty\s*=\s*["']{marker}:[^"']*["']{TAIL}"#),
        )?,
    ])
}
