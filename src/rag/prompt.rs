//! Prompt template with `{context}` and `{question}` slots.

use crate::core::errors::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Context,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

/// Parsed once at startup; rendering never re-scans substituted text.
///
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> PipelineResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '}' {
                            closed = true;
                            break;
                        }
                        name.push(next);
                    }
                    if !closed {
                        return Err(PipelineError::Template(format!(
                            "unclosed '{{' before '{}'",
                            name
                        )));
                    }
                    let slot = match name.trim() {
                        "context" => Slot::Context,
                        "question" => Slot::Question,
                        other => {
                            return Err(PipelineError::Template(format!(
                                "unknown slot '{{{}}}'; only {{context}} and {{question}} are supported",
                                other
                            )))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(slot));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        for (slot, name) in [(Slot::Context, "context"), (Slot::Question, "question")] {
            if !segments.contains(&Segment::Slot(slot)) {
                return Err(PipelineError::Template(format!(
                    "template is missing the {{{}}} slot",
                    name
                )));
            }
        }

        Ok(Self { segments })
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(Slot::Context) => out.push_str(context),
                Segment::Slot(Slot::Question) => out.push_str(question),
            }
        }
        out
    }
}
