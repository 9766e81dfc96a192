//! Minimal Dockerfile model: only what pipeline assembly needs.
//!
//! The content is kept verbatim so it can be emitted on a build definition;
//! instructions are parsed once at construction.

use serde::Serialize;

use crate::domain::{DomainError, PortSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dockerfile {
    content: String,
    #[serde(skip)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Instruction {
    keyword: String,
    args: String,
}

impl Dockerfile {
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let instructions = parse_instructions(&content);
        Self {
            content,
            instructions,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Base image of the final stage.
    ///
    /// Stage aliases (`FROM x AS builder` ... `FROM builder`) are followed
    /// back to the image they name.
    pub fn base_image(&self) -> Option<String> {
        let mut aliases: Vec<(String, String)> = Vec::new();
        let mut last: Option<String> = None;

        for ins in self.instructions.iter().filter(|i| i.keyword == "FROM") {
            let mut words = ins.args.split_whitespace().filter(|w| !w.starts_with("--"));
            let Some(image) = words.next() else { continue };

            let resolved = aliases
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(image))
                .map(|(_, base)| base.clone())
                .unwrap_or_else(|| image.to_string());

            if let (Some(kw), Some(alias)) = (words.next(), words.next()) {
                if kw.eq_ignore_ascii_case("as") {
                    aliases.push((alias.to_string(), resolved.clone()));
                }
            }
            last = Some(resolved);
        }
        last
    }

    /// Like [`base_image`](Self::base_image) but fails with the repository's
    /// display identity when there is no `FROM`.
    pub fn require_base_image(&self, repository: &str) -> Result<String, DomainError> {
        self.base_image().ok_or_else(|| DomainError::MissingFrom {
            repository: repository.to_string(),
        })
    }

    /// Ports declared with `EXPOSE` in the final stage, sorted and
    /// de-duplicated. Unparseable entries (build args, ranges) are ignored.
    pub fn exposed_ports(&self) -> Vec<PortSpec> {
        let start = self
            .instructions
            .iter()
            .rposition(|i| i.keyword == "FROM")
            .map_or(0, |i| i + 1);

        let mut ports: Vec<PortSpec> = self.instructions[start..]
            .iter()
            .filter(|i| i.keyword == "EXPOSE")
            .flat_map(|i| i.args.split_whitespace())
            .filter_map(|p| p.parse().ok())
            .collect();
        ports.sort();
        ports.dedup();
        ports
    }
}

fn parse_instructions(content: &str) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut pending = String::new();

    for raw in content.lines() {
        let line = raw.trim();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#')) {
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            pending.push(' ');
            continue;
        }
        pending.push_str(line);
        push_instruction(&mut out, &pending);
        pending.clear();
    }
    if !pending.trim().is_empty() {
        push_instruction(&mut out, &pending);
    }
    out
}

fn push_instruction(out: &mut Vec<Instruction>, line: &str) {
    let line = line.trim();
    let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    out.push(Instruction {
        keyword: keyword.to_ascii_uppercase(),
        args: args.trim().to_string(),
    });
}
