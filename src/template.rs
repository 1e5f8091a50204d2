// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-host command templating.
//!
//! Commands may reference the host they run on through `{{ name }}`
//! placeholders. Supported names are `host`, `user` and `port`. Anything
//! beyond plain substitution (filters, blocks, expressions) is rejected.

use thiserror::Error;

use crate::node::HostTarget;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at byte {position} in '{template}'")]
    Unclosed { template: String, position: usize },

    #[error("empty placeholder at byte {position} in '{template}'")]
    Empty { template: String, position: usize },

    #[error("invalid placeholder '{{{{{name}}}}}' in '{template}'")]
    InvalidName { template: String, name: String },

    #[error("unknown variable '{name}' in '{template}' (expected one of: host, user, port)")]
    UnknownVariable { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(Variable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variable {
    Host,
    User,
    Port,
}

/// Values substituted into a template for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext<'a> {
    pub host: &'a str,
    pub user: &'a str,
    pub port: u16,
}

impl<'a> From<&'a HostTarget> for TemplateContext<'a> {
    fn from(target: &'a HostTarget) -> Self {
        Self {
            host: &target.host,
            user: &target.user,
            port: target.port,
        }
    }
}

/// A command template validated once and rendered per host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = raw;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let position = offset + open;
            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or_else(|| TemplateError::Unclosed {
                template: raw.to_string(),
                position,
            })?;

            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(TemplateError::Empty {
                    template: raw.to_string(),
                    position,
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::InvalidName {
                    template: raw.to_string(),
                    name: name.to_string(),
                });
            }
            let variable = match name {
                "host" => Variable::Host,
                "user" => Variable::User,
                "port" => Variable::Port,
                _ => {
                    return Err(TemplateError::UnknownVariable {
                        template: raw.to_string(),
                        name: name.to_string(),
                    })
                }
            };
            segments.push(Segment::Variable(variable));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when rendering never changes the command.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn render(&self, ctx: &TemplateContext<'_>) -> String {
        let mut out = String::with_capacity(self.raw.len() + ctx.host.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(Variable::Host) => out.push_str(ctx.host),
                Segment::Variable(Variable::User) => out.push_str(ctx.user),
                Segment::Variable(Variable::Port) => out.push_str(&ctx.port.to_string()),
            }
        }
        out
    }

    pub fn render_for(&self, target: &HostTarget) -> String {
        self.render(&TemplateContext::from(target))
    }
}

/// Render `template` for a single host identifier.
///
/// Only `{{host}}` is meaningful here; `user` and `port` render empty and
/// `22` respectively since no target is known.
pub fn render(template: &str, host: &str) -> Result<String, TemplateError> {
    let template = CommandTemplate::parse(template)?;
    Ok(template.render(&TemplateContext {
        host,
        user: "",
        port: crate::node::DEFAULT_SSH_PORT,
    }))
}
