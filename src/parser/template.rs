use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// A placeholder is a whole path segment of the form `%(name)s`.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^%\((?P<name>\w+)\)s$").expect("placeholder pattern compiles"))
}

/// Service-path template with `%(name)s` placeholders.
/// template: "Member/%(idMember)s/Territories/"
/// Placeholder names are parsed once at construction and cached on the value.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    placeholders: BTreeSet<String>,
}

impl PathTemplate {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let placeholders = raw
            .split('/')
            .filter_map(|segment| placeholder_re().captures(segment))
            .map(|caps| caps["name"].to_string())
            .collect();
        Self { raw, placeholders }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Placeholder names required to render this template.
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Partition open call arguments into (template args, transport args).
    /// Keys naming a placeholder go left, everything else goes right.
    pub fn split_args(
        &self,
        kwargs: &BTreeMap<String, String>,
    ) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut template_args = BTreeMap::new();
        let mut transport_args = BTreeMap::new();
        for (key, value) in kwargs {
            if self.placeholders.contains(key) {
                template_args.insert(key.clone(), value.clone());
            } else {
                transport_args.insert(key.clone(), value.clone());
            }
        }
        (template_args, transport_args)
    }

    /// Substitute `args` into the template.
    /// Fails if any placeholder has no matching key.
    pub fn render(&self, args: &BTreeMap<String, String>) -> Result<String> {
        let segments = self
            .raw
            .split('/')
            .map(|segment| match placeholder_re().captures(segment) {
                Some(caps) => {
                    let name = &caps["name"];
                    args.get(name).cloned().ok_or_else(|| {
                        anyhow!("unresolved placeholder '{}' in template '{}'", name, self.raw)
                    })
                }
                None => Ok(segment.to_string()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(segments.join("/"))
    }
}
