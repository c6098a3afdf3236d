//! The directive ("tag") definition table.
//!
//! Every `docci-*` token a fence line may carry is defined exactly once in
//! [`TAG_SPECS`]. The table drives three consumers: alias normalization in
//! the parser, typed-value parsing, and the self-documenting `docci tags`
//! command in the CLI. Adding a tag means adding one row here and one arm
//! to the parser's dispatch.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Prefix identifying a directive token on a fence-opener line.
pub const TAG_PREFIX: &str = "docci-";

/// The shape of the value a tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagValueKind {
    /// No value; the tag's presence is the signal.
    Flag,
    /// Base-10 integer.
    Int,
    /// Decimal number of seconds.
    Float,
    /// Free-form string (bare, or single/double quoted).
    String,
    /// Filesystem path.
    Path,
    /// `url|timeout_secs` pair.
    Endpoint,
    /// `old;new` replacement pair.
    Replace,
    /// `N` or `N-M` line range, 1-based inclusive.
    LineRange,
}

impl TagValueKind {
    /// Whether tokens of this kind must carry an `=value`.
    #[must_use]
    pub const fn expects_value(self) -> bool {
        !matches!(self, Self::Flag)
    }

    /// Short human-readable description of the expected value shape.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Flag => "no value",
            Self::Int => "integer",
            Self::Float => "seconds (decimal)",
            Self::String => "string",
            Self::Path => "path",
            Self::Endpoint => "url|timeout_secs",
            Self::Replace => "old;new",
            Self::LineRange => "N or N-M",
        }
    }
}

/// One row of the tag-definition table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TagSpec {
    /// Canonical tag name, including the `docci-` prefix.
    pub name: &'static str,
    /// Accepted aliases, normalized to `name` during parsing.
    pub aliases: &'static [&'static str],
    /// Value shape the tag accepts.
    #[serde(rename = "value")]
    pub kind: TagValueKind,
    /// One-line description shown by `docci tags`.
    pub description: &'static str,
}

/// The complete directive set. Order here is display order.
pub const TAG_SPECS: &[TagSpec] = &[
    TagSpec {
        name: "docci-ignore",
        aliases: &["docci-skip"],
        kind: TagValueKind::Flag,
        description: "Skip this block entirely",
    },
    TagSpec {
        name: "docci-output-contains",
        aliases: &["docci-contains"],
        kind: TagValueKind::String,
        description: "After execution, the block's captured output must contain this substring",
    },
    TagSpec {
        name: "docci-background",
        aliases: &["docci-bg"],
        kind: TagValueKind::Flag,
        description: "Launch the block asynchronously, logging to a per-block scratch file",
    },
    TagSpec {
        name: "docci-background-kill",
        aliases: &["docci-bg-kill"],
        kind: TagValueKind::Int,
        description: "Terminate the background block with the given global index",
    },
    TagSpec {
        name: "docci-assert-failure",
        aliases: &["docci-expect-failure"],
        kind: TagValueKind::Flag,
        description: "The block must exit non-zero; that failure counts as success",
    },
    TagSpec {
        name: "docci-os",
        aliases: &["docci-machine-os"],
        kind: TagValueKind::String,
        description: "Only run on the named host OS (linux / macos / windows)",
    },
    TagSpec {
        name: "docci-wait-for-endpoint",
        aliases: &[],
        kind: TagValueKind::Endpoint,
        description: "Before running, poll the URL by HTTP GET until 2xx or the timeout expires",
    },
    TagSpec {
        name: "docci-retry",
        aliases: &["docci-retry-count"],
        kind: TagValueKind::Int,
        description: "Attempt the block up to N+1 times if it exits non-zero",
    },
    TagSpec {
        name: "docci-delay-before",
        aliases: &[],
        kind: TagValueKind::Float,
        description: "Sleep this many seconds before the block runs",
    },
    TagSpec {
        name: "docci-delay-after",
        aliases: &[],
        kind: TagValueKind::Float,
        description: "Sleep this many seconds after the block runs",
    },
    TagSpec {
        name: "docci-delay-per-cmd",
        aliases: &["docci-cmd-delay"],
        kind: TagValueKind::Float,
        description: "Sleep this many seconds between each shell command of the block",
    },
    TagSpec {
        name: "docci-if-file-not-exists",
        aliases: &[],
        kind: TagValueKind::Path,
        description: "Skip the block when the named file already exists",
    },
    TagSpec {
        name: "docci-if-not-installed",
        aliases: &[],
        kind: TagValueKind::String,
        description: "Skip the block when the named command is already on PATH",
    },
    TagSpec {
        name: "docci-replace-text",
        aliases: &[],
        kind: TagValueKind::Replace,
        description: "Literal old;new substitution applied to the block body before emission",
    },
    TagSpec {
        name: "docci-file",
        aliases: &[],
        kind: TagValueKind::Path,
        description: "Treat the block body as file content operating on this file",
    },
    TagSpec {
        name: "docci-reset-file",
        aliases: &[],
        kind: TagValueKind::Flag,
        description: "Overwrite the docci-file target with the block body",
    },
    TagSpec {
        name: "docci-line-insert",
        aliases: &[],
        kind: TagValueKind::Int,
        description: "Insert the block body before the given line of the docci-file target",
    },
    TagSpec {
        name: "docci-line-replace",
        aliases: &[],
        kind: TagValueKind::LineRange,
        description: "Replace a line or inclusive line range of the docci-file target with the body",
    },
];

static TAG_LOOKUP: Lazy<HashMap<&'static str, &'static TagSpec>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for spec in TAG_SPECS {
        map.insert(spec.name, spec);
        for alias in spec.aliases {
            map.insert(*alias, spec);
        }
    }
    map
});

/// Resolve a tag name (canonical or alias) to its definition.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static TagSpec> {
    TAG_LOOKUP.get(name).copied()
}

/// Whether a fence-line token is a directive token.
#[must_use]
pub fn is_tag_token(token: &str) -> bool {
    token.starts_with(TAG_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_resolve() {
        for spec in TAG_SPECS {
            let found = lookup(spec.name).map(|s| s.name);
            assert_eq!(found, Some(spec.name));
        }
    }

    #[test]
    fn aliases_resolve_to_canonical() {
        assert_eq!(lookup("docci-bg").map(|s| s.name), Some("docci-background"));
        assert_eq!(
            lookup("docci-retry-count").map(|s| s.name),
            Some("docci-retry")
        );
        assert_eq!(lookup("docci-skip").map(|s| s.name), Some("docci-ignore"));
        assert_eq!(
            lookup("docci-cmd-delay").map(|s| s.name),
            Some("docci-delay-per-cmd")
        );
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert!(lookup("docci-bogus").is_none());
        assert!(lookup("output-contains").is_none());
    }

    #[test]
    fn names_and_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in TAG_SPECS {
            assert!(seen.insert(spec.name), "duplicate tag name {}", spec.name);
            for alias in spec.aliases {
                assert!(seen.insert(alias), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn all_names_carry_the_prefix() {
        for spec in TAG_SPECS {
            assert!(is_tag_token(spec.name));
            for alias in spec.aliases {
                assert!(is_tag_token(alias));
            }
        }
    }

    #[test]
    fn flags_take_no_value() {
        for spec in TAG_SPECS {
            if spec.kind == TagValueKind::Flag {
                assert!(!spec.kind.expects_value());
            } else {
                assert!(spec.kind.expects_value());
            }
        }
    }
}
