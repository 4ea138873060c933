//! Robots.txt parser implementation
//!
//! Only `User-agent`, `Allow` and `Disallow` are understood. Rules are kept
//! for the wildcard group and for the crawler's own agent, in file order.

use std::fmt;

/// Whether a rule permits or forbids its path prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Allow,
    Disallow,
}

impl RuleKind {
    fn directive(&self) -> &'static str {
        match self {
            RuleKind::Allow => "Allow",
            RuleKind::Disallow => "Disallow",
        }
    }
}

/// A single retained Allow/Disallow rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRule {
    pub kind: RuleKind,
    pub path: String,
}

impl fmt::Display for RobotsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.directive(), self.path)
    }
}

/// Parsed robots.txt rules relevant to one user agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    rules: Vec<RobotsRule>,
}

impl RobotsRules {
    /// Creates an empty rule set, which allows everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses raw robots.txt content, keeping rules that apply to `user_agent`
    ///
    /// # Example
    ///
    /// ```
    /// use webcrawler::robots::RobotsRules;
    ///
    /// let rules = RobotsRules::parse("User-agent: *\nDisallow: /admin", "mybot");
    /// assert!(!rules.is_allowed("/admin/users"));
    /// assert!(rules.is_allowed("/"));
    /// ```
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let mut rules = Vec::new();
        let mut current_agent: Option<String> = None;

        for line in content.split('\n') {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = parse_directive(line) else {
                continue;
            };

            if key.eq_ignore_ascii_case("user-agent") {
                current_agent = Some(value.to_string());
                continue;
            }

            let kind = if key.eq_ignore_ascii_case("allow") {
                RuleKind::Allow
            } else if key.eq_ignore_ascii_case("disallow") {
                RuleKind::Disallow
            } else {
                continue;
            };

            let applies = current_agent
                .as_deref()
                .is_some_and(|agent| agent == "*" || agent.eq_ignore_ascii_case(user_agent));
            if applies {
                rules.push(RobotsRule {
                    kind,
                    path: value.to_string(),
                });
            }
        }

        Self { rules }
    }

    /// Reads rules previously written by [`RobotsRules::to_stored_text`]
    pub fn from_stored_text(stored: &str) -> Self {
        let rules = stored
            .lines()
            .filter_map(|line| {
                let (key, value) = parse_directive(line.trim())?;
                let kind = match key {
                    "Allow" => RuleKind::Allow,
                    "Disallow" => RuleKind::Disallow,
                    _ => return None,
                };
                Some(RobotsRule {
                    kind,
                    path: value.to_string(),
                })
            })
            .collect();

        Self { rules }
    }

    /// Serializes the rules one per line, as stored on the domain
    pub fn to_stored_text(&self) -> String {
        self.rules
            .iter()
            .map(|rule| rule.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the retained rules in file order
    pub fn rules(&self) -> &[RobotsRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks a URL path against the rules
    ///
    /// The first rule whose path is a prefix of `path` decides. No match
    /// means the path is allowed.
    pub fn is_allowed(&self, path: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| path.starts_with(&rule.path))
            .map_or(true, |rule| rule.kind == RuleKind::Allow)
    }
}

/// Splits `key: value` where the value is exactly one non-empty token
fn parse_directive(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() || value.contains(char::is_whitespace) {
        return None;
    }

    Some((key, value))
}
