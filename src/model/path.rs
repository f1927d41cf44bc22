use std::fmt;

use crate::PathError;

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Record field or mapping lookup, e.g. `hardware`
    Field(String),
    /// Sequence element lookup by synthetic key, e.g. `["4000"]`
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Key(key) => write!(f, "[\"{key}\"]"),
        }
    }
}

/// Parsed dotted/bracketed property path.
///
/// ```text
/// foo.bar
/// foo.arProp["key val"]
/// foo.arProp["key val"].baz
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let unexpected = |offset: usize, found: char| PathError::UnexpectedChar {
            path: path.to_string(),
            offset,
            found,
        };

        let mut segments = Vec::new();
        let mut offset = 0;
        let mut after_dot = false;

        while let Some(c) = path[offset..].chars().next() {
            let rest = &path[offset..];
            if c == '[' {
                if after_dot {
                    return Err(unexpected(offset, c));
                }
                let unterminated = move || PathError::UnterminatedKey {
                    path: path.to_string(),
                    offset,
                };
                let body = rest[1..].strip_prefix('"').ok_or_else(unterminated)?;
                let end = body.find(['"', ']']).ok_or_else(unterminated)?;
                if end == 0 {
                    return Err(unexpected(offset + 2, '"'));
                }
                if !body[end..].starts_with("\"]") {
                    return Err(unterminated());
                }
                segments.push(PathSegment::Key(body[..end].to_string()));
                offset += end + 4;
            } else if c == '.' {
                if segments.is_empty() || after_dot {
                    return Err(unexpected(offset, c));
                }
                after_dot = true;
                offset += 1;
                continue;
            } else if is_word(c) {
                if !segments.is_empty() && !after_dot {
                    return Err(unexpected(offset, c));
                }
                let len = rest.find(|ch: char| !is_word(ch)).unwrap_or(rest.len());
                segments.push(PathSegment::Field(rest[..len].to_string()));
                offset += len;
            } else {
                return Err(unexpected(offset, c));
            }
            after_dot = false;
        }

        if after_dot {
            return Err(unexpected(path.len() - 1, '.'));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_parse_plain_and_bracketed_segments() {
        let path = PropertyPath::parse("config.hardware.device[\"4000\"].backing").unwrap();
        assert_eq!(
            path.segments(),
            &[field("config"), field("hardware"), field("device"), key("4000"), field("backing")]
        );
        assert_eq!(path.to_string(), "config.hardware.device[\"4000\"].backing");
    }

    #[test]
    fn test_parse_key_with_spaces_and_leading_bracket() {
        let path = PropertyPath::parse("[\"key val\"].baz").unwrap();
        assert_eq!(path.segments(), &[key("key val"), field("baz")]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PropertyPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            PropertyPath::parse(".name"),
            Err(PathError::UnexpectedChar { offset: 0, found: '.', .. })
        ));
        assert!(matches!(
            PropertyPath::parse("name."),
            Err(PathError::UnexpectedChar { offset: 4, .. })
        ));
        assert!(matches!(
            PropertyPath::parse("a..b"),
            Err(PathError::UnexpectedChar { offset: 2, .. })
        ));
        assert!(matches!(
            PropertyPath::parse("dev[\"4000"),
            Err(PathError::UnterminatedKey { offset: 3, .. })
        ));
        assert!(matches!(
            PropertyPath::parse("dev[4000]"),
            Err(PathError::UnterminatedKey { .. })
        ));
        assert!(matches!(
            PropertyPath::parse("dev[\"\"]"),
            Err(PathError::UnexpectedChar { .. })
        ));
        assert!(matches!(
            PropertyPath::parse("dev[\"a\"]b"),
            Err(PathError::UnexpectedChar { found: 'b', .. })
        ));
        assert!(matches!(
            PropertyPath::parse("a b"),
            Err(PathError::UnexpectedChar { found: ' ', .. })
        ));
    }
}
