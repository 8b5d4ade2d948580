use std::fmt;
use std::str::FromStr;

use derive_more::From;
use snafu::{Snafu, ensure};

pub const PATH_SEPARATOR: char = '/';

/// Index of a child under its parent, in storage append order.
pub type PathSegment = usize;

/// Absolute address of a node. The empty segment list is the root.
///
/// Ordering is lexicographic over segments, so sorting paths yields
/// parent-before-child, index-ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, From)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parent(&self) -> Result<Path, PathError> {
        ensure!(!self.is_root(), RootPathSnafu);
        Ok(Path::from(&self.segments[..self.segments.len() - 1]))
    }

    pub fn last_segment(&self) -> Result<PathSegment, PathError> {
        self.segments.last().copied().ok_or(PathError::RootPath)
    }

    pub fn append(&self, segment: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }

    /// True when `self` is a (non-strict) prefix of `other`.
    pub fn includes(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Segments of `self` below `ancestor`.
    pub fn relative_to(&self, ancestor: &Path) -> Result<Path, PathError> {
        ensure!(
            ancestor.includes(self),
            NotNestedSnafu {
                path: self.clone(),
                ancestor: ancestor.clone(),
            }
        );
        Ok(Path::from(&self.segments[ancestor.len()..]))
    }

    /// Strict ancestors, nearest first, excluding the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (1..self.segments.len())
            .rev()
            .map(|len| Path::from(&self.segments[..len]))
    }

    fn decode(input: &str) -> Result<Vec<PathSegment>, PathError> {
        if input.len() == 1 && input.starts_with(PATH_SEPARATOR) {
            return Ok(Vec::new());
        }

        let rest = input
            .strip_prefix(PATH_SEPARATOR)
            .ok_or_else(|| PathError::InvalidPathFormat {
                input: input.to_string(),
                reason: "missing leading separator",
            })?;

        rest.split(PATH_SEPARATOR)
            .map(|part| {
                ensure!(
                    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()),
                    InvalidPathFormatSnafu {
                        input,
                        reason: "segment is not a non-negative integer",
                    }
                );
                ensure!(
                    part == "0" || !part.starts_with('0'),
                    InvalidPathFormatSnafu {
                        input,
                        reason: "segment has a leading zero",
                    }
                );
                part.parse::<PathSegment>()
                    .map_err(|_| PathError::InvalidPathFormat {
                        input: input.to_string(),
                        reason: "segment is out of range",
                    })
            })
            .collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "{PATH_SEPARATOR}");
        }
        for segment in &self.segments {
            write!(f, "{PATH_SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s).map(Path::from)
    }
}

impl From<&[PathSegment]> for Path {
    fn from(segments: &[PathSegment]) -> Self {
        Path::from(segments.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum PathError {
    #[snafu(display("Invalid path format '{}': {}", input, reason))]
    InvalidPathFormat { input: String, reason: &'static str },
    #[snafu(display("The root path has no parent and no last segment"))]
    RootPath,
    #[snafu(display("Path '{}' is not nested in '{}'", path, ancestor))]
    NotNested { path: Path, ancestor: Path },
}
