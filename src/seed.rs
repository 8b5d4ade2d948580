//! YAML seed snapshots for the in-memory storage.
//!
//! ```yaml
//! children:
//!   - document: A car
//!     children:
//!       - document: Chassis
//!       - document: Engine
//! ```

use std::borrow::Cow;
use std::path::Path as FsPath;

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::debug;

use crate::path::Path;
use crate::snapshot::{DocumentSnapshot, RootSnapshot};

const CHILDREN_KEY: &str = "children";
const DOCUMENT_KEY: &str = "document";

pub async fn read_seed(path: &FsPath) -> Result<RootSnapshot<String>, SeedError> {
    debug!("Reading seed file: {}", path.display());
    let bytes = compio::fs::read(path).await.context(ReadSnafu {
        file_path: path.display().to_string(),
    })?;
    debug!("Successfully read seed file: {} bytes", bytes.len());

    let contents = String::from_utf8(bytes).context(EncodingSnafu {
        file_path: path.display().to_string(),
    })?;
    contents.as_str().try_into()
}

impl TryFrom<&str> for RootSnapshot<String> {
    type Error = SeedError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let top_level = documents.first().context(MalformedSeedSnafu)?;
        let mapping = top_level.as_mapping().context(TopLevelNotMapSnafu)?;

        let children = parse_children(mapping, &Path::root())?;
        Ok(RootSnapshot { children })
    }
}

fn key<'a>(name: &'static str) -> Yaml<'a> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

fn parse_children(
    mapping: &LinkedHashMap<Yaml, Yaml>,
    at: &Path,
) -> Result<Vec<DocumentSnapshot<String>>, SeedError> {
    let children = match mapping.get(&key(CHILDREN_KEY)) {
        None | Some(Yaml::Value(Scalar::Null)) => return Ok(Vec::new()),
        Some(children) => children,
    };

    children
        .as_sequence()
        .context(ChildrenNotSequenceSnafu { at: at.clone() })?
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(entry, &at.append(index)))
        .collect()
}

fn parse_entry(entry: &Yaml, at: &Path) -> Result<DocumentSnapshot<String>, SeedError> {
    let mapping = entry
        .as_mapping()
        .context(EntryNotMapSnafu { at: at.clone() })?;

    let document = mapping
        .get(&key(DOCUMENT_KEY))
        .and_then(|value| value.as_str())
        .context(MissingDocumentSnafu { at: at.clone() })?
        .to_string();

    Ok(DocumentSnapshot {
        document,
        children: parse_children(mapping, at)?,
    })
}

#[derive(Debug, Snafu)]
pub enum SeedError {
    #[snafu(display("Failed to read the seed file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Seed file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the seed file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted seed file"))]
    MalformedSeed,
    #[snafu(display("Top level of the seed should be a map"))]
    TopLevelNotMap,
    #[snafu(display("'children' of {} should be a sequence", at))]
    ChildrenNotSequence { at: Path },
    #[snafu(display("Entry {} should be a map", at))]
    EntryNotMap { at: Path },
    #[snafu(display("Entry {} needs a string 'document'", at))]
    MissingDocument { at: Path },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(contents: &str) -> Result<RootSnapshot<String>, SeedError> {
        contents.try_into()
    }

    #[test]
    fn parses_nested_seed() {
        let seed = parse(
            r#"
children:
  - document: A car
    children:
      - document: Chassis
      - document: Engine
        children:
          - document: Cylinder head
  - document: A bike
"#,
        )
        .unwrap();

        assert_eq!(seed.children.len(), 2);
        assert_eq!(seed.children[0].document, "A car");
        assert_eq!(seed.children[0].children[1].children[0].document, "Cylinder head");
        assert!(seed.children[1].children.is_empty());
        assert_eq!(seed.children[0].count(), 4);
    }

    #[test]
    fn missing_or_null_children_mean_empty() {
        assert!(parse("other: value").unwrap().children.is_empty());
        assert!(parse("children:").unwrap().children.is_empty());
    }

    #[test]
    fn empty_file_is_malformed() {
        assert!(matches!(parse(""), Err(SeedError::MalformedSeed)));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        assert!(matches!(
            parse("invalid: yaml: content: [unclosed"),
            Err(SeedError::ParseError { .. })
        ));
    }

    #[test]
    fn top_level_must_be_a_map() {
        assert!(matches!(parse("- a\n- b"), Err(SeedError::TopLevelNotMap)));
        assert!(matches!(parse("just a string"), Err(SeedError::TopLevelNotMap)));
    }

    #[test]
    fn errors_carry_the_offending_path() {
        let err = parse("children:\n  - document: A\n    children: nope").unwrap_err();
        assert!(matches!(&err, SeedError::ChildrenNotSequence { at } if at.to_string() == "/0"));

        let err = parse("children:\n  - document: A\n  - name: B").unwrap_err();
        assert!(matches!(&err, SeedError::MissingDocument { at } if at.to_string() == "/1"));
        assert!(err.to_string().contains("/1"));

        let err = parse("children:\n  - plain").unwrap_err();
        assert!(matches!(err, SeedError::EntryNotMap { .. }));
    }

    #[compio::test]
    async fn reads_seed_from_disk() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "children:\n  - document: A\n  - document: B").expect("Failed to write seed");

        let seed = read_seed(file.path()).await.expect("Failed to read seed");

        assert_eq!(
            seed,
            RootSnapshot::from(vec![
                DocumentSnapshot::leaf("A".to_string()),
                DocumentSnapshot::leaf("B".to_string()),
            ])
        );
    }

    #[compio::test]
    async fn nonexistent_seed_is_a_read_error() {
        let result = read_seed(FsPath::new("nonexistent-seed.yaml")).await;
        assert!(matches!(result, Err(SeedError::ReadError { .. })));
    }
}
