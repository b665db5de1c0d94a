use std::cmp::Ordering;

use semver::Version;

/// Version information carried by an update file name such as
/// `1.2.0-add-user-index.sql`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateVersion {
    pub version: Version,
    /// Text after the first hyphen, without the file extension.
    pub qualifier: Option<String>,
}

impl UpdateVersion {
    /// Order by semantic-version precedence. Build metadata and the
    /// qualifier do not take part.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.version.cmp_precedence(&other.version)
    }
}

/// Parse the version prefix of an update file name.
///
/// The prefix is everything before the first hyphen and must be a full
/// `major.minor.patch` version (an optional leading `v` is accepted).
/// Returns `None` for names that do not carry one.
pub fn parse_file_name(name: &str) -> Option<UpdateVersion> {
    let (prefix, rest) = match name.split_once('-') {
        Some((prefix, rest)) => (prefix, Some(rest)),
        None => (name, None),
    };

    let prefix = prefix.trim();
    let prefix = prefix.strip_prefix('v').unwrap_or(prefix);
    let version = Version::parse(prefix).ok()?;

    let qualifier = rest
        .map(|rest| match rest.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => rest,
        })
        .filter(|q| !q.is_empty())
        .map(str::to_string);

    Some(UpdateVersion { version, qualifier })
}
