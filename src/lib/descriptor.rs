//! Parsing of compact repository strings such as `gitlab:owner/name#v1.0`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

/// The ref checked out when a repository string doesn't name one.
pub const DEFAULT_CHECKOUT: &str = "master";

static DIRECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^direct:([^#]+)(?:#(.+))?$").expect("valid direct regex"));

// The owner may not contain ':' so that strings like `https:/a/b` are not read as owner `https:`.
static HOSTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(github|gitlab|bitbucket):)?(?:(.+):)?([^/:]+)/([^#]+)(?:#(.+))?$")
        .expect("valid hosted regex")
});

static URL_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?|git):").expect("valid url regex"));

// Checked before the hosted form, which would otherwise read `https://host:8443/a/b` as origin
// `https://host` and owner `8443`.
static URL_WITH_AUTHORITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?|git)://").expect("valid url regex"));

/// A hosting provider with a known archive URL layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Provider {
    /// The host used when a repository string gives no origin.
    pub fn default_origin(&self) -> &'static str {
        match self {
            Provider::GitHub => "github.com",
            Provider::GitLab => "gitlab.com",
            Provider::Bitbucket => "bitbucket.org",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "github" => Some(Provider::GitHub),
            "gitlab" => Some(Provider::GitLab),
            "bitbucket" => Some(Provider::Bitbucket),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GitHub => write!(f, "github"),
            Provider::GitLab => write!(f, "gitlab"),
            Provider::Bitbucket => write!(f, "bitbucket"),
        }
    }
}

/// The kind of a descriptor: a hosting provider, or a direct URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    GitHub,
    GitLab,
    Bitbucket,
    Direct,
}

/// Where the repository lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A repository on a hosting provider.
    Hosted {
        provider: Provider,
        origin: String,
        owner: String,
        name: String,
    },
    /// A complete URL given up front.
    Direct { url: String },
}

/// A parsed repository string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    target: Target,
    checkout: String,
}

impl RepositoryDescriptor {
    pub fn hosted<O, N, S>(provider: Provider, origin: O, owner: N, name: S) -> Self
    where
        O: Into<String>,
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            target: Target::Hosted {
                provider,
                origin: origin.into(),
                owner: owner.into(),
                name: name.into(),
            },
            checkout: DEFAULT_CHECKOUT.to_string(),
        }
    }

    pub fn direct<U: Into<String>>(url: U) -> Self {
        Self {
            target: Target::Direct { url: url.into() },
            checkout: DEFAULT_CHECKOUT.to_string(),
        }
    }

    /// Replace the checkout. An empty ref leaves the current one in place.
    pub fn with_checkout<S: Into<String>>(mut self, checkout: S) -> Self {
        let checkout = checkout.into();
        if !checkout.is_empty() {
            self.checkout = checkout;
        }
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn kind(&self) -> Kind {
        match &self.target {
            Target::Hosted { provider, .. } => match provider {
                Provider::GitHub => Kind::GitHub,
                Provider::GitLab => Kind::GitLab,
                Provider::Bitbucket => Kind::Bitbucket,
            },
            Target::Direct { .. } => Kind::Direct,
        }
    }

    pub fn provider(&self) -> Option<Provider> {
        match &self.target {
            Target::Hosted { provider, .. } => Some(*provider),
            Target::Direct { .. } => None,
        }
    }

    pub fn origin(&self) -> Option<&str> {
        match &self.target {
            Target::Hosted { origin, .. } => Some(origin),
            Target::Direct { .. } => None,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match &self.target {
            Target::Hosted { owner, .. } => Some(owner),
            Target::Direct { .. } => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.target {
            Target::Hosted { name, .. } => Some(name),
            Target::Direct { .. } => None,
        }
    }

    /// The pre-resolved URL. Only direct descriptors carry one.
    pub fn url(&self) -> Option<&str> {
        match &self.target {
            Target::Direct { url } => Some(url),
            Target::Hosted { .. } => None,
        }
    }

    /// The branch, tag or commit to retrieve. Never empty.
    pub fn checkout(&self) -> &str {
        &self.checkout
    }

    /// Whether the checkout is one of the conventional default branch names.
    pub fn is_default_branch(&self) -> bool {
        is_default_branch(&self.checkout)
    }
}

pub(crate) fn is_default_branch(checkout: &str) -> bool {
    checkout == "master" || checkout == "main"
}

/// Parse a repository string into a [`RepositoryDescriptor`].
///
/// The accepted forms are tried in order:
///
/// 1. `direct:<url>[#<ref>]`
/// 2. `[<provider>:][<origin>:]<owner>/<name>[#<ref>]`, where the provider is one of `github`
///    (the default), `gitlab` or `bitbucket`
/// 3. anything starting with `http:`, `https:` or `git:`, taken as a direct URL. A string
///    starting with `http://`, `https://` or `git://` is always taken this way, before form 2.
///
/// ```rust
/// use fetch_repo::{parse, Kind};
///
/// let repo = parse("gitlab:owner/name#v1.0")?;
/// assert_eq!(repo.kind(), Kind::GitLab);
/// assert_eq!(repo.origin(), Some("gitlab.com"));
/// assert_eq!(repo.checkout(), "v1.0");
/// # Ok::<(), fetch_repo::Error>(())
/// ```
pub fn parse(spec: &str) -> Result<RepositoryDescriptor, Error> {
    if let Some(caps) = DIRECT.captures(spec) {
        let descriptor = RepositoryDescriptor::direct(&caps[1]);
        return Ok(match caps.get(2) {
            Some(checkout) => descriptor.with_checkout(checkout.as_str()),
            None => descriptor,
        });
    }

    if URL_WITH_AUTHORITY.is_match(spec) {
        return Ok(RepositoryDescriptor::direct(spec));
    }

    if let Some(caps) = HOSTED.captures(spec) {
        let provider = caps
            .get(1)
            .and_then(|p| Provider::from_prefix(p.as_str()))
            .unwrap_or(Provider::GitHub);
        let origin = caps
            .get(2)
            .map(|o| o.as_str())
            .unwrap_or(provider.default_origin());
        let descriptor = RepositoryDescriptor::hosted(provider, origin, &caps[3], &caps[4]);
        return Ok(match caps.get(5) {
            Some(checkout) => descriptor.with_checkout(checkout.as_str()),
            None => descriptor,
        });
    }

    if URL_LIKE.is_match(spec) {
        return Ok(RepositoryDescriptor::direct(spec));
    }

    Err(Error::InvalidSpecification {
        spec: spec.to_string(),
    })
}

impl std::str::FromStr for RepositoryDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

// Flat layout matching the field names used in the docs: `kind`, then either
// `origin`/`owner`/`name` or `url`, then `checkout`.
impl serde::Serialize for RepositoryDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("RepositoryDescriptor", 5)?;
        state.serialize_field("kind", &self.kind())?;
        match &self.target {
            Target::Hosted {
                origin,
                owner,
                name,
                ..
            } => {
                state.serialize_field("origin", origin)?;
                state.serialize_field("owner", owner)?;
                state.serialize_field("name", name)?;
            }
            Target::Direct { url } => state.serialize_field("url", url)?,
        }
        state.serialize_field("checkout", &self.checkout)?;
        state.end()
    }
}

impl std::fmt::Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Target::Hosted {
                provider,
                origin,
                owner,
                name,
            } => {
                write!(f, "{provider}:")?;
                if origin != provider.default_origin() {
                    write!(f, "{origin}:")?;
                }
                write!(f, "{owner}/{name}")?;
            }
            Target::Direct { url } => write!(f, "direct:{url}")?,
        }
        write!(f, "#{}", self.checkout)
    }
}
