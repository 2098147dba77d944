//! Naming limits and workspace-wide defaults.

/// Default separator between an identifier's base name and its role suffix.
pub const DEFAULT_SEPARATOR: char = '-';

/// Maximum length of a cloud project id.
pub const MAX_PROJECT_ID_LENGTH: usize = 30;

/// Minimum length of a service account id.
pub const MIN_SERVICE_ACCOUNT_ID_LENGTH: usize = 6;

/// Maximum length of a service account id.
pub const MAX_SERVICE_ACCOUNT_ID_LENGTH: usize = 30;

/// Maximum length of a repository name.
pub const MAX_REPOSITORY_NAME_LENGTH: usize = 100;

/// Number of hex characters appended when an identifier has to be truncated.
pub const HASH_SUFFIX_LENGTH: usize = 6;

/// Prefix given to every derived service account id.
pub const SERVICE_ACCOUNT_PREFIX: &str = "service";

/// Suffix of the team or group that administers a bundle.
pub const ADMINS_SUFFIX: &str = "admins";

/// Default branch for generated repositories.
pub const DEFAULT_BRANCH: &str = "main";

/// Label stamped on every labelled resource.
pub const MANAGED_BY_LABEL: &str = "managed-by";

/// Application name used in CLI output and labels.
pub const APP_NAME: &str = "stackweave";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "weave";
