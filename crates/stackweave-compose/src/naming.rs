//! Deterministic identifier derivation.
//!
//! Constructs derive child names from a base name and a role (`acme-dev`,
//! `service-deployer`, `acme-admins`). Each external resource type has its
//! own legal character set and length limit; callers pick the
//! [`NamingRules`] matching the kind they are naming.

use sha2::{Digest, Sha256};
use stackweave_common::constants;
use stackweave_common::error::{Result, StackweaveError};

/// Characters an identifier may contain besides the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// ASCII letters and digits.
    Alphanumeric,
    /// ASCII letters, digits, `_` and `.`.
    AlphanumericUnderscoreDot,
}

impl Charset {
    const fn allows(self, c: char) -> bool {
        match self {
            Self::Alphanumeric => c.is_ascii_alphanumeric(),
            Self::AlphanumericUnderscoreDot => {
                c.is_ascii_alphanumeric() || c == '_' || c == '.'
            }
        }
    }
}

/// Constraints an identifier must satisfy for a given resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingRules {
    /// Character inserted between segments and substituted for illegal characters.
    pub separator: char,
    /// Allowed characters besides the separator.
    pub charset: Charset,
    /// Fold ASCII letters to lower case.
    pub lowercase: bool,
    /// First character must be an ASCII letter.
    pub starts_with_letter: bool,
    /// Minimum length after normalization.
    pub min_len: usize,
    /// Maximum length; longer names are truncated and hashed.
    pub max_len: usize,
}

impl NamingRules {
    /// Rules for cloud project ids: lower case, digits and dashes, at most 30 characters.
    #[must_use]
    pub const fn project_id(separator: char) -> Self {
        Self {
            separator,
            charset: Charset::Alphanumeric,
            lowercase: true,
            starts_with_letter: true,
            min_len: 6,
            max_len: constants::MAX_PROJECT_ID_LENGTH,
        }
    }

    /// Rules for service account ids: 6 to 30 lower case characters.
    #[must_use]
    pub const fn service_account(separator: char) -> Self {
        Self {
            separator,
            charset: Charset::Alphanumeric,
            lowercase: true,
            starts_with_letter: true,
            min_len: constants::MIN_SERVICE_ACCOUNT_ID_LENGTH,
            max_len: constants::MAX_SERVICE_ACCOUNT_ID_LENGTH,
        }
    }

    /// Rules for repository and team names: case preserved, `_` and `.` allowed.
    #[must_use]
    pub const fn repository(separator: char) -> Self {
        Self {
            separator,
            charset: Charset::AlphanumericUnderscoreDot,
            lowercase: false,
            starts_with_letter: false,
            min_len: 1,
            max_len: constants::MAX_REPOSITORY_NAME_LENGTH,
        }
    }

    const fn allows(&self, c: char) -> bool {
        c == self.separator || self.charset.allows(c)
    }
}

/// Derives `{base}{sep}{role}` under `rules`.
///
/// An empty `role` yields the normalized base alone.
///
/// # Errors
///
/// Returns a configuration error if the result cannot satisfy `rules`.
pub fn derive(base: &str, role: &str, rules: &NamingRules) -> Result<String> {
    let raw = if role.is_empty() {
        base.to_string()
    } else {
        format!("{base}{}{role}", rules.separator)
    };
    normalize(&raw, rules)
}

/// Normalizes `raw` into a legal identifier under `rules`.
///
/// Illegal characters become the separator, separator runs collapse, and
/// leading or trailing separators are dropped. Names longer than
/// `max_len` are cut and suffixed with a short SHA-256 digest of the full
/// normalized name, so two long names sharing a prefix stay distinct.
///
/// # Errors
///
/// Returns a configuration error if the name is empty after normalization,
/// must start with a letter but does not, or is shorter than `min_len`.
pub fn normalize(raw: &str, rules: &NamingRules) -> Result<String> {
    let sep = rules.separator;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if rules.lowercase {
            c.to_ascii_lowercase()
        } else {
            c
        };
        let c = if rules.allows(c) { c } else { sep };
        if c == sep && (out.is_empty() || out.ends_with(sep)) {
            continue;
        }
        out.push(c);
    }
    let mut out = out.trim_end_matches(sep).to_string();

    if out.is_empty() {
        return Err(StackweaveError::configuration(
            "name",
            format!("\"{raw}\" contains no usable characters"),
        ));
    }
    if rules.starts_with_letter && !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(StackweaveError::configuration(
            "name",
            format!("\"{out}\" must start with a letter"),
        ));
    }
    if out.len() > rules.max_len {
        out = truncate_with_digest(&out, rules);
    }
    if out.len() < rules.min_len {
        return Err(StackweaveError::configuration(
            "name",
            format!(
                "\"{out}\" is shorter than the {} characters required",
                rules.min_len
            ),
        ));
    }
    tracing::trace!(raw, normalized = %out, "derived identifier");
    Ok(out)
}

fn truncate_with_digest(name: &str, rules: &NamingRules) -> String {
    let digest = short_digest(name);
    let keep = rules
        .max_len
        .saturating_sub(constants::HASH_SUFFIX_LENGTH + 1);
    // Normalized names are pure ASCII, so byte slicing is char-aligned.
    let head = name[..keep].trim_end_matches(rules.separator);
    if head.is_empty() {
        return digest[..rules.max_len.min(digest.len())].to_string();
    }
    format!("{head}{}{digest}", rules.separator)
}

fn short_digest(name: &str) -> String {
    Sha256::digest(name.as_bytes())
        .iter()
        .take(constants::HASH_SUFFIX_LENGTH.div_ceil(2))
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
        .chars()
        .take(constants::HASH_SUFFIX_LENGTH)
        .collect()
}
