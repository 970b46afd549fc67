use chrono::format::{Item, StrftimeItems};
use chrono::{Local, NaiveDateTime};
use std::fmt::{self, Write};
use std::sync::Arc;

type PathFn<I> = dyn Fn(Option<&I>, &str) -> String + Send + Sync;

/// Where a confirmed upload should land when the caller, not the document
/// service, picks the destination.
pub enum UploadTo<I: ?Sized> {
    /// Called with the owning instance and the filename; the result is used verbatim.
    Computed(Arc<PathFn<I>>),
    /// strftime-style directory pattern expanded against the upload time.
    Pattern(String),
    Unset,
}

impl<I: ?Sized> UploadTo<I> {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&I>, &str) -> String + Send + Sync + 'static,
    {
        UploadTo::Computed(Arc::new(f))
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        UploadTo::Pattern(pattern.into())
    }
}

impl<I: ?Sized> Clone for UploadTo<I> {
    fn clone(&self) -> Self {
        match self {
            UploadTo::Computed(f) => UploadTo::Computed(Arc::clone(f)),
            UploadTo::Pattern(p) => UploadTo::Pattern(p.clone()),
            UploadTo::Unset => UploadTo::Unset,
        }
    }
}

impl<I: ?Sized> Default for UploadTo<I> {
    fn default() -> Self {
        UploadTo::Unset
    }
}

impl<I: ?Sized> fmt::Debug for UploadTo<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadTo::Computed(_) => f.write_str("UploadTo::Computed(..)"),
            UploadTo::Pattern(p) => f.debug_tuple("UploadTo::Pattern").field(p).finish(),
            UploadTo::Unset => f.write_str("UploadTo::Unset"),
        }
    }
}

/// Applies `upload_to` to `filename` using the current local time.
pub fn generate_filename<I: ?Sized>(
    instance: Option<&I>,
    filename: &str,
    upload_to: &UploadTo<I>,
) -> String {
    generate_filename_at(instance, filename, upload_to, Local::now().naive_local())
}

pub fn generate_filename_at<I: ?Sized>(
    instance: Option<&I>,
    filename: &str,
    upload_to: &UploadTo<I>,
    now: NaiveDateTime,
) -> String {
    match upload_to {
        UploadTo::Computed(f) => f(instance, filename),
        UploadTo::Pattern(pattern) if !pattern.is_empty() => {
            let dirname = expand_date_pattern(pattern, now);
            posix_join(&dirname, filename)
        }
        _ => filename.to_string(),
    }
}

fn expand_date_pattern(pattern: &str, now: NaiveDateTime) -> String {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        tracing::warn!(
            "Upload path pattern '{}' has an invalid date directive, using it literally",
            pattern
        );
        return pattern.to_string();
    }
    // Offset directives (%z, %Z) have nothing to render from a naive clock.
    let mut dirname = String::new();
    if write!(dirname, "{}", now.format_with_items(StrftimeItems::new(pattern))).is_err() {
        tracing::warn!(
            "Upload path pattern '{}' cannot be rendered from the local clock, using it literally",
            pattern
        );
        return pattern.to_string();
    }
    dirname
}

/// Forward-slash join regardless of the host OS. An absolute `name` replaces
/// the directory.
pub fn posix_join(dirname: &str, name: &str) -> String {
    if name.starts_with('/') || dirname.is_empty() {
        name.to_string()
    } else if dirname.ends_with('/') {
        format!("{}{}", dirname, name)
    } else {
        format!("{}/{}", dirname, name)
    }
}
