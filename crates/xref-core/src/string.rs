//! Owning wrapper for string resources allocated by the front-end parser.
//!
//! The parser hands out opaque string handles that must be released through
//! its own disposal call. [`ParserString`] owns one such handle and releases
//! it exactly once: on drop, or when it is overwritten through
//! [`ParserString::assign`]. Moving the handle out with [`ParserString::take`]
//! leaves the source invalid, so a moved-from wrapper never releases anything.

use std::fmt;

/// Access to, and disposal of, parser-allocated strings.
pub trait StringProvider {
    /// Raw handle type returned by the parser.
    type Raw;

    /// Borrow the characters behind `raw`, or `None` if the parser has none.
    fn text<'a>(&self, raw: &'a Self::Raw) -> Option<&'a str>;

    /// Release `raw`. Called at most once per handle.
    fn dispose(&self, raw: Self::Raw);

    /// Whether `raw` is the parser's null handle, which must not be disposed.
    fn is_null(&self, _raw: &Self::Raw) -> bool {
        false
    }
}

/// A single owned parser string.
pub struct ParserString<'p, P: StringProvider> {
    provider: &'p P,
    raw: Option<P::Raw>,
}

impl<'p, P: StringProvider> ParserString<'p, P> {
    /// Take ownership of `raw`. A null handle yields an invalid wrapper.
    pub fn new(provider: &'p P, raw: P::Raw) -> Self {
        let raw = if provider.is_null(&raw) { None } else { Some(raw) };
        Self { provider, raw }
    }

    /// A wrapper that owns nothing.
    pub fn invalid(provider: &'p P) -> Self {
        Self {
            provider,
            raw: None,
        }
    }

    /// Raw characters, `None` when invalid or when the parser has no data.
    pub fn get(&self) -> Option<&str> {
        self.raw.as_ref().and_then(|raw| self.provider.text(raw))
    }

    pub fn is_valid(&self) -> bool {
        self.raw.is_some()
    }

    /// True when invalid or zero-length.
    pub fn is_empty(&self) -> bool {
        self.get().map_or(true, str::is_empty)
    }

    /// Owned snapshot of the characters (empty when invalid).
    pub fn copy(&self) -> String {
        self.get().map(str::to_owned).unwrap_or_default()
    }

    /// Move the handle out, leaving `self` invalid.
    pub fn take(&mut self) -> Self {
        Self {
            provider: self.provider,
            raw: self.raw.take(),
        }
    }

    /// Release the currently owned handle, then take ownership of `other`'s.
    pub fn assign(&mut self, mut other: Self) {
        self.release();
        self.provider = other.provider;
        self.raw = other.raw.take();
    }

    fn release(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.provider.dispose(raw);
        }
    }
}

impl<P: StringProvider> Drop for ParserString<'_, P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P: StringProvider> fmt::Debug for ParserString<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserString")
            .field("valid", &self.is_valid())
            .field("text", &self.get())
            .finish()
    }
}

impl<P: StringProvider> fmt::Display for ParserString<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get().unwrap_or(""))
    }
}
