//! Pagination request and response shapes.
//!
//! Some endpoints wrap list results in `{content, totalElements, totalPages}` while others
//! return a bare array. Both are decoded here and normalised into a single [`Page`] so that
//! nothing past the client boundary has to care which one the server sent.

use crate::constants::DEFAULT_PAGE_SIZE;
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// A zero-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// First page with the given size.
    pub fn first(size: u32) -> Self {
        Self { page: 0, size }
    }

    /// Query parameters sent with every list request.
    pub fn query_pairs(&self) -> [(String, String); 2] {
        [
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// Canonical page of records.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
}

/// Dispatches on the JSON shape so a bad record reports its own error instead of a
/// generic "no shape matched".
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PageVisitor(PhantomData))
    }
}

struct PageVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for PageVisitor<T> {
    type Value = Page<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of records or a page object")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Page<T>, A::Error> {
        let content = Vec::<T>::deserialize(SeqAccessDeserializer::new(seq))?;
        Ok(Page {
            total_elements: content.len() as u64,
            total_pages: 1,
            content,
        })
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Page<T>, A::Error> {
        let wrapped = WrappedPage::<T>::deserialize(MapAccessDeserializer::new(map))?;
        Ok(Page {
            total_elements: wrapped
                .total_elements
                .unwrap_or(wrapped.content.len() as u64),
            total_pages: wrapped.total_pages.unwrap_or(1),
            content: wrapped.content,
        })
    }
}

/// `{content, totalElements, totalPages}`, any of which may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedPage<T> {
    #[serde(default = "Vec::new")]
    content: Vec<T>,
    #[serde(default)]
    total_elements: Option<u64>,
    #[serde(default)]
    total_pages: Option<u32>,
}
